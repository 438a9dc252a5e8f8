//! Per-entity zone state machine
//!
//! Each monitored entity moves between two states, inside and on an
//! excursion. While on an excursion a single follow-up alert may fire once the
//! excursion has lasted the debounce threshold. Every alert for an excursion
//! is emitted exactly once:
//!
//! ```text
//!   Inside --(outside|unknown)--> Excursion      emits "left zone"
//!   Excursion --(>= debounce)--> Excursion       emits "still out" (once)
//!   Excursion --(inside)--> Inside               emits "returned"
//! ```

use geowatch_api::{AlertReason, Containment, EntityStatus, NotificationRequest};
use geowatch_util::{EntityId, MonotonicInstant};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Default excursion length before the follow-up alert fires
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(300);

/// Tracking state for one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneState {
    /// Last known containment; starts out assumed inside
    pub currently_inside: bool,

    /// Tick at which the current excursion was detected
    pub out_of_zone_since: Option<MonotonicInstant>,

    /// Whether the prolonged-absence alert fired for the current excursion
    pub followup_alert_sent: bool,

    /// Number of evaluated observations
    pub observations: u64,

    /// Most recent observation, None until the first tick
    pub last_containment: Option<Containment>,
}

impl Default for ZoneState {
    fn default() -> Self {
        Self {
            currently_inside: true,
            out_of_zone_since: None,
            followup_alert_sent: false,
            observations: 0,
            last_containment: None,
        }
    }
}

impl ZoneState {
    /// How long the current excursion has lasted at `now`
    pub fn excursion_length(&self, now: MonotonicInstant) -> Option<Duration> {
        self.out_of_zone_since.map(|since| now.duration_since(since))
    }
}

/// Owns the zone state of every monitored entity.
///
/// All mutation goes through [`ZoneTracker::evaluate`].
#[derive(Debug)]
pub struct ZoneTracker {
    debounce: Duration,
    order: Vec<EntityId>,
    states: HashMap<EntityId, ZoneState>,
}

impl ZoneTracker {
    /// Create a tracker with default state for each entity
    pub fn new(entities: impl IntoIterator<Item = EntityId>, debounce: Duration) -> Self {
        let mut order = Vec::new();
        let mut states = HashMap::new();
        for entity_id in entities {
            if states.insert(entity_id.clone(), ZoneState::default()).is_none() {
                order.push(entity_id);
            }
        }

        Self {
            debounce,
            order,
            states,
        }
    }

    /// Get the state of one entity
    pub fn state(&self, entity_id: &EntityId) -> Option<&ZoneState> {
        self.states.get(entity_id)
    }

    /// Feed one observation for an entity and return the alerts it causes.
    ///
    /// `Unknown` is handled exactly like `Outside`. Entities the tracker has
    /// not seen before start from the default (inside) state.
    pub fn evaluate(
        &mut self,
        entity_id: &EntityId,
        containment: Containment,
        now: MonotonicInstant,
    ) -> Vec<NotificationRequest> {
        if !self.states.contains_key(entity_id) {
            self.order.push(entity_id.clone());
        }
        let state = self.states.entry(entity_id.clone()).or_default();
        let debounce = self.debounce;

        let first_observation = state.observations == 0;
        state.observations += 1;
        state.last_containment = Some(containment);

        let mut requests = Vec::new();
        let observed_inside = containment.is_inside();

        match (state.currently_inside, observed_inside) {
            // Left the zone (or could not be located)
            (true, false) => {
                state.currently_inside = false;
                state.out_of_zone_since = Some(now);
                state.followup_alert_sent = false;

                info!(
                    entity_id = %entity_id,
                    containment = %containment,
                    first_observation,
                    "Entity left zone"
                );
                requests.push(NotificationRequest::new(
                    entity_id.clone(),
                    AlertReason::LeftZone,
                ));
            }

            // Back inside
            (false, true) => {
                let excursion = state.excursion_length(now);
                state.currently_inside = true;
                state.out_of_zone_since = None;
                state.followup_alert_sent = false;

                if let Some(duration) = excursion {
                    info!(
                        entity_id = %entity_id,
                        out_secs = duration.as_secs(),
                        "Entity returned to zone"
                    );
                    requests.push(NotificationRequest::new(
                        entity_id.clone(),
                        AlertReason::Returned { duration },
                    ));
                }
            }

            // Excursion ongoing
            (false, false) => {
                if let Some(duration) = state.excursion_length(now)
                    && duration >= debounce
                    && !state.followup_alert_sent
                {
                    state.followup_alert_sent = true;

                    info!(
                        entity_id = %entity_id,
                        out_secs = duration.as_secs(),
                        "Entity still out of zone"
                    );
                    requests.push(NotificationRequest::new(
                        entity_id.clone(),
                        AlertReason::StillOut { duration },
                    ));
                }
            }

            (true, true) => {
                debug!(entity_id = %entity_id, "Entity inside zone");
            }
        }

        requests
    }

    /// Status of every entity, in registration order
    pub fn snapshot(&self, now: MonotonicInstant) -> Vec<EntityStatus> {
        self.order
            .iter()
            .filter_map(|id| self.states.get(id).map(|state| (id, state)))
            .map(|(id, state)| EntityStatus {
                entity_id: id.clone(),
                inside: state.currently_inside,
                out_for: state.excursion_length(now),
                followup_alert_sent: state.followup_alert_sent,
                observations: state.observations,
                last_containment: state.last_containment,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Containment::{Inside, Outside, Unknown};

    fn tracker() -> (ZoneTracker, EntityId) {
        let id = EntityId::new("1");
        (ZoneTracker::new(vec![id.clone()], DEFAULT_DEBOUNCE), id)
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn reasons(requests: &[NotificationRequest]) -> Vec<String> {
        requests.iter().map(|r| r.reason.to_string()).collect()
    }

    #[test]
    fn initial_state_is_inside() {
        let (tracker, id) = tracker();
        let state = tracker.state(&id).unwrap();
        assert!(state.currently_inside);
        assert_eq!(state.out_of_zone_since, None);
        assert!(!state.followup_alert_sent);
    }

    #[test]
    fn single_outside_tick_emits_left_zone() {
        let (mut tracker, id) = tracker();
        let t0 = MonotonicInstant::now();

        let requests = tracker.evaluate(&id, Outside, t0);
        assert_eq!(reasons(&requests), vec!["left zone"]);
        assert_eq!(requests[0].entity_id, id);

        let state = tracker.state(&id).unwrap();
        assert!(!state.currently_inside);
        assert_eq!(state.out_of_zone_since, Some(t0));
    }

    #[test]
    fn unknown_follows_left_zone_path() {
        let (mut tracker, id) = tracker();
        let t0 = MonotonicInstant::now();

        let requests = tracker.evaluate(&id, Unknown, t0);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].reason, AlertReason::LeftZone);
        assert_eq!(tracker.state(&id).unwrap().out_of_zone_since, Some(t0));
    }

    #[test]
    fn steady_inside_is_silent() {
        let (mut tracker, id) = tracker();
        let t0 = MonotonicInstant::now();

        for i in 0..10 {
            assert!(tracker.evaluate(&id, Inside, t0 + secs(60 * i)).is_empty());
        }
        assert_eq!(tracker.state(&id).unwrap().observations, 10);
    }

    #[test]
    fn no_repeated_left_zone_without_return() {
        let (mut tracker, id) = tracker();
        let t0 = MonotonicInstant::now();

        let mut left = 0;
        for i in 0..4 {
            let containment = if i % 2 == 0 { Outside } else { Unknown };
            left += tracker
                .evaluate(&id, containment, t0 + secs(10 * i))
                .iter()
                .filter(|r| r.reason == AlertReason::LeftZone)
                .count();
        }
        assert_eq!(left, 1);
    }

    #[test]
    fn follow_up_fires_once_at_threshold() {
        let (mut tracker, id) = tracker();
        let t0 = MonotonicInstant::now();

        tracker.evaluate(&id, Outside, t0);
        let mut fired_at = Vec::new();
        // Excursion continues for three hours at one-minute ticks
        for minute in 1..=180u64 {
            let requests = tracker.evaluate(&id, Outside, t0 + secs(60 * minute));
            if !requests.is_empty() {
                assert_eq!(reasons(&requests), vec!["still out after 5.0 minutes"]);
                fired_at.push(minute);
            }
        }
        assert_eq!(fired_at, vec![5]);
        assert!(tracker.state(&id).unwrap().followup_alert_sent);
    }

    #[test]
    fn follow_up_not_before_threshold() {
        let (mut tracker, id) = tracker();
        let t0 = MonotonicInstant::now();

        tracker.evaluate(&id, Outside, t0);
        assert!(tracker.evaluate(&id, Outside, t0 + secs(299)).is_empty());
        let requests = tracker.evaluate(&id, Outside, t0 + secs(300));
        assert_eq!(requests.len(), 1);
    }

    #[test]
    fn return_reports_excursion_length() {
        let (mut tracker, id) = tracker();
        let t0 = MonotonicInstant::now();

        tracker.evaluate(&id, Outside, t0);
        let requests = tracker.evaluate(&id, Inside, t0 + secs(450));
        assert_eq!(
            requests[0].reason,
            AlertReason::Returned { duration: secs(450) }
        );
        assert_eq!(reasons(&requests), vec!["returned after 7.5 minutes"]);

        let state = tracker.state(&id).unwrap();
        assert!(state.currently_inside);
        assert_eq!(state.out_of_zone_since, None);
        assert!(!state.followup_alert_sent);
    }

    #[test]
    fn fresh_excursion_gets_fresh_alerts() {
        let (mut tracker, id) = tracker();
        let t0 = MonotonicInstant::now();

        tracker.evaluate(&id, Outside, t0);
        tracker.evaluate(&id, Outside, t0 + secs(300));
        tracker.evaluate(&id, Inside, t0 + secs(360));

        let left = tracker.evaluate(&id, Outside, t0 + secs(420));
        assert_eq!(reasons(&left), vec!["left zone"]);
        assert!(!tracker.state(&id).unwrap().followup_alert_sent);

        let still = tracker.evaluate(&id, Outside, t0 + secs(720));
        assert_eq!(reasons(&still), vec!["still out after 5.0 minutes"]);
    }

    #[test]
    fn end_to_end_observation_sequence() {
        let (mut tracker, id) = tracker();
        let base = MonotonicInstant::now();
        // Times are seconds after the leave observation
        let leave = base + secs(60);
        let observations = [
            (Inside, base),
            (Outside, leave),
            (Outside, leave + secs(60)),
            (Outside, leave + secs(120)),
            (Outside, leave + secs(180)),
            (Outside, leave + secs(300)),
            (Inside, leave + secs(360)),
        ];

        let mut emitted = Vec::new();
        for (tick, (containment, now)) in observations.into_iter().enumerate() {
            for request in tracker.evaluate(&id, containment, now) {
                emitted.push((tick + 1, request.reason.to_string()));
            }
        }

        assert_eq!(
            emitted,
            vec![
                (2, "left zone".to_string()),
                (6, "still out after 5.0 minutes".to_string()),
                (7, "returned after 6.0 minutes".to_string()),
            ]
        );
    }

    #[test]
    fn entities_are_independent() {
        let a = EntityId::new("a");
        let b = EntityId::new("b");
        let mut tracker = ZoneTracker::new(vec![a.clone(), b.clone()], DEFAULT_DEBOUNCE);
        let t0 = MonotonicInstant::now();

        assert_eq!(tracker.evaluate(&a, Outside, t0).len(), 1);
        assert!(tracker.evaluate(&b, Inside, t0).is_empty());
        assert!(tracker.state(&b).unwrap().currently_inside);
    }

    #[test]
    fn unknown_entity_starts_from_default() {
        let (mut tracker, _) = tracker();
        let stranger = EntityId::new("99");
        let requests = tracker.evaluate(&stranger, Outside, MonotonicInstant::now());
        assert_eq!(requests.len(), 1);
        assert_eq!(tracker.snapshot(MonotonicInstant::now()).len(), 2);
    }

    #[test]
    fn snapshot_reports_excursions_in_order() {
        let ids: Vec<EntityId> = ["3", "1", "2"].into_iter().map(EntityId::new).collect();
        let mut tracker = ZoneTracker::new(ids.clone(), secs(120));
        let t0 = MonotonicInstant::now();

        tracker.evaluate(&ids[1], Outside, t0);
        tracker.evaluate(&ids[1], Outside, t0 + secs(120));

        let snapshot = tracker.snapshot(t0 + secs(150));
        let order: Vec<_> = snapshot.iter().map(|s| s.entity_id.as_str()).collect();
        assert_eq!(order, vec!["3", "1", "2"]);

        let out = &snapshot[1];
        assert!(!out.inside);
        assert_eq!(out.out_for, Some(secs(150)));
        assert!(out.followup_alert_sent);
        assert_eq!(out.observations, 2);
        assert_eq!(out.last_containment, Some(Outside));
        assert_eq!(snapshot[0].last_containment, None);
    }
}
