//! Alert reasons and notification requests

use geowatch_util::{AlertId, EntityId, format_minutes};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Routing category of an alert, used by notifiers for subject lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LeftZone,
    StillOut,
    Returned,
}

/// Why a notification is being sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertReason {
    /// Entity was observed outside its zone after being inside
    LeftZone,

    /// Excursion has lasted at least the debounce threshold
    StillOut { duration: Duration },

    /// Entity is back inside after an excursion
    Returned { duration: Duration },
}

impl AlertReason {
    pub fn kind(&self) -> AlertKind {
        match self {
            Self::LeftZone => AlertKind::LeftZone,
            Self::StillOut { .. } => AlertKind::StillOut,
            Self::Returned { .. } => AlertKind::Returned,
        }
    }

    /// Excursion length carried by the reason, if any
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::LeftZone => None,
            Self::StillOut { duration } | Self::Returned { duration } => Some(*duration),
        }
    }

    /// Subject line for the given entity
    pub fn subject(&self, entity_id: &EntityId) -> String {
        match self.kind() {
            AlertKind::LeftZone => format!("Entity {} left safety zone", entity_id),
            AlertKind::StillOut => format!("Entity {} still out of safety zone", entity_id),
            AlertKind::Returned => format!("Entity {} returned to safety zone", entity_id),
        }
    }
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeftZone => write!(f, "left zone"),
            Self::StillOut { duration } => write!(f, "still out after {}", format_minutes(*duration)),
            Self::Returned { duration } => write!(f, "returned after {}", format_minutes(*duration)),
        }
    }
}

/// A request to notify about one entity, produced by the zone tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub alert_id: AlertId,
    pub entity_id: EntityId,
    pub reason: AlertReason,
}

impl NotificationRequest {
    pub fn new(entity_id: EntityId, reason: AlertReason) -> Self {
        Self {
            alert_id: AlertId::new(),
            entity_id,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_strings() {
        assert_eq!(AlertReason::LeftZone.to_string(), "left zone");
        assert_eq!(
            AlertReason::StillOut { duration: Duration::from_secs(300) }.to_string(),
            "still out after 5.0 minutes"
        );
        assert_eq!(
            AlertReason::Returned { duration: Duration::from_secs(450) }.to_string(),
            "returned after 7.5 minutes"
        );
    }

    #[test]
    fn subjects_are_distinguishable() {
        let id = EntityId::new("3");
        let left = AlertReason::LeftZone.subject(&id);
        let still = AlertReason::StillOut { duration: Duration::from_secs(300) }.subject(&id);
        let back = AlertReason::Returned { duration: Duration::from_secs(60) }.subject(&id);

        assert_ne!(left, still);
        assert_ne!(still, back);
        assert!(left.contains('3'));
    }

    #[test]
    fn kinds_and_durations() {
        assert_eq!(AlertReason::LeftZone.kind(), AlertKind::LeftZone);
        assert_eq!(AlertReason::LeftZone.duration(), None);
        let reason = AlertReason::Returned { duration: Duration::from_secs(61) };
        assert_eq!(reason.kind(), AlertKind::Returned);
        assert_eq!(reason.duration(), Some(Duration::from_secs(61)));
    }
}
