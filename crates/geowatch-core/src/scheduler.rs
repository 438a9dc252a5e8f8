//! Fixed-cadence poll scheduler
//!
//! One coordinating task owns the tracker. Each tick fetches every entity
//! concurrently (each fetch under its own timeout), then feeds the results to
//! the tracker in configuration order and queues any alerts. Ticks never
//! overlap: a slow tick pushes back the next one.

use crate::{DispatchHandle, RunSummary, StopReason, TickReport, ZoneTracker, contains};
use crate::tracker::DEFAULT_DEBOUNCE;
use futures::future::join_all;
use geowatch_adapter_api::PositionSource;
use geowatch_api::{Containment, EntityStatus};
use geowatch_util::{EntityId, GeowatchError, MonotonicInstant, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default time between tick starts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Default upper bound on a single position fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Scheduler timing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,
    /// Total run length; None runs until cancelled
    pub run_duration: Option<Duration>,
    pub fetch_timeout: Duration,
    pub debounce: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            run_duration: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Drives the polling loop
pub struct PollScheduler {
    entities: Vec<EntityId>,
    config: SchedulerConfig,
    source: Arc<dyn PositionSource>,
    dispatch: DispatchHandle,
    tracker: ZoneTracker,
    ticks: u64,
    submitted: u64,
}

impl PollScheduler {
    pub fn new(
        entities: Vec<EntityId>,
        config: SchedulerConfig,
        source: Arc<dyn PositionSource>,
        dispatch: DispatchHandle,
    ) -> Result<Self> {
        if entities.is_empty() {
            return Err(GeowatchError::schedule("no entities to monitor"));
        }
        if config.poll_interval.is_zero() {
            return Err(GeowatchError::schedule("poll interval must be positive"));
        }
        if config.fetch_timeout.is_zero() {
            return Err(GeowatchError::schedule("fetch timeout must be positive"));
        }

        // Deadline and wake-up arithmetic must stay representable for the
        // whole run
        let now = MonotonicInstant::now();
        if now.checked_add(config.poll_interval).is_none() {
            return Err(GeowatchError::schedule("poll interval is too large"));
        }
        if let Some(run_duration) = config.run_duration {
            let span = run_duration.checked_add(config.poll_interval);
            if span.and_then(|span| now.checked_add(span)).is_none() {
                return Err(GeowatchError::schedule("run duration is too large"));
            }
        }

        let tracker = ZoneTracker::new(entities.iter().cloned(), config.debounce);

        Ok(Self {
            entities,
            config,
            source,
            dispatch,
            tracker,
            ticks: 0,
            submitted: 0,
        })
    }

    /// Current status of every entity
    pub fn snapshot(&self) -> Vec<EntityStatus> {
        self.tracker.snapshot(MonotonicInstant::now())
    }

    /// Run one tick with `now` as the observation time for every entity
    pub async fn tick(&mut self, now: MonotonicInstant) -> TickReport {
        self.ticks += 1;
        let mut report = TickReport {
            tick: self.ticks,
            ..Default::default()
        };

        let timeout = self.config.fetch_timeout;
        let source = self.source.as_ref();
        let observations = join_all(
            self.entities
                .iter()
                .map(|entity_id| observe(source, entity_id, timeout)),
        )
        .await;

        for (entity_id, containment) in self.entities.iter().zip(observations) {
            match containment {
                Containment::Inside => report.inside += 1,
                Containment::Outside => report.outside += 1,
                Containment::Unknown => report.unknown += 1,
            }

            for request in self.tracker.evaluate(entity_id, containment, now) {
                match self.dispatch.submit(request) {
                    Ok(()) => {
                        report.notifications += 1;
                        self.submitted += 1;
                    }
                    Err(e) => {
                        warn!(entity_id = %entity_id, error = %e, "Dropping notification");
                    }
                }
            }
        }

        debug!(
            tick = report.tick,
            inside = report.inside,
            outside = report.outside,
            unknown = report.unknown,
            notifications = report.notifications,
            "Tick complete"
        );

        report
    }

    /// Poll until the run deadline passes or `shutdown` flips to true
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> RunSummary {
        let started = MonotonicInstant::now();
        let deadline = self.config.run_duration.map(|d| started.saturating_add(d));

        info!(
            entities = self.entities.len(),
            interval_secs = self.config.poll_interval.as_secs(),
            run_secs = self.config.run_duration.map(|d| d.as_secs()),
            "Monitoring started"
        );

        let stop_reason = loop {
            if *shutdown.borrow() {
                break StopReason::Cancelled;
            }

            let tick_start = MonotonicInstant::now();
            if let Some(deadline) = deadline
                && tick_start >= deadline
            {
                break StopReason::DeadlineReached;
            }

            tokio::select! {
                _ = self.tick(tick_start) => {}
                _ = wait_for_shutdown(&mut shutdown) => break StopReason::Cancelled,
            }

            let mut wake = tick_start.saturating_add(self.config.poll_interval);
            if let Some(deadline) = deadline {
                wake = wake.min(deadline);
            }

            tokio::select! {
                _ = tokio::time::sleep_until(wake.into_tokio()) => {}
                _ = wait_for_shutdown(&mut shutdown) => break StopReason::Cancelled,
            }
        };

        let elapsed = started.elapsed();
        info!(
            ticks = self.ticks,
            notifications = self.submitted,
            elapsed_secs = elapsed.as_secs(),
            reason = ?stop_reason,
            "Monitoring stopped"
        );

        RunSummary {
            ticks: self.ticks,
            notifications_submitted: self.submitted,
            stop_reason,
            elapsed,
            entities: self.tracker.snapshot(MonotonicInstant::now()),
        }
    }
}

/// Fetch and classify one entity. Every failure degrades to Unknown.
async fn observe(
    source: &dyn PositionSource,
    entity_id: &EntityId,
    timeout: Duration,
) -> Containment {
    match tokio::time::timeout(timeout, source.fetch(entity_id)).await {
        Ok(Ok(observation)) => {
            if observation.zone.is_empty() {
                warn!(entity_id = %entity_id, "Zone has no rings");
                return Containment::Unknown;
            }
            Containment::from_contains(contains(&observation.position, &observation.zone))
        }
        Ok(Err(e)) => {
            warn!(entity_id = %entity_id, error = %e, "Position fetch failed");
            Containment::Unknown
        }
        Err(_) => {
            warn!(
                entity_id = %entity_id,
                timeout_secs = timeout.as_secs(),
                "Position fetch timed out"
            );
            Containment::Unknown
        }
    }
}

/// Resolves once shutdown is requested. Pends forever if the sender is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
