//! Time utilities for geowatch
//!
//! Provides both monotonic time (for excursion and debounce accounting) and
//! wall-clock time (for human-readable alert timestamps).
//!
//! Monotonic time is backed by `tokio::time::Instant`, so tests running with a
//! paused runtime clock observe the same instants as the scheduler's sleeps.

use chrono::{DateTime, Local};
use std::time::Duration;

/// Get the current local wall-clock time.
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Format a DateTime for display with full date, time and zone.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

/// Ceiling used when an addition would overflow the platform instant
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Represents a point in monotonic time.
/// This is immune to wall-clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonotonicInstant(tokio::time::Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(tokio::time::Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    /// Duration since `earlier`, or zero if `earlier` is later than `self`
    pub fn duration_since(&self, earlier: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }

    pub fn checked_add(&self, duration: Duration) -> Option<MonotonicInstant> {
        self.0.checked_add(duration).map(MonotonicInstant)
    }

    /// Add `duration`, clamping to a point roughly thirty years out instead of
    /// overflowing
    pub fn saturating_add(&self, duration: Duration) -> MonotonicInstant {
        self.checked_add(duration)
            .or_else(|| self.checked_add(FAR_FUTURE))
            .unwrap_or(*self)
    }

    pub fn into_tokio(self) -> tokio::time::Instant {
        self.0
    }
}

impl std::ops::Add<Duration> for MonotonicInstant {
    type Output = MonotonicInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl From<tokio::time::Instant> for MonotonicInstant {
    fn from(instant: tokio::time::Instant) -> Self {
        Self(instant)
    }
}

/// Format a duration as fractional minutes, e.g. `5.0 minutes`.
///
/// This is the rendering used inside alert reasons.
pub fn format_minutes(d: Duration) -> String {
    format!("{:.1} minutes", d.as_secs_f64() / 60.0)
}

/// Helper to format durations in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
