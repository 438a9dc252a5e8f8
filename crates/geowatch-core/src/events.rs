//! Reports produced by the poll scheduler

use geowatch_api::EntityStatus;
use std::time::Duration;

/// Outcome of one polling tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 1-based tick number
    pub tick: u64,
    pub inside: usize,
    pub outside: usize,
    pub unknown: usize,
    /// Notifications handed to the dispatcher during this tick
    pub notifications: usize,
}

/// Why the polling loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    DeadlineReached,
    Cancelled,
}

/// Final report of a monitoring run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub notifications_submitted: u64,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
    pub entities: Vec<EntityStatus>,
}

impl RunSummary {
    /// Entities outside their zone when the run ended
    pub fn entities_outside(&self) -> impl Iterator<Item = &EntityStatus> {
        self.entities.iter().filter(|status| !status.inside)
    }
}
