//! Adapter traits

use async_trait::async_trait;
use geowatch_api::{NotificationRequest, Position, Zone};
use geowatch_util::EntityId;
use std::time::Duration;
use thiserror::Error;

/// Errors from a position source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected status {status} for entity {entity_id}")]
    Status { entity_id: EntityId, status: u16 },

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Errors from a notifier
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

pub type NotifyResult<T> = Result<T, NotifyError>;

/// One successful position lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub position: Position,
    pub zone: Zone,
}

impl Observation {
    pub fn new(position: Position, zone: Zone) -> Self {
        Self { position, zone }
    }
}

/// Where current positions and assigned zones come from
///
/// Implementations may block on the network; callers are expected to wrap
/// every call in a deadline.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn fetch(&self, entity_id: &EntityId) -> SourceResult<Observation>;
}

/// Outbound alert channel
///
/// Delivery is best-effort: the core logs failures and moves on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, request: &NotificationRequest) -> NotifyResult<()>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "notifier"
    }
}
