//! Error types for geowatch

use thiserror::Error;

/// Core error type for geowatch operations
#[derive(Debug, Error)]
pub enum GeowatchError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Notification dispatcher is closed")]
    DispatcherClosed,
}

impl GeowatchError {
    pub fn schedule(msg: impl Into<String>) -> Self {
        Self::InvalidSchedule(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, GeowatchError>;
