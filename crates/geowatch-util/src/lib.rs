//! Shared utilities for geowatch
//!
//! This crate provides:
//! - ID types (EntityId, AlertId)
//! - Time utilities (monotonic time, duration formatting)
//! - Error types
//! - Default paths for the configuration file

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
