//! Adapter trait interfaces for geowatch
//!
//! This crate defines the boundary between the monitoring core and the
//! outside world: where positions come from and where alerts go. It contains
//! no transport code itself; see `geowatch-adapters` for HTTP and SMTP.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
