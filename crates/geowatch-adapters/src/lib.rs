//! Transport adapters for geowatch
//!
//! Provides:
//! - HTTP position source speaking the GeoJSON feature-collection contract
//! - SMTP notifier (STARTTLS relay with credentials)
//! - Log-only notifier for running without a mail relay

mod http;
mod log;
mod smtp;

pub use http::*;
pub use log::*;
pub use smtp::*;
