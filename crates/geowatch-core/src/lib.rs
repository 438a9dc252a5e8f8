//! Core monitoring logic for geowatch
//!
//! This crate is the heart of geowatch, containing:
//! - Containment oracle (boundary-inclusive point-in-polygon with holes)
//! - Zone state machine (Inside -> Outside -> follow-up -> Returned)
//! - Notification dispatch decoupled from the polling loop
//! - Fixed-cadence poll scheduler with optional run deadline

mod containment;
mod dispatch;
mod events;
mod scheduler;
mod tracker;

pub use containment::*;
pub use dispatch::*;
pub use events::*;
pub use scheduler::*;
pub use tracker::*;
