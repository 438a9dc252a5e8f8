//! Domain types shared by every geowatch component
//!
//! This crate defines the vocabulary passed between the position source,
//! the containment oracle, the zone tracker and the notifier:
//! - Positions and zones (polygons with holes)
//! - Containment results
//! - Alert reasons and notification requests

mod events;
mod types;

pub use events::*;
pub use types::*;
