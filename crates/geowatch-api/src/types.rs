//! Shared geometry and status types

use geowatch_util::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build from a GeoJSON-ordered `[lon, lat]` pair
    pub fn from_lon_lat(lon: f64, lat: f64) -> Self {
        Self { lat, lon }
    }
}

/// A closed ring of `[lon, lat]` vertices
pub type Ring = Vec<[f64; 2]>;

/// A safety zone: the first ring is the outer boundary, every later ring is
/// an excluded sub-area (hole).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub rings: Vec<Ring>,
}

impl Zone {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    pub fn exterior(&self) -> Option<&Ring> {
        self.rings.first()
    }

    pub fn holes(&self) -> &[Ring] {
        self.rings.get(1..).unwrap_or(&[])
    }

    /// A zone without rings cannot contain anything
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }
}

/// Result of testing one observation against its zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Containment {
    Inside,
    Outside,
    /// The observation could not be made (fetch failure, malformed data).
    /// Alerting treats this exactly like `Outside`.
    Unknown,
}

impl Containment {
    pub fn from_contains(contained: bool) -> Self {
        if contained { Self::Inside } else { Self::Outside }
    }

    pub fn is_inside(self) -> bool {
        matches!(self, Self::Inside)
    }
}

impl fmt::Display for Containment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inside => write!(f, "inside"),
            Self::Outside => write!(f, "outside"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Point-in-time view of one entity's tracker state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStatus {
    pub entity_id: EntityId,
    pub inside: bool,
    /// How long the current excursion has lasted, if one is ongoing
    pub out_for: Option<Duration>,
    pub followup_alert_sent: bool,
    pub observations: u64,
    pub last_containment: Option<Containment>,
}
