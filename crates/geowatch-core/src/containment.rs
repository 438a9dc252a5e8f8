//! Containment oracle
//!
//! Answers "is this position inside (or on the edge of) this zone". Any zone
//! that cannot be turned into a valid polygon answers `false`: a spurious
//! "outside" only costs an extra alert, a spurious "inside" could hide a real
//! excursion.

use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{Area, Coord, Intersects, LineString, Polygon};
use geowatch_api::{Position, Ring, Zone};
use tracing::trace;

/// Largest zone, counted in vertices over all rings, that is evaluated.
/// Bigger zones are treated as malformed.
pub const MAX_ZONE_VERTICES: usize = 2_000;

/// Boundary-inclusive containment test.
///
/// The first ring of `zone` is the outer boundary, later rings are holes.
/// Points on any edge or vertex, including hole edges, count as inside.
pub fn contains(position: &Position, zone: &Zone) -> bool {
    if !position.lat.is_finite() || !position.lon.is_finite() {
        return false;
    }

    let Some(polygon) = build_polygon(zone) else {
        trace!(rings = zone.rings.len(), "Zone geometry rejected");
        return false;
    };

    polygon.intersects(&Coord {
        x: position.lon,
        y: position.lat,
    })
}

/// Build a validated polygon from a zone, or None if the geometry is unusable
pub fn build_polygon(zone: &Zone) -> Option<Polygon<f64>> {
    let vertices: usize = zone.rings.iter().map(Vec::len).sum();
    if vertices > MAX_ZONE_VERTICES {
        trace!(vertices, "Zone too large");
        return None;
    }

    let exterior = build_ring(zone.exterior()?)?;
    let holes = zone
        .holes()
        .iter()
        .map(build_ring)
        .collect::<Option<Vec<_>>>()?;

    let polygon = Polygon::new(exterior, holes);

    let rings_simple = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .all(ring_is_simple);

    rings_simple.then_some(polygon)
}

/// Convert `[lon, lat]` vertices into an open linestring with consecutive
/// duplicates removed. `Polygon::new` closes it.
fn build_ring(ring: &Ring) -> Option<LineString<f64>> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.len());
    for &[x, y] in ring {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let coord = Coord { x, y };
        if coords.last() != Some(&coord) {
            coords.push(coord);
        }
    }

    // Drop the explicit closing vertex, if present
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }

    if coords.len() < 3 {
        return None;
    }

    let line = LineString::from(coords);

    // Collinear vertices enclose nothing
    if Polygon::new(line.clone(), vec![]).unsigned_area() == 0.0 {
        return None;
    }

    Some(line)
}

/// A closed ring is simple if no two edges meet except neighbours at their
/// shared vertex.
fn ring_is_simple(ring: &LineString<f64>) -> bool {
    let edges: Vec<_> = ring.lines().collect();
    let n = edges.len();

    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match line_intersection(edges[i], edges[j]) {
                None => {}
                Some(LineIntersection::SinglePoint { is_proper, .. }) => {
                    if !adjacent || is_proper {
                        return false;
                    }
                }
                Some(LineIntersection::Collinear { .. }) => return false,
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Ring {
        vec![[min, min], [max, min], [max, max], [min, max], [min, min]]
    }

    fn zone_with_hole() -> Zone {
        Zone::new(vec![square(0.0, 10.0), square(4.0, 6.0)])
    }

    #[test]
    fn point_inside_outer_ring() {
        let zone = Zone::new(vec![square(0.0, 10.0)]);
        assert!(contains(&Position::from_lon_lat(5.0, 5.0), &zone));
    }

    #[test]
    fn point_outside_outer_ring() {
        let zone = Zone::new(vec![square(0.0, 10.0)]);
        assert!(!contains(&Position::from_lon_lat(15.0, 5.0), &zone));
    }

    #[test]
    fn point_on_edge_counts_as_inside() {
        let zone = Zone::new(vec![square(0.0, 10.0)]);
        assert!(contains(&Position::from_lon_lat(10.0, 5.0), &zone));
        assert!(contains(&Position::from_lon_lat(5.0, 0.0), &zone));
    }

    #[test]
    fn point_on_vertex_counts_as_inside() {
        let zone = Zone::new(vec![square(0.0, 10.0)]);
        assert!(contains(&Position::from_lon_lat(0.0, 0.0), &zone));
        assert!(contains(&Position::from_lon_lat(10.0, 10.0), &zone));
    }

    #[test]
    fn point_in_hole_is_outside() {
        assert!(!contains(&Position::from_lon_lat(5.0, 5.0), &zone_with_hole()));
        assert!(contains(&Position::from_lon_lat(2.0, 2.0), &zone_with_hole()));
    }

    #[test]
    fn point_on_hole_edge_counts_as_inside() {
        assert!(contains(&Position::from_lon_lat(4.0, 5.0), &zone_with_hole()));
    }

    #[test]
    fn unclosed_ring_is_accepted() {
        let zone = Zone::new(vec![vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]]);
        assert!(contains(&Position::from_lon_lat(5.0, 5.0), &zone));
    }

    #[test]
    fn empty_zone_contains_nothing() {
        assert!(!contains(&Position::from_lon_lat(0.0, 0.0), &Zone::default()));
    }

    #[test]
    fn degenerate_rings_contain_nothing() {
        let two_points = Zone::new(vec![vec![[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]);
        assert!(!contains(&Position::from_lon_lat(0.0, 0.0), &two_points));

        let collinear = Zone::new(vec![vec![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [0.0, 0.0]]]);
        assert!(!contains(&Position::from_lon_lat(1.0, 1.0), &collinear));
    }

    #[test]
    fn self_intersecting_ring_contains_nothing() {
        // Bow tie: edges (0,0)-(10,10) and (10,0)-(0,10) cross at (5,5)
        let bow_tie = Zone::new(vec![vec![
            [0.0, 0.0],
            [10.0, 10.0],
            [10.0, 0.0],
            [0.0, 10.0],
            [0.0, 0.0],
        ]]);
        assert!(!contains(&Position::from_lon_lat(8.0, 5.0), &bow_tie));
        assert!(build_polygon(&bow_tie).is_none());
    }

    #[test]
    fn malformed_hole_rejects_whole_zone() {
        let zone = Zone::new(vec![square(0.0, 10.0), vec![[1.0, 1.0], [2.0, 2.0]]]);
        assert!(!contains(&Position::from_lon_lat(8.0, 8.0), &zone));
    }

    fn circle(vertices: usize) -> Ring {
        (0..vertices)
            .map(|i| {
                let angle = i as f64 / vertices as f64 * std::f64::consts::TAU;
                [10.0 * angle.cos(), 10.0 * angle.sin()]
            })
            .collect()
    }

    #[test]
    fn oversized_zone_contains_nothing() {
        let centre = Position::from_lon_lat(0.0, 0.0);

        let largest = Zone::new(vec![circle(MAX_ZONE_VERTICES)]);
        assert!(contains(&centre, &largest));

        let oversized = Zone::new(vec![circle(MAX_ZONE_VERTICES + 1)]);
        assert!(!contains(&centre, &oversized));
        assert!(build_polygon(&oversized).is_none());
    }

    #[test]
    fn non_finite_input_contains_nothing() {
        let zone = Zone::new(vec![square(0.0, 10.0)]);
        assert!(!contains(&Position::new(f64::NAN, 5.0), &zone));

        let bad = Zone::new(vec![vec![[0.0, 0.0], [f64::INFINITY, 0.0], [5.0, 5.0]]]);
        assert!(!contains(&Position::from_lon_lat(1.0, 0.5), &bad));
    }
}
