//! Geometry validation: everything here runs before any boolean-op work.

use geo::{Area, Contains, Coord, Intersects, LineString, Polygon};

use crate::error::ValidationError;

/// Orientation tests below treat cross products within this band as
/// collinear.
const ORIENT_EPS: f64 = 1e-12;

fn orient(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> bool {
    p.x >= a.x.min(b.x) - ORIENT_EPS
        && p.x <= a.x.max(b.x) + ORIENT_EPS
        && p.y >= a.y.min(b.y) - ORIENT_EPS
        && p.y <= a.y.max(b.y) + ORIENT_EPS
}

/// Inclusive segment intersection: crossing, touching, or collinear
/// overlap all count.
fn segments_intersect(p1: Coord<f64>, p2: Coord<f64>, p3: Coord<f64>, p4: Coord<f64>) -> bool {
    let d1 = orient(p3, p4, p1);
    let d2 = orient(p3, p4, p2);
    let d3 = orient(p1, p2, p3);
    let d4 = orient(p1, p2, p4);

    if ((d1 > ORIENT_EPS && d2 < -ORIENT_EPS) || (d1 < -ORIENT_EPS && d2 > ORIENT_EPS))
        && ((d3 > ORIENT_EPS && d4 < -ORIENT_EPS) || (d3 < -ORIENT_EPS && d4 > ORIENT_EPS))
    {
        return true;
    }
    (d1.abs() <= ORIENT_EPS && on_segment(p3, p4, p1))
        || (d2.abs() <= ORIENT_EPS && on_segment(p3, p4, p2))
        || (d3.abs() <= ORIENT_EPS && on_segment(p1, p2, p3))
        || (d4.abs() <= ORIENT_EPS && on_segment(p1, p2, p4))
}

/// Validate one closed ring: finite coordinates, closure, minimum length,
/// no self-intersection.
pub(crate) fn validate_ring(ring: &LineString<f64>) -> Result<(), ValidationError> {
    let coords = &ring.0;

    for (index, coord) in coords.iter().enumerate() {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate { index });
        }
    }
    if coords.len() < 4 {
        return Err(ValidationError::TooFewCoordinates {
            count: coords.len(),
        });
    }
    if coords.first() != coords.last() {
        return Err(ValidationError::UnclosedRing);
    }

    // Segment i runs from coords[i] to coords[i + 1]. Adjacent segments
    // share a vertex by construction; any other contact is a defect. The
    // first and last segments are adjacent through the closure vertex.
    let segments = coords.len() - 1;
    for i in 0..segments {
        for j in (i + 2)..segments {
            if i == 0 && j == segments - 1 {
                continue;
            }
            // Cheap bbox reject before the orientation tests.
            let (a1, a2) = (coords[i], coords[i + 1]);
            let (b1, b2) = (coords[j], coords[j + 1]);
            if a1.x.max(a2.x) < b1.x.min(b2.x) - ORIENT_EPS
                || b1.x.max(b2.x) < a1.x.min(a2.x) - ORIENT_EPS
                || a1.y.max(a2.y) < b1.y.min(b2.y) - ORIENT_EPS
                || b1.y.max(b2.y) < a1.y.min(a2.y) - ORIENT_EPS
            {
                continue;
            }
            if segments_intersect(a1, a2, b1, b2) {
                return Err(ValidationError::SelfIntersectingRing { first: i, second: j });
            }
        }
    }
    Ok(())
}

/// Validate a polygon: each ring valid, holes strictly nested inside the
/// outer ring (no boundary contact), holes mutually disjoint, and hole
/// area not exceeding the outer ring's.
pub fn validate_polygon(polygon: &Polygon<f64>) -> Result<(), ValidationError> {
    validate_ring(polygon.exterior())?;
    for hole in polygon.interiors() {
        validate_ring(hole)?;
    }

    let shell = Polygon::new(polygon.exterior().clone(), Vec::new());
    let holes: Vec<Polygon<f64>> = polygon
        .interiors()
        .iter()
        .map(|ring| Polygon::new(ring.clone(), Vec::new()))
        .collect();

    for (i, hole) in holes.iter().enumerate() {
        if !shell.contains(hole) || polygon.exterior().intersects(hole.exterior()) {
            return Err(ValidationError::HoleOutsideShell { hole: i });
        }
    }
    for i in 0..holes.len() {
        for j in (i + 1)..holes.len() {
            if holes[i].intersects(&holes[j]) {
                return Err(ValidationError::OverlappingHoles { first: i, second: j });
            }
        }
    }

    let outer_area = shell.unsigned_area();
    let hole_area: f64 = holes.iter().map(|h| h.unsigned_area()).sum();
    if hole_area > outer_area + ORIENT_EPS {
        return Err(ValidationError::HoleAreaExceedsShell {
            outer: outer_area,
            holes: hole_area,
        });
    }
    Ok(())
}
