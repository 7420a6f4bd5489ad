//! Geometry kernel: pure polygon-set operations.
//!
//! Boolean ops delegate to `geo`'s `BooleanOps` (exact-ish i_overlay
//! clipping) with candidate pairing through the R-tree index; buffering
//! and the boundary-inclusive point test are built here, under an explicit
//! tolerance policy:
//!
//! - circles are approximated with [`CIRCLE_SEGMENTS`] segments,
//! - output polygons with area below [`AREA_EPS`] are discarded as
//!   numerical slivers,
//! - a point within [`BOUNDARY_EPS`] of a boundary counts as inside.
//!
//! Every operation returns a new value; nothing here mutates shared state.

use geo::{
    unary_union, Area, BooleanOps, BoundingRect, Coord, Intersects, LineString, MultiPolygon,
    Point, Polygon,
};
use tracing::debug;

use crate::error::{GeometryError, Result, ValidationError};
use crate::index::ZoneIndex;
use crate::models::PolygonSet;

/// Segments per full circle when approximating a disk.
pub const CIRCLE_SEGMENTS: usize = 64;

/// Polygons with less area than this are treated as numerical slivers.
pub const AREA_EPS: f64 = 1e-9;

/// Points within this distance of a boundary are classified as inside.
pub const BOUNDARY_EPS: f64 = 1e-9;

/// Union a slice of possibly-overlapping polygons into disjoint pieces.
pub(crate) fn union_all(polygons: &[Polygon<f64>]) -> MultiPolygon<f64> {
    match polygons.len() {
        0 => MultiPolygon::new(Vec::new()),
        // A single polygon never overlaps itself; skip the clipper so the
        // input coordinates survive unchanged.
        1 => MultiPolygon::new(vec![polygons[0].clone()]),
        _ => unary_union(polygons.iter()),
    }
}

fn prune_slivers(multi: MultiPolygon<f64>) -> Vec<Polygon<f64>> {
    multi
        .0
        .into_iter()
        .filter(|p| p.unsigned_area() > AREA_EPS)
        .collect()
}

fn check_finite(polygons: &[Polygon<f64>], op: &'static str) -> Result<(), GeometryError> {
    let finite = |ring: &LineString<f64>| ring.0.iter().all(|c| c.x.is_finite() && c.y.is_finite());
    for polygon in polygons {
        if !finite(polygon.exterior()) || !polygon.interiors().iter().all(|r| finite(r)) {
            return Err(GeometryError::NonFiniteResult { op });
        }
    }
    Ok(())
}

fn bboxes_disjoint(a: &PolygonSet, b: &PolygonSet) -> bool {
    match (a.bbox(), b.bbox()) {
        (Some((ax0, ay0, ax1, ay1)), Some((bx0, by0, bx1, by1))) => {
            ax1 < bx0 || bx1 < ax0 || ay1 < by0 || by1 < ay0
        }
        _ => true,
    }
}

/// Region covered by both `a` and `b`. Disjoint inputs yield the empty
/// set, not an error. Commutative and idempotent.
pub fn intersect(a: &PolygonSet, b: &PolygonSet) -> Result<PolygonSet, GeometryError> {
    if a.is_empty() || b.is_empty() || bboxes_disjoint(a, b) {
        return Ok(PolygonSet::empty());
    }

    // Members of each set are disjoint, so pairwise pieces are disjoint
    // too and no re-union is needed.
    let index = ZoneIndex::build(b);
    let mut pieces = Vec::new();
    for polygon in a.polygons() {
        let Some(rect) = polygon.bounding_rect() else {
            continue;
        };
        let candidates: Vec<Polygon<f64>> = index
            .candidates(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
            .cloned()
            .collect();
        if candidates.is_empty() {
            continue;
        }
        let clipped = polygon.intersection(&MultiPolygon::new(candidates));
        pieces.extend(prune_slivers(clipped));
    }
    check_finite(&pieces, "intersection")?;
    Ok(PolygonSet::from_disjoint(MultiPolygon::new(pieces)))
}

/// Region covered by either `a` or `b`. Commutative and idempotent.
pub fn union(a: &PolygonSet, b: &PolygonSet) -> Result<PolygonSet, GeometryError> {
    if a.is_empty() {
        return Ok(b.clone());
    }
    if b.is_empty() {
        return Ok(a.clone());
    }
    let mut members: Vec<Polygon<f64>> = a.polygons().to_vec();
    members.extend_from_slice(b.polygons());
    let pieces = prune_slivers(union_all(&members));
    check_finite(&pieces, "union")?;
    Ok(PolygonSet::from_disjoint(MultiPolygon::new(pieces)))
}

/// Region in `a` not covered by `b` (erase). Not commutative.
/// `difference(a, ∅)` returns `a` unchanged; `difference(a, a)` is empty.
pub fn difference(a: &PolygonSet, b: &PolygonSet) -> Result<PolygonSet, GeometryError> {
    if a.is_empty() {
        return Ok(PolygonSet::empty());
    }
    // Erasing nothing is an exact no-op, not a recomputation.
    if b.is_empty() || bboxes_disjoint(a, b) {
        return Ok(a.clone());
    }

    let index = ZoneIndex::build(b);
    let mut pieces = Vec::new();
    for polygon in a.polygons() {
        let Some(rect) = polygon.bounding_rect() else {
            continue;
        };
        let candidates: Vec<Polygon<f64>> = index
            .candidates(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
            .cloned()
            .collect();
        if candidates.is_empty() {
            pieces.push(polygon.clone());
            continue;
        }
        let clipped = polygon.difference(&MultiPolygon::new(candidates));
        pieces.extend(prune_slivers(clipped));
    }
    check_finite(&pieces, "difference")?;
    Ok(PolygonSet::from_disjoint(MultiPolygon::new(pieces)))
}

fn check_radius(radius: f64) -> Result<(), ValidationError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(ValidationError::BufferDistanceOutOfRange {
            given: radius,
            min: 0.0,
        });
    }
    Ok(())
}

/// Polygonal disk of `radius` around `center`, [`CIRCLE_SEGMENTS`] segments.
fn disk(center: Point<f64>, radius: f64) -> Result<Polygon<f64>, GeometryError> {
    let mut coords = Vec::with_capacity(CIRCLE_SEGMENTS + 1);
    for i in 0..CIRCLE_SEGMENTS {
        let angle = std::f64::consts::TAU * (i as f64) / (CIRCLE_SEGMENTS as f64);
        coords.push(Coord {
            x: center.x() + radius * angle.cos(),
            y: center.y() + radius * angle.sin(),
        });
    }
    coords.push(coords[0]);
    if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(GeometryError::DegenerateBuffer {
            x: center.x(),
            y: center.y(),
        });
    }
    Ok(Polygon::new(LineString::new(coords), Vec::new()))
}

/// Union of disks of `radius` around each point. Empty input yields the
/// empty set; a non-positive or non-finite radius is a validation error,
/// raised before any geometry work.
pub fn buffer_points(points: &[Point<f64>], radius: f64) -> Result<PolygonSet> {
    check_radius(radius)?;
    if points.is_empty() {
        return Ok(PolygonSet::empty());
    }
    let disks = points
        .iter()
        .map(|p| disk(*p, radius))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(points = points.len(), radius, "buffered point set");
    Ok(PolygonSet::from_disjoint(MultiPolygon::new(prune_slivers(
        union_all(&disks),
    ))))
}

/// Dilate a polygon set by `radius` (Minkowski sum with a disk): the
/// input unioned with a capsule along every ring edge and a disk at every
/// vertex. Hole boundaries are dilated too, which shrinks the holes, as
/// dilation should.
pub fn buffer_set(set: &PolygonSet, radius: f64) -> Result<PolygonSet> {
    check_radius(radius)?;
    if set.is_empty() {
        return Ok(PolygonSet::empty());
    }

    let mut pieces: Vec<Polygon<f64>> = set.polygons().to_vec();
    for polygon in set.polygons() {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            for line in ring.lines() {
                let (a, b) = (line.start, line.end);
                let len = (b.x - a.x).hypot(b.y - a.y);
                if len > 0.0 {
                    // Rectangle of half-width `radius` along the edge.
                    let nx = -(b.y - a.y) / len * radius;
                    let ny = (b.x - a.x) / len * radius;
                    pieces.push(Polygon::new(
                        LineString::new(vec![
                            Coord { x: a.x + nx, y: a.y + ny },
                            Coord { x: b.x + nx, y: b.y + ny },
                            Coord { x: b.x - nx, y: b.y - ny },
                            Coord { x: a.x - nx, y: a.y - ny },
                            Coord { x: a.x + nx, y: a.y + ny },
                        ]),
                        Vec::new(),
                    ));
                }
                pieces.push(disk(Point::new(a.x, a.y), radius)?);
            }
        }
    }

    let result = prune_slivers(union_all(&pieces));
    check_finite(&result, "buffer")?;
    Ok(PolygonSet::from_disjoint(MultiPolygon::new(result)))
}

fn point_segment_distance(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len2 = abx * abx + aby * aby;
    if len2 == 0.0 {
        return (p.x - a.x).hypot(p.y - a.y);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len2).clamp(0.0, 1.0);
    (p.x - (a.x + t * abx)).hypot(p.y - (a.y + t * aby))
}

/// Boundary-inclusive point-in-polygon test with the [`BOUNDARY_EPS`]
/// tolerance: interior points, points exactly on a boundary, and points
/// within the tolerance of one all count as inside.
pub(crate) fn polygon_contains_inclusive(polygon: &Polygon<f64>, point: Point<f64>) -> bool {
    if polygon.intersects(&point) {
        return true;
    }
    let near = |ring: &LineString<f64>| {
        ring.lines()
            .any(|l| point_segment_distance(point.0, l.start, l.end) <= BOUNDARY_EPS)
    };
    near(polygon.exterior()) || polygon.interiors().iter().any(near)
}

/// True when `p` lies in the closed region covered by `set`.
///
/// The boundary is inclusive: an address exactly on a zone edge is
/// classified as requiring treatment. This is the crate's documented
/// convention (erring toward treatment) and is pinned by fixture tests.
pub fn contains_point(set: &PolygonSet, p: Point<f64>) -> bool {
    set.polygons()
        .iter()
        .any(|polygon| polygon_contains_inclusive(polygon, p))
}
