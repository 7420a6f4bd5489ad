//! Polygon-set zones and pipeline result types.

use geo::{Area, BoundingRect, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::geometry::validate::validate_polygon;
use crate::models::Feature;

/// A planar region as a set of non-overlapping polygons.
///
/// The non-overlap invariant is maintained by construction: every
/// constructor that could be handed overlapping members union-normalizes
/// them, and the kernel's set operations only ever emit disjoint pieces.
/// Possibly disconnected, possibly empty; empty is a legitimate value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolygonSet(MultiPolygon<f64>);

impl PolygonSet {
    /// The empty region.
    pub fn empty() -> Self {
        Self(MultiPolygon::new(Vec::new()))
    }

    /// Build a set from polygons that may overlap, validating each and
    /// union-normalizing the result.
    pub fn from_polygons(polygons: Vec<Polygon<f64>>) -> Result<Self, ValidationError> {
        for polygon in &polygons {
            validate_polygon(polygon)?;
        }
        Ok(Self(crate::geometry::ops::union_all(&polygons)))
    }

    /// Wrap kernel output that is already known disjoint.
    pub(crate) fn from_disjoint(multi: MultiPolygon<f64>) -> Self {
        Self(multi)
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.0
    }

    pub fn polygons(&self) -> &[Polygon<f64>] {
        &self.0 .0
    }

    pub fn len(&self) -> usize {
        self.0 .0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0 .0.is_empty()
    }

    /// Total covered area.
    pub fn area(&self) -> f64 {
        self.0.unsigned_area()
    }

    /// Axis-aligned bounds as `(min_x, min_y, max_x, max_y)`, `None` when
    /// empty.
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.0
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    /// Area-based equality: true when the symmetric difference of the two
    /// regions is below `tolerance`.
    ///
    /// Boolean ops over floats do not produce canonical vertex lists, so
    /// structural `==` is only meaningful for values that were never
    /// recomputed; region comparisons go through this.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        let (Ok(forward), Ok(backward)) = (
            crate::geometry::ops::difference(self, other),
            crate::geometry::ops::difference(other, self),
        ) else {
            return false;
        };
        forward.area() + backward.area() <= tolerance
    }
}

/// The ordered subset of the address layer that falls inside the final
/// zone, plus its count for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetAddresses {
    /// Matching address records in input-layer order, attributes intact.
    pub records: Vec<Feature<Point<f64>>>,
    pub count: usize,
}

impl TargetAddresses {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }
}

/// Everything one pipeline run produces, for the report writer and the
/// renderer (which draws the final zone, the avoid buffer, and the target
/// addresses with a count annotation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Derivation {
    pub risk_zone: PolygonSet,
    pub avoid_buffer: PolygonSet,
    pub final_zone: PolygonSet,
    pub target_addresses: TargetAddresses,
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square(origin: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: origin, y: origin),
            (x: origin + size, y: origin),
            (x: origin + size, y: origin + size),
            (x: origin, y: origin + size),
            (x: origin, y: origin),
        ]
    }

    #[test]
    fn test_empty_set() {
        let set = PolygonSet::empty();
        assert!(set.is_empty());
        assert_eq!(set.area(), 0.0);
        assert_eq!(set.bbox(), None);
    }

    #[test]
    fn test_overlapping_members_are_union_normalized() {
        // Two overlapping 2x2 squares become one polygon of area 7.
        let set = PolygonSet::from_polygons(vec![square(0.0, 2.0), square(1.0, 2.0)]).unwrap();
        assert_eq!(set.len(), 1);
        assert!((set.area() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_members_stay_separate() {
        let set = PolygonSet::from_polygons(vec![square(0.0, 1.0), square(5.0, 1.0)]).unwrap();
        assert_eq!(set.len(), 2);
        assert!((set.area() - 2.0).abs() < 1e-9);
        assert_eq!(set.bbox(), Some((0.0, 0.0, 6.0, 6.0)));
    }

    #[test]
    fn test_approx_eq() {
        let a = PolygonSet::from_polygons(vec![square(0.0, 2.0)]).unwrap();
        let b = PolygonSet::from_polygons(vec![square(0.0, 2.0)]).unwrap();
        let c = PolygonSet::from_polygons(vec![square(0.0, 3.0)]).unwrap();
        assert!(a.approx_eq(&b, 1e-9));
        assert!(!a.approx_eq(&c, 1e-9));
    }
}
