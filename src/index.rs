//! Spatial index for fast polygon-set queries.
//!
//! Wraps the member polygons of a [`PolygonSet`] in an R-tree. Envelope
//! queries return a superset of the true overlaps (false positives
//! allowed, false negatives forbidden); callers always re-verify with the
//! exact geometric test. Built once, read-only afterwards, so concurrent
//! queries need no locking.

use geo::{BoundingRect, Point, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use std::sync::Arc;
use tracing::debug;

use crate::geometry::ops::{polygon_contains_inclusive, BOUNDARY_EPS};
use crate::models::PolygonSet;

/// Wrapper for R-tree indexing of one member polygon.
#[derive(Clone)]
struct IndexedPolygon {
    polygon: Arc<Polygon<f64>>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedPolygon {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedPolygon {
    fn new(polygon: &Polygon<f64>) -> Option<Self> {
        let rect = polygon.bounding_rect()?;
        // Inflate by the boundary tolerance so the tolerant point test is
        // never starved of candidates (superset contract).
        Some(Self {
            polygon: Arc::new(polygon.clone()),
            envelope: AABB::from_corners(
                [rect.min().x - BOUNDARY_EPS, rect.min().y - BOUNDARY_EPS],
                [rect.max().x + BOUNDARY_EPS, rect.max().y + BOUNDARY_EPS],
            ),
        })
    }
}

/// R-tree over the member polygons of a zone.
pub struct ZoneIndex {
    tree: RTree<IndexedPolygon>,
}

impl ZoneIndex {
    /// Bulk-load an index over the members of `set`.
    pub fn build(set: &PolygonSet) -> Self {
        let indexed: Vec<IndexedPolygon> = set
            .polygons()
            .iter()
            .filter_map(IndexedPolygon::new)
            .collect();
        let tree = RTree::bulk_load(indexed);
        debug!(members = tree.size(), "zone index built");
        Self { tree }
    }

    /// Member polygons whose envelope intersects the query box. A superset
    /// of the true overlaps; re-verify geometrically.
    pub fn candidates(
        &self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> impl Iterator<Item = &Polygon<f64>> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|ip| ip.polygon.as_ref())
    }

    /// Boundary-inclusive point lookup: envelope candidates first, then
    /// the exact test.
    pub fn contains_point(&self, point: Point<f64>) -> bool {
        let envelope = AABB::from_point([point.x(), point.y()]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .any(|ip| polygon_contains_inclusive(&ip.polygon, point))
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
