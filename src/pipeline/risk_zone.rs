//! Risk zone builder: intersect all hazard-indicator layers.

use geo::Polygon;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::geometry::ops;
use crate::models::{FeatureLayer, PolygonSet};

/// Convert each polygon layer to a normalized set (optionally dilated by
/// `pre_buffer`), then left-fold `intersect`.
///
/// `intersect` is associative and commutative, so the result does not
/// depend on layer order. Any empty layer (or an empty intermediate)
/// makes the whole zone empty; that is a legitimate result, logged as a
/// warning, and the fold short-circuits as soon as it happens.
pub fn build_risk_zone(
    layers: &[FeatureLayer<Polygon<f64>>],
    pre_buffer: Option<f64>,
) -> Result<PolygonSet> {
    if layers.is_empty() {
        warn!("no risk layers supplied, risk zone is empty");
        return Ok(PolygonSet::empty());
    }

    // Layer conversions are independent; run them in parallel and merge
    // back in layer order.
    let sets: Vec<PolygonSet> = layers
        .par_iter()
        .map(|layer| -> Result<PolygonSet> {
            let polygons: Vec<Polygon<f64>> =
                layer.iter().map(|f| f.geometry.clone()).collect();
            let mut set = PolygonSet::from_polygons(polygons)?;
            if let Some(distance) = pre_buffer {
                set = ops::buffer_set(&set, distance)?;
            }
            if set.is_empty() {
                warn!(layer = layer.name(), "risk layer is empty");
            } else {
                debug!(
                    layer = layer.name(),
                    members = set.len(),
                    area = set.area(),
                    "converted risk layer"
                );
            }
            Ok(set)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut iter = sets.into_iter();
    let Some(mut zone) = iter.next() else {
        return Ok(PolygonSet::empty());
    };
    for set in iter {
        if zone.is_empty() {
            break;
        }
        zone = ops::intersect(&zone, &set)?;
    }

    if zone.is_empty() {
        warn!("risk zone is empty");
    } else {
        info!(members = zone.len(), area = zone.area(), "risk zone built");
    }
    Ok(zone)
}
