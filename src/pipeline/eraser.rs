//! Avoid-buffer eraser: subtract buffered opt-out points from the risk
//! zone.

use geo::Point;
use tracing::{info, warn};

use crate::error::Result;
use crate::geometry::ops;
use crate::models::{FeatureLayer, PolygonSet};

/// Buffer the avoid points by `buffer_distance` and erase the buffered
/// region from `risk_zone`. Returns `(avoid_buffer, final_zone)`.
///
/// An empty avoid layer erases nothing: the final zone is the input risk
/// zone, returned unchanged. The distance has already been validated
/// against the configured minimum before any stage ran; the kernel still
/// rejects a non-positive value.
pub fn erase_avoid_buffer(
    risk_zone: PolygonSet,
    avoid_points: &FeatureLayer<Point<f64>>,
    buffer_distance: f64,
) -> Result<(PolygonSet, PolygonSet)> {
    if avoid_points.is_empty() {
        warn!(
            layer = avoid_points.name(),
            "no avoid points, final zone equals risk zone"
        );
        return Ok((PolygonSet::empty(), risk_zone));
    }

    let points: Vec<Point<f64>> = avoid_points.iter().map(|f| f.geometry).collect();
    let avoid_buffer = ops::buffer_points(&points, buffer_distance)?;
    let final_zone = ops::difference(&risk_zone, &avoid_buffer)?;
    info!(
        avoid_points = points.len(),
        buffer_distance,
        final_area = final_zone.area(),
        "avoid buffer erased from risk zone"
    );
    Ok((avoid_buffer, final_zone))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Feature;
    use geo::polygon;

    fn square_zone() -> PolygonSet {
        PolygonSet::from_polygons(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
            (x: 0.0, y: 0.0),
        ]])
        .unwrap()
    }

    fn point_layer(points: Vec<(f64, f64)>) -> FeatureLayer<Point<f64>> {
        let features = points
            .into_iter()
            .enumerate()
            .map(|(i, (x, y))| Feature::new(format!("p{i}"), Point::new(x, y)))
            .collect();
        FeatureLayer::points("avoid_points", features).unwrap()
    }

    #[test]
    fn test_empty_avoid_layer_is_exact_noop() {
        let zone = square_zone();
        let (avoid_buffer, final_zone) =
            erase_avoid_buffer(zone.clone(), &point_layer(Vec::new()), 2.0).unwrap();
        assert!(avoid_buffer.is_empty());
        // Exactly the same value, not a recomputed equivalent.
        assert_eq!(final_zone, zone);
    }

    #[test]
    fn test_erase_carves_disk_out_of_zone() {
        let zone = square_zone();
        let (avoid_buffer, final_zone) =
            erase_avoid_buffer(zone.clone(), &point_layer(vec![(5.0, 5.0)]), 2.0).unwrap();
        assert!(!avoid_buffer.is_empty());
        assert!((final_zone.area() - (zone.area() - avoid_buffer.area())).abs() < 1e-6);
        assert!(!crate::geometry::contains_point(&final_zone, Point::new(5.0, 5.0)));
        assert!(crate::geometry::contains_point(&final_zone, Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_erase_from_empty_zone() {
        let (avoid_buffer, final_zone) =
            erase_avoid_buffer(PolygonSet::empty(), &point_layer(vec![(5.0, 5.0)]), 2.0).unwrap();
        assert!(!avoid_buffer.is_empty());
        assert!(final_zone.is_empty());
    }
}
