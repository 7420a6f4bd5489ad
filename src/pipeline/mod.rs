//! The derivation pipeline: risk zone → avoid buffer → final zone →
//! target addresses.
//!
//! A linear sequence with no branching and no retries; any stage failure
//! halts the run with no partial output. All configuration is passed in
//! explicitly, so a run is referentially transparent: identical inputs
//! give identical output.

mod classify;
mod eraser;
mod risk_zone;

pub use classify::classify_addresses;
pub use eraser::erase_avoid_buffer;
pub use risk_zone::build_risk_zone;

use geo::{Point, Polygon};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::error::{Error, Result, Stage, ValidationError};
use crate::models::{Derivation, FeatureLayer};

/// Default floor for the avoid-point buffer distance, in planar units.
pub const DEFAULT_MIN_BUFFER_DISTANCE: f64 = 1e-6;

/// Runtime parameters for one derivation, supplied by the configuration
/// provider. No ambient state: everything the pipeline needs is here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Radius of the opt-out buffer around each avoid point.
    pub buffer_distance: f64,
    /// Smallest accepted `buffer_distance`; anything below is rejected
    /// before any geometry work.
    pub min_buffer_distance: f64,
    /// Optional dilation applied to every risk layer before the
    /// intersect fold, as the original workflow did. `None` intersects
    /// the raw layers.
    pub risk_layer_buffer: Option<f64>,
}

impl AnalysisParams {
    pub fn new(buffer_distance: f64) -> Self {
        Self {
            buffer_distance,
            min_buffer_distance: DEFAULT_MIN_BUFFER_DISTANCE,
            risk_layer_buffer: None,
        }
    }

    pub fn with_risk_layer_buffer(mut self, distance: f64) -> Self {
        self.risk_layer_buffer = Some(distance);
        self
    }

    /// Reject out-of-range distances up front.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let check = |given: f64| -> Result<(), ValidationError> {
            if !given.is_finite() || given < self.min_buffer_distance || given <= 0.0 {
                return Err(ValidationError::BufferDistanceOutOfRange {
                    given,
                    min: self.min_buffer_distance,
                });
            }
            Ok(())
        };
        check(self.buffer_distance)?;
        if let Some(distance) = self.risk_layer_buffer {
            check(distance)?;
        }
        Ok(())
    }
}

/// Cloneable cancellation handle. The pipeline checks it at each stage
/// boundary; all geometry values are immutable, so aborting between
/// stages cannot leave anything inconsistent.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Reusable pipeline handle with validated parameters.
pub struct RiskAnalysis {
    params: AnalysisParams,
    cancel: CancelFlag,
}

impl RiskAnalysis {
    /// Validate `params` and build a pipeline handle.
    pub fn new(params: AnalysisParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            cancel: CancelFlag::new(),
        })
    }

    /// Attach a caller-owned cancellation flag (for deadline handling).
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    fn checkpoint(&self, stage: Stage) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled(stage));
        }
        Ok(())
    }

    /// Run the full derivation over immutable layer snapshots.
    pub fn run(
        &self,
        risk_layers: &[FeatureLayer<Polygon<f64>>],
        avoid_points: &FeatureLayer<Point<f64>>,
        addresses: &FeatureLayer<Point<f64>>,
    ) -> Result<Derivation> {
        info!(
            risk_layers = risk_layers.len(),
            avoid_points = avoid_points.len(),
            addresses = addresses.len(),
            buffer_distance = self.params.buffer_distance,
            "starting derivation"
        );

        self.checkpoint(Stage::RiskZone)?;
        let risk_zone = build_risk_zone(risk_layers, self.params.risk_layer_buffer)?;

        self.checkpoint(Stage::AvoidBuffer)?;
        // The eraser consumes the risk zone by value; keep a copy for the
        // renderer.
        let (avoid_buffer, final_zone) =
            erase_avoid_buffer(risk_zone.clone(), avoid_points, self.params.buffer_distance)?;

        self.checkpoint(Stage::Classify)?;
        let target_addresses = classify_addresses(&final_zone, addresses);

        info!(targets = target_addresses.count, "derivation complete");
        Ok(Derivation {
            risk_zone,
            avoid_buffer,
            final_zone,
            target_addresses,
        })
    }
}

/// Derive the addresses requiring treatment from the given layers.
///
/// The single entry point the surrounding system calls: risk layers are
/// intersected into a risk zone, the buffered avoid points are erased
/// from it, and the addresses inside the remaining final zone come back
/// in input order together with all intermediate zones.
pub fn derive_target_addresses(
    risk_layers: &[FeatureLayer<Polygon<f64>>],
    avoid_points: &FeatureLayer<Point<f64>>,
    addresses: &FeatureLayer<Point<f64>>,
    params: &AnalysisParams,
) -> Result<Derivation> {
    RiskAnalysis::new(params.clone())?.run(risk_layers, avoid_points, addresses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Feature;
    use geo::polygon;
    use proptest::prelude::*;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    fn square_layer(name: &str) -> FeatureLayer<Polygon<f64>> {
        let geometry = polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
            (x: 0.0, y: 0.0),
        ];
        FeatureLayer::polygons(name, vec![Feature::new(format!("{name}-1"), geometry)]).unwrap()
    }

    fn four_square_layers() -> Vec<FeatureLayer<Polygon<f64>>> {
        ["lakes", "larval_sites", "properties", "wetlands"]
            .into_iter()
            .map(square_layer)
            .collect()
    }

    fn point_layer(name: &str, points: Vec<(&str, f64, f64)>) -> FeatureLayer<Point<f64>> {
        let features = points
            .into_iter()
            .map(|(id, x, y)| Feature::new(id, Point::new(x, y)))
            .collect();
        FeatureLayer::points(name, features).unwrap()
    }

    #[test]
    fn test_end_to_end_scenario() {
        init_tracing();
        // Four identical [0,10]^2 layers; one avoid point at (5,5) with
        // distance 2; addresses at (1,1) and (5,5).
        let avoid = point_layer("avoid_points", vec![("opt-out", 5.0, 5.0)]);
        let addresses = point_layer(
            "addresses",
            vec![("addr-1", 1.0, 1.0), ("addr-2", 5.0, 5.0)],
        );
        let derivation = derive_target_addresses(
            &four_square_layers(),
            &avoid,
            &addresses,
            &AnalysisParams::new(2.0),
        )
        .unwrap();

        // Risk zone is the square itself.
        assert!((derivation.risk_zone.area() - 100.0).abs() < 1e-6);
        // Avoid buffer is the (polygonal) disk of radius 2 at (5,5).
        assert!((derivation.avoid_buffer.area() - std::f64::consts::PI * 4.0).abs() < 0.05);
        // Final zone is the square minus that disk.
        assert!(
            (derivation.final_zone.area()
                - (derivation.risk_zone.area() - derivation.avoid_buffer.area()))
            .abs()
                < 1e-6
        );
        // Only the address outside the opt-out disk remains.
        assert_eq!(derivation.target_addresses.count, 1);
        let ids: Vec<&str> = derivation.target_addresses.ids().collect();
        assert_eq!(ids, vec!["addr-1"]);
    }

    #[test]
    fn test_degenerate_scenario_empty_layer() {
        let mut layers = four_square_layers();
        layers[2] = FeatureLayer::polygons("properties", Vec::new()).unwrap();
        let avoid = point_layer("avoid_points", vec![("opt-out", 5.0, 5.0)]);
        let addresses = point_layer("addresses", vec![("addr-1", 1.0, 1.0)]);
        let derivation =
            derive_target_addresses(&layers, &avoid, &addresses, &AnalysisParams::new(2.0))
                .unwrap();
        assert!(derivation.risk_zone.is_empty());
        assert!(derivation.final_zone.is_empty());
        assert_eq!(derivation.target_addresses.count, 0);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let layers = four_square_layers();
        let avoid = point_layer("avoid_points", vec![("opt-out", 5.0, 5.0)]);
        let addresses = point_layer(
            "addresses",
            vec![("a", 1.0, 1.0), ("b", 9.0, 9.0), ("c", 5.0, 5.0)],
        );
        let params = AnalysisParams::new(2.0);
        let first = derive_target_addresses(&layers, &avoid, &addresses, &params).unwrap();
        let second = derive_target_addresses(&layers, &avoid, &addresses, &params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_params_rejected_before_any_geometry() {
        let layers = four_square_layers();
        let avoid = point_layer("avoid_points", Vec::new());
        let addresses = point_layer("addresses", Vec::new());

        for bad in [0.0, -2.0, f64::NAN, f64::INFINITY, 1e-9] {
            let err = derive_target_addresses(&layers, &avoid, &addresses, &AnalysisParams::new(bad))
                .unwrap_err();
            assert!(matches!(
                err,
                Error::Validation(ValidationError::BufferDistanceOutOfRange { .. })
            ));
        }
    }

    #[test]
    fn test_cancellation_at_stage_boundary() {
        let layers = four_square_layers();
        let avoid = point_layer("avoid_points", Vec::new());
        let addresses = point_layer("addresses", Vec::new());

        let analysis = RiskAnalysis::new(AnalysisParams::new(2.0)).unwrap();
        let flag = analysis.cancel_flag();
        flag.cancel();
        let err = analysis.run(&layers, &avoid, &addresses).unwrap_err();
        assert_eq!(err, Error::Cancelled(Stage::RiskZone));
    }

    fn arb_rect_layer(tag: usize) -> impl Strategy<Value = FeatureLayer<Polygon<f64>>> {
        prop::collection::vec((0i32..30, 0i32..30, 1i32..15, 1i32..15), 1..4).prop_map(
            move |rects| {
                let features = rects
                    .into_iter()
                    .enumerate()
                    .map(|(i, (x0, y0, w, h))| {
                        let (x0, y0, x1, y1) =
                            (x0 as f64, y0 as f64, (x0 + w) as f64, (y0 + h) as f64);
                        Feature::new(
                            format!("r{tag}-{i}"),
                            polygon![
                                (x: x0, y: y0),
                                (x: x1, y: y0),
                                (x: x1, y: y1),
                                (x: x0, y: y1),
                                (x: x0, y: y0),
                            ],
                        )
                    })
                    .collect();
                FeatureLayer::polygons(format!("layer-{tag}"), features).unwrap()
            },
        )
    }

    proptest! {
        // The risk zone must not depend on the order the configuration
        // provider lists the layers in.
        #[test]
        fn test_risk_zone_invariant_under_layer_permutation(
            layers in prop::collection::vec((0usize..1000usize).prop_flat_map(arb_rect_layer), 2..4)
                .prop_flat_map(|l| (Just(l.clone()), Just(l).prop_shuffle())),
        ) {
            let (original, shuffled) = layers;
            let a = build_risk_zone(&original, None).unwrap();
            let b = build_risk_zone(&shuffled, None).unwrap();
            prop_assert!(a.approx_eq(&b, 1e-6));
        }
    }
}
