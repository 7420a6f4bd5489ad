//! Culex - a geometric risk-zone derivation engine.
//!
//! Derives the set of addresses requiring vector-control treatment from
//! independent vector layers: hazard-indicator polygon layers are
//! intersected into a risk zone, opt-out points are buffered and erased
//! from it, and address points are classified against the remaining
//! final zone.
//!
//! The crate is a pure in-process library: it consumes fully-loaded,
//! immutable [`FeatureLayer`] snapshots in one planar coordinate system
//! and produces a [`Derivation`]. Loading layers, rendering maps, and
//! writing reports belong to the surrounding system.
//!
//! ```
//! use culex::{derive_target_addresses, AnalysisParams, Feature, FeatureLayer};
//! use geo::{polygon, Point};
//!
//! let square = polygon![
//!     (x: 0.0, y: 0.0),
//!     (x: 10.0, y: 0.0),
//!     (x: 10.0, y: 10.0),
//!     (x: 0.0, y: 10.0),
//!     (x: 0.0, y: 0.0),
//! ];
//! let lakes = FeatureLayer::polygons("lakes", vec![Feature::new("l1", square.clone())])?;
//! let wetlands = FeatureLayer::polygons("wetlands", vec![Feature::new("w1", square)])?;
//! let avoid = FeatureLayer::points("avoid_points", vec![Feature::new("opt-out", Point::new(5.0, 5.0))])?;
//! let addresses = FeatureLayer::points(
//!     "addresses",
//!     vec![
//!         Feature::new("a", Point::new(1.0, 1.0)),
//!         Feature::new("b", Point::new(5.0, 5.0)),
//!     ],
//! )?;
//!
//! let derivation = derive_target_addresses(
//!     &[lakes, wetlands],
//!     &avoid,
//!     &addresses,
//!     &AnalysisParams::new(2.0),
//! )?;
//! assert_eq!(derivation.target_addresses.count, 1);
//! # Ok::<(), culex::Error>(())
//! ```

pub mod error;
pub mod geometry;
pub mod index;
pub mod models;
pub mod pipeline;

pub use error::{Error, GeometryError, Stage, ValidationError};
pub use index::ZoneIndex;
pub use models::{Attributes, Derivation, Feature, FeatureLayer, PolygonSet, TargetAddresses};
pub use pipeline::{
    derive_target_addresses, AnalysisParams, CancelFlag, RiskAnalysis,
    DEFAULT_MIN_BUFFER_DISTANCE,
};
