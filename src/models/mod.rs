//! Core data model for the derivation pipeline.

pub mod feature;
pub mod zone;

pub use feature::{Attributes, Feature, FeatureLayer};
pub use zone::{Derivation, PolygonSet, TargetAddresses};
