//! Feature layer snapshots consumed by the pipeline.

use geo::{Point, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::ValidationError;
use crate::geometry::validate::validate_polygon;

/// Free-form attribute bag carried through the pipeline untouched.
///
/// `BTreeMap` keeps serialized attribute order deterministic for the
/// report writer.
pub type Attributes = BTreeMap<String, String>;

/// A single identified geometry with its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature<G> {
    /// Identifier, unique within its layer.
    pub id: String,
    pub geometry: G,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

impl<G> Feature<G> {
    pub fn new(id: impl Into<String>, geometry: G) -> Self {
        Self {
            id: id.into(),
            geometry,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }
}

/// An immutable, ordered snapshot of one named vector layer.
///
/// Layers arrive fully loaded from the external layer source; the
/// constructors here re-check what the pipeline depends on (unique ids,
/// valid polygon geometry) and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLayer<G> {
    name: String,
    features: Vec<Feature<G>>,
}

impl<G> FeatureLayer<G> {
    fn check_unique_ids(name: &str, features: &[Feature<G>]) -> Result<(), ValidationError> {
        let mut seen = BTreeSet::new();
        for feature in features {
            if !seen.insert(feature.id.as_str()) {
                return Err(ValidationError::DuplicateFeatureId {
                    layer: name.to_string(),
                    id: feature.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn features(&self) -> &[Feature<G>] {
        &self.features
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature<G>> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FeatureLayer<Point<f64>> {
    /// Build a point layer, enforcing id uniqueness.
    pub fn points(
        name: impl Into<String>,
        features: Vec<Feature<Point<f64>>>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        Self::check_unique_ids(&name, &features)?;
        Ok(Self { name, features })
    }
}

impl FeatureLayer<Polygon<f64>> {
    /// Build a polygon layer, enforcing id uniqueness and per-polygon
    /// geometric validity (closed rings, no self-intersection, holes
    /// strictly nested and mutually disjoint).
    pub fn polygons(
        name: impl Into<String>,
        features: Vec<Feature<Polygon<f64>>>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        Self::check_unique_ids(&name, &features)?;
        for feature in &features {
            validate_polygon(&feature.geometry)?;
        }
        Ok(Self { name, features })
    }
}
