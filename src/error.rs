//! Error types for the derivation pipeline.
//!
//! Validation problems are caught before any boolean-op work starts;
//! numerical degeneracies surface as [`GeometryError`] and halt the
//! pipeline (fail-fast, no partial output). Empty layers and empty
//! intermediate zones are legitimate values, not errors.

use thiserror::Error;

/// Pipeline stage names, used for cancellation and log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RiskZone,
    AvoidBuffer,
    Classify,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::RiskZone => write!(f, "risk_zone"),
            Stage::AvoidBuffer => write!(f, "avoid_buffer"),
            Stage::Classify => write!(f, "classify"),
        }
    }
}

/// Malformed input: geometry or parameters rejected before any expensive
/// computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("ring has a non-finite coordinate at index {index}")]
    NonFiniteCoordinate { index: usize },

    #[error("ring is not closed (first and last coordinates differ)")]
    UnclosedRing,

    #[error("ring has {count} coordinates, need at least 4 (closed triangle)")]
    TooFewCoordinates { count: usize },

    #[error("ring is self-intersecting (segments {first} and {second} cross)")]
    SelfIntersectingRing { first: usize, second: usize },

    #[error("hole {hole} is not strictly nested inside the outer ring")]
    HoleOutsideShell { hole: usize },

    #[error("holes {first} and {second} overlap")]
    OverlappingHoles { first: usize, second: usize },

    #[error("total hole area {holes} exceeds outer ring area {outer}")]
    HoleAreaExceedsShell { outer: f64, holes: f64 },

    #[error("duplicate feature id {id:?} in layer {layer:?}")]
    DuplicateFeatureId { layer: String, id: String },

    #[error("buffer distance {given} is out of range (must be finite and >= {min})")]
    BufferDistanceOutOfRange { given: f64, min: f64 },
}

/// Numerical degeneracy that the kernel's tolerance policy could not
/// resolve. Deterministic, so never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("{op} produced a non-finite coordinate")]
    NonFiniteResult { op: &'static str },

    #[error("buffer construction produced a degenerate ring for point ({x}, {y})")]
    DegenerateBuffer { x: f64, y: f64 },
}

/// Top-level error for the derivation pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("geometry operation failed: {0}")]
    Geometry(#[from] GeometryError),

    #[error("pipeline cancelled before stage {0}")]
    Cancelled(Stage),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
