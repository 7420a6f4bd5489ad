//! Geometry kernel and validation.

pub mod ops;
pub mod validate;

pub use ops::{
    buffer_points, buffer_set, contains_point, difference, intersect, union, AREA_EPS,
    BOUNDARY_EPS, CIRCLE_SEGMENTS,
};
pub use validate::validate_polygon;
