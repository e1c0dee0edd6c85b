//! Geometry kernel for correlation and grid rasterization.
//!
//! Everything here works on lat/lng degrees and treats the neighbourhood of a
//! query point as planar, scaling longitude by the cosine of the latitude.
//! Distances compared in hot loops are squared meters.

mod approx;
mod polyline;

pub use approx::{DistanceApproximator, METERS_PER_DEGREE_LAT, meters_per_lng_degree};
pub use polyline::{
    affine_combination, distance, heading, is_left, project_onto_segment,
    resample_spherical_polyline, tangent_angle,
};
