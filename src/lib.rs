//! Correlation and reachability engines for a tiled road network.
//!
//! Two engines over the same hierarchical, tiled graph:
//!
//! - [`routing::search`] snaps geographic inputs onto the most plausible
//!   directed edges, returning projection metadata (position along the edge,
//!   side of street, distance) for each candidate.
//! - [`algo::Isochrone`] expands outward from correlated locations in
//!   increasing cost order, writing minutes-to-reach onto a uniform grid
//!   that downstream contouring turns into isochrone polygons. Forward,
//!   reverse, and schedule-aware multimodal expansions are provided.
//!
//! The graph store itself is external and consumed through
//! [`model::GraphReader`]; cost models are external and consumed through
//! [`costing::DynamicCost`].

pub mod algo;
pub mod costing;
pub mod datetime;
pub mod error;
pub mod geometry;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::Error;
