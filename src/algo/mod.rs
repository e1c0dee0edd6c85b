//! Cost-ordered expansion: the bucketed queue, edge bookkeeping, the
//! isotile grid, and the isochrone engines built on them.

pub mod bucket_queue;
pub mod edge_label;
pub mod edge_status;
pub mod gridded;
pub mod isochrone;

pub use bucket_queue::DoubleBucketQueue;
pub use edge_label::{EdgeLabel, INVALID_LABEL};
pub use edge_status::{EdgeSet, EdgeStatus, EdgeStatusInfo};
pub use gridded::GriddedData;
pub use isochrone::{
    BUCKET_COUNT, INITIAL_EDGE_LABEL_COUNT, Isochrone, IsochroneConfig, bulk_isochrones,
};
