// Re-export of the main entry points

pub use crate::algo::{GriddedData, Isochrone, IsochroneConfig, bulk_isochrones};
pub use crate::costing::{Cost, DynamicCost, ModeCosting, TravelMode};
pub use crate::error::Error;
pub use crate::model::{
    GraphId, GraphReader, Location, PathEdge, PathLocation, SideOfStreet, StaticTileSet, StopType,
};
pub use crate::routing::{island, search};
