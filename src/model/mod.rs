//! Data model for the tiled, hierarchical routing graph
//!
//! Contains the graph identifiers, the world tiling with its spatial bins,
//! the in-memory tile structures, the narrow store interface, and the
//! location types exchanged with callers.

pub mod graph_id;
pub mod location;
pub mod reader;
pub mod tile;
pub mod tiles;

pub use graph_id::GraphId;
pub use location::{Location, PathEdge, PathLocation, SideOfStreet, StopType};
pub use reader::{GraphReader, StaticTileSet};
pub use tile::{
    DirectedEdge, EdgeInfo, EdgeUse, GraphTile, GraphTileHeader, NodeInfo, NodeType,
    TransitDeparture, TransitRoute, access,
};
pub use tiles::{BIN_COUNT, BIN_DIM, ClosestFirst, TileHierarchy, TileLevel, Tiling};
