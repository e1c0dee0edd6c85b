use std::sync::Arc;

use hashbrown::HashMap;

use super::tile::{DirectedEdge, GraphTile};
use super::tiles::TileHierarchy;
use super::GraphId;

/// Narrow interface to the tiled graph store.
///
/// The store is free to evict between calls; every returned tile is an
/// independently owned handle. Implementations must be cheap to query
/// repeatedly for the same tile.
pub trait GraphReader {
    /// Tile owning the given id, if it exists in the store.
    fn graph_tile(&self, id: GraphId) -> Option<Arc<GraphTile>>;

    fn hierarchy(&self) -> &TileHierarchy;

    /// Id of the edge opposing `edge_id`, along with the tile that holds it.
    ///
    /// The opposing edge lives among the edges leaving the end node, at the
    /// offset recorded on the edge itself.
    fn opposing_edge_id(&self, edge_id: GraphId) -> Option<(GraphId, Arc<GraphTile>)> {
        let tile = self.graph_tile(edge_id.tile_base())?;
        let edge = *tile.directededge(edge_id)?;
        let end_tile = if edge.endnode.tile_base() == tile.id().tile_base() {
            tile
        } else {
            self.graph_tile(edge.endnode.tile_base())?
        };
        let node = *end_tile.node(edge.endnode)?;
        let opp_id = edge.endnode.with_index(node.edge_index + edge.opp_index);
        Some((opp_id, end_tile))
    }

    /// The opposing directed edge itself.
    fn opposing_edge(&self, edge_id: GraphId) -> Option<(GraphId, DirectedEdge, Arc<GraphTile>)> {
        let (opp_id, tile) = self.opposing_edge_id(edge_id)?;
        let edge = *tile.directededge(opp_id)?;
        Some((opp_id, edge, tile))
    }
}

/// Reference in-memory store: a map of prebuilt tiles.
///
/// Embedders that assemble tiles themselves (and the test suites) use this;
/// production stores implement [`GraphReader`] over whatever backing they
/// have.
#[derive(Debug, Default)]
pub struct StaticTileSet {
    hierarchy: TileHierarchy,
    tiles: HashMap<GraphId, Arc<GraphTile>>,
}

impl StaticTileSet {
    pub fn new() -> Self {
        Self {
            hierarchy: TileHierarchy::standard(),
            tiles: HashMap::new(),
        }
    }

    pub fn insert(&mut self, tile: GraphTile) {
        self.tiles.insert(tile.id().tile_base(), Arc::new(tile));
    }

    pub fn tile_mut(&mut self, id: GraphId) -> Option<&mut GraphTile> {
        self.tiles
            .get_mut(&id.tile_base())
            .and_then(|t| Arc::get_mut(t))
    }
}

impl GraphReader for StaticTileSet {
    fn graph_tile(&self, id: GraphId) -> Option<Arc<GraphTile>> {
        self.tiles.get(&id.tile_base()).cloned()
    }

    fn hierarchy(&self) -> &TileHierarchy {
        &self.hierarchy
    }
}
