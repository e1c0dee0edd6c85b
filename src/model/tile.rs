//! In-memory representation of one graph tile.
//!
//! The binary store format is not modeled here; a tile is the unit handed
//! out by a [`GraphReader`](super::GraphReader) and holds a forward-star
//! graph fragment: nodes pointing at a run of directed edges, shared edge
//! shapes, the 5x5 spatial bins, and the transit schedule payload.

use std::sync::Arc;

use geo::{LineString, Point};

use super::GraphId;
use super::tiles::BIN_COUNT;

/// Access bit masks used by `forwardaccess`/`reverseaccess` and node access.
pub mod access {
    pub const AUTO: u32 = 1;
    pub const PEDESTRIAN: u32 = 2;
    pub const BICYCLE: u32 = 4;
    pub const BUS: u32 = 8;
    pub const WHEELCHAIR: u32 = 16;
    pub const ALL: u32 = 31;
}

/// Specialized edge use. Transit lines and the connections into them get
/// their own variants; everything else is a flavour of road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeUse {
    #[default]
    Road,
    Ramp,
    Footway,
    Cycleway,
    Ferry,
    /// Connection between the road network and a transit stop.
    TransitConnection,
    /// Rail transit line.
    Rail,
    /// Bus transit line.
    Bus,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeType {
    #[default]
    StreetIntersection,
    /// A transit stop servicing multiple lines; schedule lookups happen here.
    MultiUseTransitStop,
    Parking,
    BikeShare,
}

/// A one-way edge of the routing graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectedEdge {
    /// Node this edge leads to, possibly in another tile or level.
    pub endnode: GraphId,
    /// Length in meters.
    pub length: f64,
    /// Offset of the shared [`EdgeInfo`] within the owning tile.
    pub edgeinfo_offset: u32,
    /// Index of the opposing edge among the edges leaving `endnode`.
    pub opp_index: u32,
    /// Does the shape run in this edge's travel direction?
    pub forward: bool,
    pub shortcut: bool,
    /// Hierarchy transition markers; a transition edge links the same node
    /// across levels at zero cost.
    pub trans_up: bool,
    pub trans_down: bool,
    pub edge_use: EdgeUse,
    /// Schedule line id, nonzero only on transit-line edges.
    pub lineid: u32,
    /// Index of this edge among the edges leaving its start node.
    pub localedgeidx: u32,
    pub forwardaccess: u32,
    pub reverseaccess: u32,
}

impl DirectedEdge {
    pub fn is_transition(&self) -> bool {
        self.trans_up || self.trans_down
    }

    pub fn is_transit_line(&self) -> bool {
        matches!(self.edge_use, EdgeUse::Rail | EdgeUse::Bus)
    }
}

/// Node within a tile. The forward-star layout means a node is a latlng plus
/// a run of directed edges starting at `edge_index`.
#[derive(Debug, Clone, Copy)]
pub struct NodeInfo {
    pub latlng: Point<f64>,
    pub edge_index: u32,
    pub edge_count: u32,
    pub access: u32,
    pub node_type: NodeType,
    /// UTC offset of the node's timezone in seconds.
    pub timezone_offset: i32,
}

/// Shape and attributes shared by the two opposing directed edges.
#[derive(Debug, Clone)]
pub struct EdgeInfo {
    /// Polyline in the forward direction of the `forward` edge.
    pub shape: LineString<f64>,
}

impl EdgeInfo {
    pub fn new(shape: LineString<f64>) -> Self {
        Self { shape }
    }

    pub fn shape_points(&self) -> Vec<Point<f64>> {
        self.shape.points().collect()
    }

    /// One point at a time, without materializing the whole shape.
    pub fn lazy_shape(&self) -> impl Iterator<Item = Point<f64>> + '_ {
        self.shape.points()
    }
}

/// A scheduled departure along a transit line edge.
#[derive(Debug, Clone)]
pub struct TransitDeparture {
    pub lineid: u32,
    pub tripid: u32,
    pub routeid: u32,
    /// Block id groups trips a rider may stay seated through; zero means no
    /// block.
    pub blockid: u32,
    /// Seconds from midnight, local to the stop.
    pub departure_time: u32,
    /// Seconds to traverse the edge.
    pub elapsed_time: u32,
    /// Service-day bitset counted from the tile creation date.
    pub days: u64,
    /// Day-of-week bitmask, Sunday = bit 0.
    pub dow_mask: u8,
    pub wheelchair_accessible: bool,
    pub bicycle_accessible: bool,
}

/// Route metadata needed to detect operator changes.
#[derive(Debug, Clone)]
pub struct TransitRoute {
    pub routeid: u32,
    /// Onestop id of the operator running the route.
    pub op_by_onestop_id: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct GraphTileHeader {
    pub graph_id: GraphId,
    /// Days from the pivot date when the tile was built; schedule day
    /// bitsets are counted from here.
    pub date_created: u32,
}

/// One tile of the routing graph.
#[derive(Debug, Clone)]
pub struct GraphTile {
    pub header: GraphTileHeader,
    pub nodes: Vec<NodeInfo>,
    pub directededges: Vec<DirectedEdge>,
    pub edge_infos: Vec<Arc<EdgeInfo>>,
    /// `BIN_COUNT` bins of edge ids whose geometry passes through them. The
    /// listed edges may belong to other tiles and levels.
    pub bins: Vec<Vec<GraphId>>,
    pub departures: Vec<TransitDeparture>,
    pub transit_routes: Vec<TransitRoute>,
}

impl GraphTile {
    pub fn new(graph_id: GraphId, date_created: u32) -> Self {
        Self {
            header: GraphTileHeader { graph_id, date_created },
            nodes: Vec::new(),
            directededges: Vec::new(),
            edge_infos: Vec::new(),
            bins: vec![Vec::new(); BIN_COUNT as usize],
            departures: Vec::new(),
            transit_routes: Vec::new(),
        }
    }

    pub fn id(&self) -> GraphId {
        self.header.graph_id
    }

    /// Node by full graph id; the id must belong to this tile.
    pub fn node(&self, id: GraphId) -> Option<&NodeInfo> {
        debug_assert_eq!(id.tile_base(), self.id().tile_base());
        self.nodes.get(id.index() as usize)
    }

    /// Directed edge by full graph id; the id must belong to this tile.
    pub fn directededge(&self, id: GraphId) -> Option<&DirectedEdge> {
        debug_assert_eq!(id.tile_base(), self.id().tile_base());
        self.directededges.get(id.index() as usize)
    }

    pub fn directededge_at(&self, index: u32) -> Option<&DirectedEdge> {
        self.directededges.get(index as usize)
    }

    /// Shared shape payload for an edge. Cheap to clone out of the tile.
    pub fn edgeinfo(&self, offset: u32) -> Arc<EdgeInfo> {
        Arc::clone(&self.edge_infos[offset as usize])
    }

    pub fn bin(&self, index: u8) -> &[GraphId] {
        &self.bins[index as usize]
    }

    pub fn transit_route(&self, routeid: u32) -> Option<&TransitRoute> {
        self.transit_routes.iter().find(|r| r.routeid == routeid)
    }

    /// Earliest departure on `lineid` at or after `after` seconds from
    /// midnight, honoring the service calendar and accessibility filters.
    ///
    /// When the requested date predates the tile (`date_before_tile`), the
    /// day bitset cannot be consulted and only the day-of-week mask is
    /// checked.
    #[allow(clippy::too_many_arguments)]
    pub fn next_departure(
        &self,
        lineid: u32,
        after: u32,
        day: u32,
        dow_mask: u8,
        date_before_tile: bool,
        wheelchair: bool,
        bicycle: bool,
    ) -> Option<&TransitDeparture> {
        self.departures
            .iter()
            .filter(|d| {
                d.lineid == lineid
                    && d.departure_time >= after
                    && d.dow_mask & dow_mask != 0
                    && (date_before_tile || (day < 64 && d.days & (1 << day) != 0))
                    && (!wheelchair || d.wheelchair_accessible)
                    && (!bicycle || d.bicycle_accessible)
            })
            .min_by_key(|d| d.departure_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn departure(lineid: u32, departure_time: u32) -> TransitDeparture {
        TransitDeparture {
            lineid,
            tripid: 1,
            routeid: 1,
            blockid: 0,
            departure_time,
            elapsed_time: 60,
            days: u64::MAX,
            dow_mask: 0x7f,
            wheelchair_accessible: true,
            bicycle_accessible: false,
        }
    }

    #[test]
    fn next_departure_picks_earliest_at_or_after() {
        let mut tile = GraphTile::new(GraphId::new(0, 2, 0), 10);
        tile.departures.push(departure(7, 3600));
        tile.departures.push(departure(7, 1800));
        tile.departures.push(departure(8, 60));

        let dep = tile.next_departure(7, 1000, 0, 0x7f, false, false, false).unwrap();
        assert_eq!(dep.departure_time, 1800);
        assert!(tile.next_departure(7, 3601, 0, 0x7f, false, false, false).is_none());
    }

    #[test]
    fn next_departure_filters_service_days_and_access() {
        let mut tile = GraphTile::new(GraphId::new(0, 2, 0), 10);
        let mut dep = departure(7, 1800);
        dep.days = 0b1; // only the tile creation day
        dep.dow_mask = 0b10; // Mondays
        dep.bicycle_accessible = false;
        tile.departures.push(dep);

        assert!(tile.next_departure(7, 0, 0, 0b10, false, false, false).is_some());
        // Wrong service day.
        assert!(tile.next_departure(7, 0, 1, 0b10, false, false, false).is_none());
        // Date before tile ignores the day bitset.
        assert!(tile.next_departure(7, 0, 1, 0b10, true, false, false).is_some());
        // Wrong day of week.
        assert!(tile.next_departure(7, 0, 0, 0b100, false, false, false).is_none());
        // Bicycle not allowed on this trip.
        assert!(tile.next_departure(7, 0, 0, 0b10, false, false, true).is_none());
    }
}
