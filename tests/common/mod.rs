//! Shared test fixtures: an in-memory tile builder and simple cost models.
#![allow(dead_code)]

use geo::{LineString, Point};

use isovia::algo::EdgeLabel;
use isovia::costing::{Cost, DynamicCost, ModeCosting, TravelMode};
use isovia::geometry::{distance, resample_spherical_polyline};
use isovia::model::{
    DirectedEdge, EdgeInfo, EdgeUse, GraphId, GraphTile, NodeInfo, NodeType, StaticTileSet,
    TileHierarchy, TransitDeparture, TransitRoute, access,
};

use std::sync::Arc;

struct NodeSpec {
    point: Point<f64>,
    node_type: NodeType,
}

struct ConnectSpec {
    a: usize,
    b: usize,
    shape: Vec<Point<f64>>,
    edge_use: EdgeUse,
    lineid: u32,
    edge_access: u32,
}

/// Builds a single local-level tile from nodes and bidirectional
/// connections. All nodes must fall within one tile of the standard tiling.
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<NodeSpec>,
    connects: Vec<ConnectSpec>,
    departures: Vec<TransitDeparture>,
    routes: Vec<TransitRoute>,
    date_created: u32,
}

pub struct TestGraph {
    pub tiles: StaticTileSet,
    pub node_ids: Vec<GraphId>,
    /// Directed edge ids per connection: (a -> b, b -> a).
    pub edge_ids: Vec<(GraphId, GraphId)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&mut self, lng: f64, lat: f64) -> usize {
        self.nodes.push(NodeSpec {
            point: Point::new(lng, lat),
            node_type: NodeType::StreetIntersection,
        });
        self.nodes.len() - 1
    }

    pub fn stop(&mut self, lng: f64, lat: f64) -> usize {
        let n = self.node(lng, lat);
        self.nodes[n].node_type = NodeType::MultiUseTransitStop;
        n
    }

    /// Straight road between two nodes, both directions, open to everyone.
    pub fn connect(&mut self, a: usize, b: usize) -> usize {
        self.connect_with(a, b, EdgeUse::Road, 0, access::ALL)
    }

    pub fn connect_with(
        &mut self,
        a: usize,
        b: usize,
        edge_use: EdgeUse,
        lineid: u32,
        edge_access: u32,
    ) -> usize {
        self.connects.push(ConnectSpec {
            a,
            b,
            shape: vec![self.nodes[a].point, self.nodes[b].point],
            edge_use,
            lineid,
            edge_access,
        });
        self.connects.len() - 1
    }

    pub fn departure(&mut self, lineid: u32, routeid: u32, departure_time: u32, elapsed_time: u32) {
        self.departures.push(TransitDeparture {
            lineid,
            tripid: self.departures.len() as u32 + 1,
            routeid,
            blockid: 0,
            departure_time,
            elapsed_time,
            days: u64::MAX,
            dow_mask: 0x7f,
            wheelchair_accessible: true,
            bicycle_accessible: true,
        });
    }

    pub fn route(&mut self, routeid: u32, operator: &str) {
        self.routes.push(TransitRoute {
            routeid,
            op_by_onestop_id: Some(operator.to_string()),
        });
    }

    pub fn build(self) -> TestGraph {
        let hierarchy = TileHierarchy::standard();
        let level = hierarchy.local().level;
        let tiling = hierarchy.local().tiling;
        let tileid = tiling.tile_index(self.nodes[0].point);
        let tile_base = GraphId::new(tileid, level, 0);

        // Forward-star layout: group directed edges by their start node in
        // connection order.
        let mut per_node: Vec<Vec<(usize, bool)>> = vec![Vec::new(); self.nodes.len()];
        for (c, connect) in self.connects.iter().enumerate() {
            per_node[connect.a].push((c, true));
            per_node[connect.b].push((c, false));
        }

        let position_at = |node: usize, connect: usize, forward: bool| -> u32 {
            per_node[node]
                .iter()
                .position(|&(c, f)| c == connect && f == forward)
                .expect("opposing edge exists") as u32
        };

        let mut tile = GraphTile::new(tile_base, self.date_created);
        let mut node_ids = Vec::with_capacity(self.nodes.len());
        let mut edge_index = 0u32;
        let mut edge_id_of = vec![(GraphId::INVALID, GraphId::INVALID); self.connects.len()];

        for (n, spec) in self.nodes.iter().enumerate() {
            node_ids.push(tile_base.with_index(n as u32));
            tile.nodes.push(NodeInfo {
                latlng: spec.point,
                edge_index,
                edge_count: per_node[n].len() as u32,
                access: access::ALL,
                node_type: spec.node_type,
                timezone_offset: 0,
            });

            for (local, &(c, forward)) in per_node[n].iter().enumerate() {
                let connect = &self.connects[c];
                let to = if forward { connect.b } else { connect.a };
                let id = tile_base.with_index(edge_index + local as u32);
                if forward {
                    edge_id_of[c].0 = id;
                } else {
                    edge_id_of[c].1 = id;
                }
                tile.directededges.push(DirectedEdge {
                    endnode: tile_base.with_index(to as u32),
                    length: polyline_length(&connect.shape),
                    edgeinfo_offset: c as u32,
                    opp_index: position_at(to, c, !forward),
                    forward,
                    shortcut: false,
                    trans_up: false,
                    trans_down: false,
                    edge_use: connect.edge_use,
                    lineid: connect.lineid,
                    localedgeidx: local as u32,
                    forwardaccess: connect.edge_access,
                    reverseaccess: connect.edge_access,
                });
            }
            edge_index += per_node[n].len() as u32;
        }

        for connect in &self.connects {
            tile.edge_infos
                .push(Arc::new(EdgeInfo::new(LineString::from_iter(
                    connect.shape.iter().map(|p| (p.x(), p.y())),
                ))));
        }

        // Bin the forward edge of every connection by sampling its shape;
        // the scan reaches the twin through the opposing-edge lookup.
        for (c, connect) in self.connects.iter().enumerate() {
            let mut bins_hit = Vec::new();
            for point in resample_spherical_polyline(&connect.shape, 25.0) {
                let (t, bin) = tiling.tile_and_bin(point);
                if t == tileid && !bins_hit.contains(&bin) {
                    bins_hit.push(bin);
                }
            }
            for bin in bins_hit {
                tile.bins[bin as usize].push(edge_id_of[c].0);
            }
        }

        tile.departures = self.departures;
        tile.transit_routes = self.routes;

        let mut tiles = StaticTileSet::new();
        tiles.insert(tile);
        TestGraph {
            tiles,
            node_ids,
            edge_ids: edge_id_of,
        }
    }
}

fn polyline_length(shape: &[Point<f64>]) -> f64 {
    shape.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Flat-speed road costing for one mode.
pub struct RoadCosting {
    mode: TravelMode,
    access_mask: u32,
    /// Meters per second.
    speed: f64,
}

impl DynamicCost for RoadCosting {
    fn travel_mode(&self) -> TravelMode {
        self.mode
    }

    fn access_mode(&self) -> u32 {
        self.access_mask
    }

    fn allowed(
        &self,
        edge: &DirectedEdge,
        _pred: &EdgeLabel,
        _tile: &GraphTile,
        _edge_id: GraphId,
    ) -> bool {
        !edge.is_transit_line() && edge.forwardaccess & self.access_mask != 0
    }

    fn allowed_reverse(
        &self,
        edge: &DirectedEdge,
        _pred: &EdgeLabel,
        opp_edge: &DirectedEdge,
        _tile: &GraphTile,
        _edge_id: GraphId,
    ) -> bool {
        !edge.is_transit_line() && opp_edge.forwardaccess & self.access_mask != 0
    }

    fn edge_cost(&self, edge: &DirectedEdge) -> Cost {
        let secs = (edge.length / self.speed) as f32;
        Cost::new(secs, secs)
    }
}

/// Transit costing: rides transit lines, charges the wait plus the ride.
pub struct TransitCosting;

impl DynamicCost for TransitCosting {
    fn travel_mode(&self) -> TravelMode {
        TravelMode::PublicTransit
    }

    fn access_mode(&self) -> u32 {
        access::BUS
    }

    fn allowed(
        &self,
        edge: &DirectedEdge,
        _pred: &EdgeLabel,
        _tile: &GraphTile,
        _edge_id: GraphId,
    ) -> bool {
        edge.is_transit_line()
    }

    fn allowed_reverse(
        &self,
        _edge: &DirectedEdge,
        _pred: &EdgeLabel,
        _opp_edge: &DirectedEdge,
        _tile: &GraphTile,
        _edge_id: GraphId,
    ) -> bool {
        false
    }

    fn edge_cost(&self, edge: &DirectedEdge) -> Cost {
        let secs = (edge.length / 10.0) as f32;
        Cost::new(secs, secs)
    }

    fn transfer_cost(&self) -> Cost {
        Cost::new(15.0, 15.0)
    }
}

pub fn pedestrian() -> RoadCosting {
    RoadCosting {
        mode: TravelMode::Pedestrian,
        access_mask: access::PEDESTRIAN,
        speed: 5000.0 / 3600.0,
    }
}

pub fn bicycle() -> RoadCosting {
    RoadCosting {
        mode: TravelMode::Bicycle,
        access_mask: access::BICYCLE,
        speed: 20_000.0 / 3600.0,
    }
}

pub fn drive() -> RoadCosting {
    RoadCosting {
        mode: TravelMode::Drive,
        access_mask: access::AUTO,
        speed: 70_000.0 / 3600.0,
    }
}

pub fn mode_costing() -> ModeCosting {
    [
        Box::new(pedestrian()),
        Box::new(bicycle()),
        Box::new(drive()),
        Box::new(TransitCosting),
    ]
}

/// Edge filter admitting everything a pedestrian may use.
pub fn pedestrian_filter(edge: &DirectedEdge) -> f64 {
    if !edge.is_transit_line() && edge.forwardaccess & access::PEDESTRIAN != 0 {
        1.0
    } else {
        0.0
    }
}

/// Node filter that rejects nothing.
pub fn open_node_filter(_node: &NodeInfo) -> bool {
    false
}
