//! Time-bounded expansion over the routing graph.
//!
//! From one or more correlated locations, edges are settled in increasing
//! cost order until the time budget runs out; every settled edge rasterizes
//! its shape onto the isotile grid. Three expansions are provided: forward
//! (reachable-from-origin), reverse (can-reach-destination), and multimodal
//! (pedestrian plus scheduled transit). The populated grid is handed to an
//! external contour generator.

use std::sync::Arc;

use geo::{Point, Rect, coord};
use hashbrown::{HashMap, HashSet};
use log::{debug, error};
use rayon::prelude::*;
use serde::Deserialize;

use super::bucket_queue::DoubleBucketQueue;
use super::edge_label::{EdgeLabel, INVALID_LABEL};
use super::edge_status::{EdgeSet, EdgeStatus};
use super::gridded::GriddedData;
use crate::costing::{Cost, DynamicCost, ModeCosting, TravelMode};
use crate::datetime;
use crate::geometry::{METERS_PER_DEGREE_LAT, meters_per_lng_degree, resample_spherical_polyline};
use crate::model::{EdgeUse, GraphReader, GraphTile, NodeType, PathLocation};

/// Buckets in the expansion queue; the range is this times the costing's
/// unit size.
pub const BUCKET_COUNT: u32 = 20_000;
/// Label storage reserved up front; expansions over metro areas reach
/// hundreds of thousands of labels.
pub const INITIAL_EDGE_LABEL_COUNT: usize = 500_000;

const SECS_TO_MINUTES: f32 = 1.0 / 60.0;
const MPH_TO_MPS: f64 = 0.44704;
/// Extra seconds granted when an in-station transfer just misses a
/// departure.
const TRANSFER_RETRY_SECS: u32 = 30;

/// Knobs of the multimodal expansion the original engines hard-code.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IsochroneConfig {
    /// Penalty in cost units for boarding a vehicle of a different operator
    /// than the one ridden before.
    pub operator_change_penalty: f32,
    /// Cost of a travel-mode change. The wait for the departure already
    /// absorbs the switch, so this defaults to zero.
    pub mode_change_cost: Cost,
    /// Maximum walking distance in meters between transit stops.
    pub max_transfer_distance: f64,
}

impl Default for IsochroneConfig {
    fn default() -> Self {
        Self {
            operator_change_penalty: 300.0,
            mode_change_cost: Cost::default(),
            max_transfer_distance: 99_999.0,
        }
    }
}

/// The expansion engine. All state is reset at the start of each
/// `compute*` call; the instance is reusable across calls.
pub struct Isochrone {
    config: IsochroneConfig,
    access_mode: u32,
    tile_creation_date: u32,
    shape_interval: f64,
    mode: TravelMode,
    edgelabels: Vec<EdgeLabel>,
    adjacency: DoubleBucketQueue,
    edgestatus: EdgeStatus,
    isotile: GriddedData,
}

impl Default for Isochrone {
    fn default() -> Self {
        Self::new()
    }
}

impl Isochrone {
    pub fn new() -> Self {
        Self::with_config(IsochroneConfig::default())
    }

    pub fn with_config(config: IsochroneConfig) -> Self {
        Self {
            config,
            access_mode: crate::model::access::AUTO,
            tile_creation_date: 0,
            shape_interval: 50.0,
            mode: TravelMode::Drive,
            edgelabels: Vec::new(),
            adjacency: DoubleBucketQueue::default(),
            edgestatus: EdgeStatus::new(),
            isotile: GriddedData::default(),
        }
    }

    /// Drop the temporary state of the last computation.
    pub fn clear(&mut self) {
        self.edgelabels.clear();
        self.adjacency.clear();
        self.edgestatus.clear();
    }

    /// Creation date of the tile the last computation was seeded from.
    pub fn tile_creation_date(&self) -> u32 {
        self.tile_creation_date
    }

    fn initialize(&mut self, bucket_size: f32) {
        self.edgelabels = Vec::with_capacity(INITIAL_EDGE_LABEL_COUNT);
        let range = BUCKET_COUNT as f32 * bucket_size;
        self.adjacency = DoubleBucketQueue::new(0.0, range, bucket_size);
        self.edgestatus = EdgeStatus::new();
    }

    /// Size the isotile from the travel mode: cell size in meters and an
    /// estimated top speed bound the reachable area around the seeds.
    fn construct_isotile(&mut self, multimodal: bool, max_minutes: u32, locations: &[PathLocation]) {
        let max_seconds = max_minutes * 60;
        let (grid_size, speed_mph) = if multimodal {
            (200.0, 70.0)
        } else {
            match self.mode {
                TravelMode::Pedestrian => (200.0, 5.0),
                TravelMode::Bicycle => (200.0, 20.0),
                _ => (400.0, 70.0),
            }
        };
        self.shape_interval = grid_size * 0.25;

        let Some(first) = locations.first() else {
            self.isotile = GriddedData::default();
            return;
        };
        let max_distance = f64::from(max_seconds) * speed_mph * MPH_TO_MPS;
        let dlat = max_distance / METERS_PER_DEGREE_LAT;
        let dlon = max_distance / meters_per_lng_degree(first.latlng().y());

        let mut min = first.latlng();
        let mut max = first.latlng();
        for loc in locations {
            let c = loc.latlng();
            min = Point::new(min.x().min(c.x() - dlon), min.y().min(c.y() - dlat));
            max = Point::new(max.x().max(c.x() + dlon), max.y().max(c.y() + dlat));
        }
        let bounds = Rect::new(
            coord! { x: min.x(), y: min.y() },
            coord! { x: max.x(), y: max.y() },
        );
        self.isotile = GriddedData::new(
            bounds,
            grid_size / METERS_PER_DEGREE_LAT,
            (max_minutes + 5) as f32,
        );
    }

    fn pop_next(&mut self) -> Option<u32> {
        let labels = &self.edgelabels;
        self.adjacency.pop(|l| labels[l as usize].sortcost)
    }

    fn take_isotile(&mut self) -> Arc<GriddedData> {
        Arc::new(std::mem::take(&mut self.isotile))
    }

    /// Forward expansion: everything reachable from the origins within
    /// `max_minutes`.
    pub fn compute<R: GraphReader>(
        &mut self,
        origins: &mut [PathLocation],
        max_minutes: u32,
        reader: &R,
        mode_costing: &ModeCosting,
        mode: TravelMode,
    ) -> Arc<GriddedData> {
        self.mode = mode;
        let costing = &mode_costing[mode.index()];
        let max_seconds = (max_minutes * 60) as f32;

        self.initialize(costing.unit_size());
        self.construct_isotile(false, max_minutes, origins);
        self.set_origin_locations(reader, origins, costing.as_ref());

        let mut n = 0u64;
        loop {
            let Some(predindex) = self.pop_next() else {
                return self.take_isotile();
            };

            let pred = self.edgelabels[predindex as usize];
            self.edgestatus.update(pred.edgeid, EdgeSet::Permanent);

            // Tiles can be missing with regional extracts; drop the branch.
            let Some(tile) = reader.graph_tile(pred.endnode.tile_base()) else {
                continue;
            };
            let Some(node) = tile.node(pred.endnode).copied() else {
                continue;
            };
            self.update_isotile(&pred, reader);
            n += 1;

            if pred.cost.secs > max_seconds {
                debug!("Exceeded max time interval: n = {n}");
                return self.take_isotile();
            }
            if !costing.allowed_at_node(&node) {
                continue;
            }

            for i in 0..node.edge_count {
                let idx = node.edge_index + i;
                let Some(edge) = tile.directededge_at(idx).copied() else {
                    break;
                };
                let edgeid = pred.endnode.with_index(idx);
                if edge.shortcut {
                    continue;
                }
                let status = self.edgestatus.get(edgeid);
                if status.set == EdgeSet::Permanent {
                    continue;
                }

                // Transition edges go on the queue with the predecessor's
                // sort cost; the level switch itself is free.
                if edge.is_transition() {
                    let next = self.edgelabels.len() as u32;
                    self.adjacency.add(next, pred.sortcost);
                    self.edgestatus.set(edgeid, EdgeSet::Temporary, next);
                    self.edgelabels
                        .push(EdgeLabel::new_transition(predindex, edgeid, edge.endnode, &pred));
                    continue;
                }

                if !costing.allowed(&edge, &pred, &tile, edgeid)
                    || costing.restricted(&edge, &pred, &self.edgelabels, &tile, edgeid, true)
                {
                    continue;
                }

                let newcost = pred.cost
                    + costing.edge_cost(&edge)
                    + costing.transition_cost(&edge, &node, &pred);

                if status.set == EdgeSet::Temporary {
                    self.check_if_lower_cost_path(status.index, predindex, newcost);
                    continue;
                }

                let next = self.edgelabels.len() as u32;
                self.adjacency.add(next, newcost.cost);
                self.edgestatus.set(edgeid, EdgeSet::Temporary, next);
                self.edgelabels.push(EdgeLabel {
                    predecessor: predindex,
                    edgeid,
                    endnode: edge.endnode,
                    cost: newcost,
                    sortcost: newcost.cost,
                    mode: self.mode,
                    edge_use: edge.edge_use,
                    ..Default::default()
                });
            }
        }
    }

    /// Reverse expansion: everything that can reach the destinations within
    /// `max_minutes`. The walk follows edges in the network direction but
    /// charges costs on the opposing edges.
    pub fn compute_reverse<R: GraphReader>(
        &mut self,
        destinations: &mut [PathLocation],
        max_minutes: u32,
        reader: &R,
        mode_costing: &ModeCosting,
        mode: TravelMode,
    ) -> Arc<GriddedData> {
        self.mode = mode;
        let costing = &mode_costing[mode.index()];
        self.access_mode = costing.access_mode();
        let max_seconds = (max_minutes * 60) as f32;

        self.initialize(costing.unit_size());
        self.construct_isotile(false, max_minutes, destinations);
        self.set_destination_locations(reader, destinations, costing.as_ref());

        loop {
            let Some(predindex) = self.pop_next() else {
                return self.take_isotile();
            };

            let pred = self.edgelabels[predindex as usize];
            self.edgestatus.update(pred.edgeid, EdgeSet::Permanent);

            let Some(tile) = reader.graph_tile(pred.endnode.tile_base()) else {
                continue;
            };
            let Some(node) = tile.node(pred.endnode).copied() else {
                continue;
            };
            self.update_isotile(&pred, reader);

            if pred.cost.secs > max_seconds {
                debug!("Exceeded max time interval");
                return self.take_isotile();
            }
            if !costing.allowed_at_node(&node) {
                continue;
            }

            // The transition-cost model needs the edge opposing the
            // predecessor, which may live in another tile.
            let opp_pred_edge = if pred.opp_edgeid.tile_base() == tile.id().tile_base() {
                tile.directededge(pred.opp_edgeid).copied()
            } else {
                reader
                    .graph_tile(pred.opp_edgeid.tile_base())
                    .and_then(|t| t.directededge(pred.opp_edgeid).copied())
            };
            let Some(opp_pred_edge) = opp_pred_edge else {
                continue;
            };

            for i in 0..node.edge_count {
                let idx = node.edge_index + i;
                let Some(edge) = tile.directededge_at(idx).copied() else {
                    break;
                };
                let edgeid = pred.endnode.with_index(idx);

                // Early rejection on the reverse access mask saves the
                // opposing-edge lookup.
                if edge.reverseaccess & self.access_mode == 0 || edge.shortcut {
                    continue;
                }
                let status = self.edgestatus.get(edgeid);
                if status.set == EdgeSet::Permanent {
                    continue;
                }

                if edge.is_transition() {
                    let next = self.edgelabels.len() as u32;
                    self.adjacency.add(next, pred.sortcost);
                    self.edgestatus.set(edgeid, EdgeSet::Temporary, next);
                    self.edgelabels
                        .push(EdgeLabel::new_transition(predindex, edgeid, edge.endnode, &pred));
                    continue;
                }

                let end_tile = if edge.endnode.tile_base() == tile.id().tile_base() {
                    Some(Arc::clone(&tile))
                } else {
                    reader.graph_tile(edge.endnode.tile_base())
                };
                let Some(end_tile) = end_tile else {
                    continue;
                };
                let Some(end_node) = end_tile.node(edge.endnode) else {
                    continue;
                };
                let opp_edgeid = edge.endnode.with_index(end_node.edge_index + edge.opp_index);
                let Some(opp_edge) = end_tile.directededge(opp_edgeid).copied() else {
                    continue;
                };

                if !costing.allowed_reverse(&edge, &pred, &opp_edge, &tile, edgeid)
                    || costing.restricted(&edge, &pred, &self.edgelabels, &tile, edgeid, false)
                {
                    continue;
                }

                let tc =
                    costing.transition_cost_reverse(edge.localedgeidx, &node, &opp_edge, &opp_pred_edge);
                let mut newcost = pred.cost + costing.edge_cost(&opp_edge);
                newcost.cost += tc.cost;

                if status.set == EdgeSet::Temporary {
                    self.check_if_lower_cost_path(status.index, predindex, newcost);
                    continue;
                }

                let next = self.edgelabels.len() as u32;
                self.adjacency.add(next, newcost.cost);
                self.edgestatus.set(edgeid, EdgeSet::Temporary, next);
                self.edgelabels.push(EdgeLabel {
                    predecessor: predindex,
                    edgeid,
                    opp_edgeid,
                    endnode: edge.endnode,
                    cost: newcost,
                    sortcost: newcost.cost,
                    transition_cost: tc,
                    mode: self.mode,
                    edge_use: edge.edge_use,
                    ..Default::default()
                });
            }
        }
    }

    /// Multimodal expansion: pedestrian plus scheduled public transit.
    /// Requires a `date_time` on the first origin; without one an empty grid
    /// is returned and an error is logged.
    pub fn compute_multimodal<R: GraphReader>(
        &mut self,
        origins: &mut [PathLocation],
        max_minutes: u32,
        reader: &R,
        mode_costing: &ModeCosting,
        mode: TravelMode,
    ) -> Arc<GriddedData> {
        // Pedestrian legs connect to transit; switch the model into its
        // multimodal regime for this call.
        let pc = &mode_costing[TravelMode::Pedestrian.index()];
        pc.set_allow_transit_connections(true);
        pc.use_max_multimodal_distance();

        self.mode = mode;
        let costing = &mode_costing[mode.index()];
        let tc = &mode_costing[TravelMode::PublicTransit.index()];
        let wheelchair = tc.wheelchair();
        let bicycle = tc.bicycle();
        let max_transfer_distance = self.config.max_transfer_distance;
        let max_seconds = (max_minutes * 60) as f32;

        self.initialize(costing.unit_size());
        self.construct_isotile(true, max_minutes, origins);

        if origins
            .first()
            .and_then(|o| o.location.date_time.as_deref())
            .is_none()
        {
            error!("No date time set on the origin location");
            return self.take_isotile();
        }

        self.set_origin_locations(reader, origins, costing.as_ref());

        // Seeding resolves "current" to the origin timezone, so read the
        // date back only now.
        let date_time = origins[0].location.date_time.clone().unwrap_or_default();
        let (start_time, date, dow) = match (
            datetime::seconds_from_midnight(&date_time),
            datetime::days_from_pivot_date(&date_time),
            datetime::day_of_week_mask(&date_time),
        ) {
            (Ok(s), Ok(d), Ok(w)) => (s, d, w),
            _ => {
                error!("Invalid date time on the origin location: {date_time}");
                return self.take_isotile();
            }
        };

        let mut day = 0u32;
        let mut date_set = false;
        let mut date_before_tile = false;
        let mut operators: HashMap<String, u32> = HashMap::new();
        let mut processed_tiles: HashSet<u32> = HashSet::new();

        loop {
            let Some(predindex) = self.pop_next() else {
                return self.take_isotile();
            };

            let pred = self.edgelabels[predindex as usize];
            self.edgestatus.update(pred.edgeid, EdgeSet::Permanent);

            let Some(tile) = reader.graph_tile(pred.endnode.tile_base()) else {
                continue;
            };
            let Some(node) = tile.node(pred.endnode).copied() else {
                continue;
            };
            self.update_isotile(&pred, reader);

            if pred.cost.secs > max_seconds {
                debug!("Exceeded max time interval");
                return self.take_isotile();
            }
            if !costing.allowed_at_node(&node) {
                continue;
            }

            let mut localtime = start_time + pred.cost.secs as u32;
            let mut transfer_cost = tc.default_transfer_cost();
            let has_transit = pred.has_transit;
            let mut prior_stop = pred.prior_stopid;

            if node.node_type == NodeType::MultiUseTransitStop {
                // Changing vehicles at a stop costs the real transfer
                // penalty once transit has been ridden.
                if pred.mode == TravelMode::Pedestrian && prior_stop.is_valid() && has_transit {
                    transfer_cost = tc.transfer_cost();
                }

                if processed_tiles.insert(tile.id().tileid()) {
                    tc.add_to_exclude_list(&tile);
                }
                if tc.is_excluded_node(&tile, &node) {
                    continue;
                }

                // Entering the stop on foot costs the transfer time on top
                // of the walk.
                if pred.mode == TravelMode::Pedestrian {
                    localtime += transfer_cost.secs as u32;
                }

                prior_stop = pred.endnode;

                // The service-day window is anchored at the schedule tile's
                // creation date, established at the first settled stop.
                if !date_set {
                    let date_created = tile.header.date_created;
                    if date < date_created {
                        date_before_tile = true;
                    } else {
                        day = date - date_created;
                    }
                    date_set = true;
                }
            }

            for i in 0..node.edge_count {
                let idx = node.edge_index + i;
                let Some(edge) = tile.directededge_at(idx).copied() else {
                    break;
                };
                let edgeid = pred.endnode.with_index(idx);
                if edge.shortcut {
                    continue;
                }
                let status = self.edgestatus.get(edgeid);
                if status.set == EdgeSet::Permanent {
                    continue;
                }

                if edge.is_transition() {
                    let next = self.edgelabels.len() as u32;
                    self.adjacency.add(next, pred.sortcost);
                    self.edgestatus.set(edgeid, EdgeSet::Temporary, next);
                    self.edgelabels
                        .push(EdgeLabel::new_transition(predindex, edgeid, edge.endnode, &pred));
                    continue;
                }

                let mut newcost = pred.cost;
                let mut walking_distance = pred.path_distance;
                let mut edge_mode = pred.mode;
                let mut mode_change = false;
                let mut operator_id = pred.transit_operator;
                let mut edge_has_transit = has_transit;
                let mut tripid = 0u32;
                let mut blockid = 0u32;

                if edge.is_transit_line() {
                    if !tc.allowed(&edge, &pred, &tile, edgeid) {
                        continue;
                    }
                    if tc.is_excluded_edge(&tile, &edge) {
                        continue;
                    }

                    let Some(mut departure) = tile.next_departure(
                        edge.lineid,
                        localtime,
                        day,
                        dow,
                        date_before_tile,
                        wheelchair,
                        bicycle,
                    ) else {
                        continue;
                    };

                    mode_change = edge_mode == TravelMode::Pedestrian;
                    tripid = departure.tripid;
                    blockid = departure.blockid;
                    edge_has_transit = true;

                    if tripid == pred.tripid || (blockid != 0 && blockid == pred.blockid) {
                        // Staying on the same trip or block is free; the
                        // operator carries over.
                        operator_id = pred.transit_operator;
                    } else {
                        if pred.tripid > 0 && localtime + TRANSFER_RETRY_SECS > departure.departure_time
                        {
                            // In-station transfer that just misses the
                            // vehicle; try again with the transfer slack.
                            match tile.next_departure(
                                edge.lineid,
                                localtime + TRANSFER_RETRY_SECS,
                                day,
                                dow,
                                date_before_tile,
                                wheelchair,
                                bicycle,
                            ) {
                                Some(later) => {
                                    departure = later;
                                    tripid = departure.tripid;
                                    blockid = departure.blockid;
                                }
                                None => continue,
                            }
                        }

                        operator_id = operator_id_for_route(&tile, departure.routeid, &mut operators);
                        newcost.cost += transfer_cost.cost;
                        if pred.transit_operator > 0 && pred.transit_operator != operator_id {
                            newcost.cost += self.config.operator_change_penalty;
                        }
                    }

                    edge_mode = TravelMode::PublicTransit;
                    newcost += tc.transit_edge_cost(&edge, departure, localtime);
                } else {
                    if edge_mode == TravelMode::PublicTransit {
                        // Disembark: back on foot with a fresh walking
                        // budget.
                        edge_mode = TravelMode::Pedestrian;
                        walking_distance = 0.0;
                        mode_change = true;
                    }

                    let mc = &mode_costing[edge_mode.index()];
                    if !mc.allowed(&edge, &pred, &tile, edgeid) {
                        continue;
                    }
                    let mut c = mc.edge_cost(&edge);
                    c.cost *= mc.mode_weight();
                    newcost += c;

                    if edge_mode == TravelMode::Pedestrian {
                        walking_distance += edge.length;

                        // Entering and leaving a station without boarding
                        // anything is not a path.
                        if node.node_type == NodeType::MultiUseTransitStop
                            && pred.edge_use == EdgeUse::TransitConnection
                            && edge.edge_use == EdgeUse::TransitConnection
                        {
                            continue;
                        }
                    }
                }

                if mode_change {
                    newcost += self.config.mode_change_cost;
                } else {
                    newcost += mode_costing[edge_mode.index()].transition_cost(&edge, &node, &pred);
                }

                // Re-entering the station just left.
                if edge.edge_use == EdgeUse::TransitConnection && edge.endnode == pred.prior_stopid {
                    continue;
                }
                if edge.edge_use == EdgeUse::TransitConnection
                    && pred.prior_stopid.is_valid()
                    && walking_distance > max_transfer_distance
                {
                    continue;
                }

                // This line overruns the budget, but siblings at this node
                // may still fit.
                if newcost.secs > max_seconds {
                    continue;
                }

                if status.set == EdgeSet::Temporary {
                    let idx = status.index as usize;
                    let dc = self.edgelabels[idx].cost.cost - newcost.cost;
                    if dc > 0.0 {
                        let oldsortcost = self.edgelabels[idx].sortcost;
                        let newsortcost = oldsortcost - dc;
                        self.edgelabels[idx].update_multimodal(
                            predindex,
                            newcost,
                            newsortcost,
                            walking_distance,
                            tripid,
                            blockid,
                        );
                        self.adjacency.decrease(status.index, newsortcost, oldsortcost);
                    }
                    continue;
                }

                let next = self.edgelabels.len() as u32;
                self.adjacency.add(next, newcost.cost);
                self.edgestatus.set(edgeid, EdgeSet::Temporary, next);
                self.edgelabels.push(EdgeLabel {
                    predecessor: predindex,
                    edgeid,
                    endnode: edge.endnode,
                    cost: newcost,
                    sortcost: newcost.cost,
                    mode: edge_mode,
                    path_distance: walking_distance,
                    tripid,
                    prior_stopid: prior_stop,
                    blockid,
                    transit_operator: operator_id,
                    has_transit: edge_has_transit,
                    edge_use: edge.edge_use,
                    ..Default::default()
                });
            }
        }
    }

    /// Rasterize the settled edge onto the isotile.
    ///
    /// Skipped when the opposing edge is already settled (its pass covered
    /// the same shape) and for transit lines, which are passed through, not
    /// reached.
    fn update_isotile<R: GraphReader>(&mut self, pred: &EdgeLabel, reader: &R) {
        if let Some((opp_id, _)) = reader.opposing_edge_id(pred.edgeid) {
            if self.edgestatus.get(opp_id).set == EdgeSet::Permanent {
                return;
            }
        }

        let Some(tile) = reader.graph_tile(pred.edgeid.tile_base()) else {
            return;
        };
        let Some(edge) = tile.directededge(pred.edgeid) else {
            return;
        };
        if edge.is_transit_line() || edge.is_transition() {
            return;
        }

        let secs1 = pred.cost.secs;
        let secs0 = if pred.predecessor == INVALID_LABEL {
            0.0
        } else {
            self.edgelabels[pred.predecessor as usize].cost.secs
        };

        let info = tile.edgeinfo(edge.edgeinfo_offset);
        let mut shape = info.shape_points();
        if !edge.forward {
            shape.reverse();
        }
        let resampled = resample_spherical_polyline(&shape, self.shape_interval);

        // Interpolate the time linearly along the resampled shape.
        let delta = if edge.length > 0.0 {
            self.shape_interval as f32 * (secs1 - secs0) / edge.length as f32
        } else {
            0.0
        };
        let mut secs = secs0;
        for w in resampled.windows(2) {
            secs += delta;
            let cells = self.isotile.intersect(w[0], w[1]);
            for cell in cells {
                self.isotile.set_if_less(cell, secs * SECS_TO_MINUTES);
            }
        }
    }

    /// Decrease-key: repoint a temporarily-labeled edge at a cheaper
    /// predecessor, lowering its sort cost by the real cost difference.
    fn check_if_lower_cost_path(&mut self, idx: u32, predindex: u32, newcost: Cost) {
        let i = idx as usize;
        let dc = self.edgelabels[i].cost.cost - newcost.cost;
        if dc > 0.0 {
            let oldsortcost = self.edgelabels[i].sortcost;
            let newsortcost = oldsortcost - dc;
            self.edgelabels[i].update(predindex, newcost, newsortcost);
            self.adjacency.decrease(idx, newsortcost, oldsortcost);
        }
    }

    /// Seed the queue from origin locations. Inbound path edges (snapped to
    /// the edge's end node) are skipped; the remaining partial edge is
    /// costed by the fraction left to travel.
    fn set_origin_locations<R: GraphReader>(
        &mut self,
        reader: &R,
        origins: &mut [PathLocation],
        costing: &dyn DynamicCost,
    ) {
        for origin in origins.iter_mut() {
            self.isotile.set(origin.latlng(), 0.0);

            let mut origin_node = None;
            for edge in &origin.edges {
                if edge.end_node() {
                    continue;
                }

                let Some(tile) = reader.graph_tile(edge.id.tile_base()) else {
                    continue;
                };
                let Some(directededge) = tile.directededge(edge.id).copied() else {
                    continue;
                };
                self.tile_creation_date = tile.header.date_created;

                // Without the end node's tile this edge cannot expand.
                let Some(endtile) = reader.graph_tile(directededge.endnode.tile_base()) else {
                    continue;
                };
                let Some(nodeinfo) = endtile.node(directededge.endnode).copied() else {
                    continue;
                };
                origin_node = Some(nodeinfo);

                let remaining = 1.0 - edge.ratio;
                let cost = costing.edge_cost(&directededge) * remaining as f32;
                let next = self.edgelabels.len() as u32;
                self.adjacency.add(next, cost.cost);
                self.edgestatus.set(edge.id, EdgeSet::Temporary, next);
                self.edgelabels.push(EdgeLabel {
                    predecessor: INVALID_LABEL,
                    edgeid: edge.id,
                    endnode: directededge.endnode,
                    cost,
                    sortcost: cost.cost,
                    mode: self.mode,
                    path_distance: directededge.length * remaining,
                    edge_use: directededge.edge_use,
                    origin: true,
                    ..Default::default()
                });
            }

            // A "current" departure time means now in the origin timezone.
            if let (Some(node), Some(dt)) = (origin_node, origin.location.date_time.as_mut()) {
                if dt == "current" {
                    *dt = datetime::iso_date_time(node.timezone_offset);
                }
            }
        }
    }

    /// Seed the reverse queue from destination locations: labels go on the
    /// opposing edges, costed by the fraction of the forward edge already
    /// travelled at the snap point.
    fn set_destination_locations<R: GraphReader>(
        &mut self,
        reader: &R,
        destinations: &mut [PathLocation],
        costing: &dyn DynamicCost,
    ) {
        for dest in destinations.iter_mut() {
            self.isotile.set(dest.latlng(), 0.0);

            for edge in &dest.edges {
                // Outbound edges would expand away from the destination via
                // their opposing twins; the twins are seeded on their own.
                if edge.begin_node() {
                    continue;
                }

                let Some(tile) = reader.graph_tile(edge.id.tile_base()) else {
                    continue;
                };
                let Some(directededge) = tile.directededge(edge.id).copied() else {
                    continue;
                };
                let Some((opp_id, opp_edge, _)) = reader.opposing_edge(edge.id) else {
                    continue;
                };

                let cost = costing.edge_cost(&directededge) * edge.ratio as f32;
                let next = self.edgelabels.len() as u32;
                self.adjacency.add(next, cost.cost);
                self.edgestatus.set(opp_id, EdgeSet::Temporary, next);
                self.edgelabels.push(EdgeLabel {
                    predecessor: INVALID_LABEL,
                    edgeid: opp_id,
                    opp_edgeid: edge.id,
                    endnode: opp_edge.endnode,
                    cost,
                    sortcost: cost.cost,
                    mode: self.mode,
                    edge_use: opp_edge.edge_use,
                    origin: true,
                    ..Default::default()
                });
            }
        }
    }
}

/// Intern the operator of a route into per-call ids, 1-based; routes with no
/// operator map to 0.
fn operator_id_for_route(
    tile: &GraphTile,
    routeid: u32,
    operators: &mut HashMap<String, u32>,
) -> u32 {
    match tile
        .transit_route(routeid)
        .and_then(|r| r.op_by_onestop_id.as_deref())
    {
        Some(name) => {
            if let Some(&id) = operators.get(name) {
                id
            } else {
                let id = operators.len() as u32 + 1;
                operators.insert(name.to_string(), id);
                id
            }
        }
        None => 0,
    }
}

/// Independent isochrones for several origin sets, computed in parallel.
/// Cost models carry per-call state, so each task builds its own set.
pub fn bulk_isochrones<R, F>(
    origin_sets: &mut [Vec<PathLocation>],
    max_minutes: u32,
    reader: &R,
    make_costing: F,
    mode: TravelMode,
    config: &IsochroneConfig,
) -> Vec<Arc<GriddedData>>
where
    R: GraphReader + Sync,
    F: Fn() -> ModeCosting + Sync,
{
    origin_sets
        .par_iter_mut()
        .map(|origins| {
            let costing = make_costing();
            let mut isochrone = Isochrone::with_config(config.clone());
            isochrone.compute(origins, max_minutes, reader, &costing, mode)
        })
        .collect()
}
