//! The cost-model surface consumed by the expansion engines.
//!
//! Cost models are the single polymorphic boundary of the crate: one model
//! per travel mode, called through [`DynamicCost`]. Models may carry
//! per-call state (walking-distance flags, transit exclude lists); they take
//! `&self` and are expected to use interior mutability for it, so one engine
//! can consult several models at once.

use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

use crate::algo::EdgeLabel;
use crate::model::{DirectedEdge, GraphId, GraphTile, NodeInfo, TransitDeparture};

/// A cost with its elapsed-seconds component. `cost` is what the priority
/// queue orders on; `secs` is wall-clock travel time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub cost: f32,
    pub secs: f32,
}

impl Cost {
    pub fn new(cost: f32, secs: f32) -> Self {
        Self { cost, secs }
    }
}

impl Add for Cost {
    type Output = Cost;
    fn add(self, rhs: Cost) -> Cost {
        Cost::new(self.cost + rhs.cost, self.secs + rhs.secs)
    }
}

impl AddAssign for Cost {
    fn add_assign(&mut self, rhs: Cost) {
        self.cost += rhs.cost;
        self.secs += rhs.secs;
    }
}

impl Mul<f32> for Cost {
    type Output = Cost;
    fn mul(self, rhs: f32) -> Cost {
        Cost::new(self.cost * rhs, self.secs * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TravelMode {
    Pedestrian = 0,
    Bicycle = 1,
    Drive = 2,
    PublicTransit = 3,
}

pub const TRAVEL_MODE_COUNT: usize = 4;

impl TravelMode {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One cost model per travel mode, indexed by [`TravelMode::index`].
pub type ModeCosting = [Box<dyn DynamicCost>; TRAVEL_MODE_COUNT];

/// Behavioral contract of a cost model.
///
/// Defaults are the permissive/zero choices so that simple models only
/// implement access and edge cost.
pub trait DynamicCost {
    fn travel_mode(&self) -> TravelMode;

    /// Access bit this model checks against edge and node access masks.
    fn access_mode(&self) -> u32;

    /// May the expansion enter this edge coming from `pred`?
    fn allowed(
        &self,
        edge: &DirectedEdge,
        pred: &EdgeLabel,
        tile: &GraphTile,
        edge_id: GraphId,
    ) -> bool;

    /// Reverse-expansion access check; `opp_edge` is the edge actually
    /// traversed in the forward direction.
    fn allowed_reverse(
        &self,
        edge: &DirectedEdge,
        pred: &EdgeLabel,
        opp_edge: &DirectedEdge,
        tile: &GraphTile,
        edge_id: GraphId,
    ) -> bool;

    fn allowed_at_node(&self, node: &NodeInfo) -> bool {
        node.access & self.access_mode() != 0
    }

    /// Complex restriction lookup over the predecessor chain.
    fn restricted(
        &self,
        _edge: &DirectedEdge,
        _pred: &EdgeLabel,
        _labels: &[EdgeLabel],
        _tile: &GraphTile,
        _edge_id: GraphId,
        _forward: bool,
    ) -> bool {
        false
    }

    fn edge_cost(&self, edge: &DirectedEdge) -> Cost;

    /// Cost of riding a transit-line edge boarded at `departure`, having
    /// arrived at the stop at `local_time` seconds from midnight. The wait
    /// until departure is part of the cost.
    fn transit_edge_cost(
        &self,
        _edge: &DirectedEdge,
        departure: &TransitDeparture,
        local_time: u32,
    ) -> Cost {
        let secs =
            departure.departure_time.saturating_sub(local_time) as f32 + departure.elapsed_time as f32;
        Cost::new(secs, secs)
    }

    fn transition_cost(&self, _edge: &DirectedEdge, _node: &NodeInfo, _pred: &EdgeLabel) -> Cost {
        Cost::default()
    }

    fn transition_cost_reverse(
        &self,
        _local_idx: u32,
        _node: &NodeInfo,
        _opp_edge: &DirectedEdge,
        _opp_pred: &DirectedEdge,
    ) -> Cost {
        Cost::default()
    }

    /// Bucket size for the expansion queue.
    fn unit_size(&self) -> f32 {
        1.0
    }

    /// Weight applied to this mode's edge costs in multimodal expansion.
    fn mode_weight(&self) -> f32 {
        1.0
    }

    /// Penalty for transferring between vehicles at a stop.
    fn transfer_cost(&self) -> Cost {
        Cost::default()
    }

    /// Transfer penalty assumed before a stop is known to be a transfer.
    fn default_transfer_cost(&self) -> Cost {
        Cost::default()
    }

    fn wheelchair(&self) -> bool {
        false
    }

    fn bicycle(&self) -> bool {
        false
    }

    /// Hand a transit tile to the model so it can exclude flagged stops and
    /// lines. Called once per tile per computation.
    fn add_to_exclude_list(&self, _tile: &GraphTile) {}

    fn is_excluded_edge(&self, _tile: &GraphTile, _edge: &DirectedEdge) -> bool {
        false
    }

    fn is_excluded_node(&self, _tile: &GraphTile, _node: &NodeInfo) -> bool {
        false
    }

    /// Multimodal expansion lets pedestrians use transit connections.
    fn set_allow_transit_connections(&self, _allow: bool) {}

    /// Switch the pedestrian model to its multimodal walking-distance limit.
    fn use_max_multimodal_distance(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_arithmetic() {
        let a = Cost::new(10.0, 8.0);
        let b = Cost::new(2.0, 2.0);
        assert_eq!(a + b, Cost::new(12.0, 10.0));
        assert_eq!(a * 0.5, Cost::new(5.0, 4.0));
        let mut c = a;
        c += b;
        assert_eq!(c, Cost::new(12.0, 10.0));
    }
}
