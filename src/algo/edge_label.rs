use crate::costing::{Cost, TravelMode};
use crate::model::{EdgeUse, GraphId};

/// Sentinel terminating predecessor chains and signalling an empty queue.
pub const INVALID_LABEL: u32 = u32::MAX;

/// State of one reached directed edge during expansion.
///
/// Labels live in a single growable array; the predecessor chain is held as
/// indices into that array and ends at [`INVALID_LABEL`].
#[derive(Debug, Clone, Copy)]
pub struct EdgeLabel {
    pub predecessor: u32,
    pub edgeid: GraphId,
    /// Opposing edge id, tracked by the reverse expansion.
    pub opp_edgeid: GraphId,
    pub endnode: GraphId,
    pub cost: Cost,
    /// Queue ordering key; equals `cost.cost` in these engines.
    pub sortcost: f32,
    pub transition_cost: Cost,
    pub mode: TravelMode,
    /// Meters travelled along the path; in multimodal expansion this is the
    /// walking distance since last boarding.
    pub path_distance: f64,
    pub tripid: u32,
    /// Last transit stop entered on the path.
    pub prior_stopid: GraphId,
    pub blockid: u32,
    pub transit_operator: u32,
    pub has_transit: bool,
    /// Set on labels seeded directly from an input location.
    pub origin: bool,
    pub edge_use: EdgeUse,
}

impl Default for EdgeLabel {
    fn default() -> Self {
        Self {
            predecessor: INVALID_LABEL,
            edgeid: GraphId::INVALID,
            opp_edgeid: GraphId::INVALID,
            endnode: GraphId::INVALID,
            cost: Cost::default(),
            sortcost: 0.0,
            transition_cost: Cost::default(),
            mode: TravelMode::Pedestrian,
            path_distance: 0.0,
            tripid: 0,
            prior_stopid: GraphId::INVALID,
            blockid: 0,
            transit_operator: 0,
            has_transit: false,
            origin: false,
            edge_use: EdgeUse::Road,
        }
    }
}

impl EdgeLabel {
    /// Label for a zero-cost hierarchy transition: everything is inherited
    /// from the predecessor except the edge itself.
    pub fn new_transition(predecessor: u32, edgeid: GraphId, endnode: GraphId, pred: &EdgeLabel) -> Self {
        Self {
            predecessor,
            edgeid,
            endnode,
            ..*pred
        }
    }

    /// A lower-cost path was found; repoint the label.
    pub fn update(&mut self, predecessor: u32, cost: Cost, sortcost: f32) {
        self.predecessor = predecessor;
        self.cost = cost;
        self.sortcost = sortcost;
    }

    /// Multimodal variant carrying the transit continuity fields.
    pub fn update_multimodal(
        &mut self,
        predecessor: u32,
        cost: Cost,
        sortcost: f32,
        path_distance: f64,
        tripid: u32,
        blockid: u32,
    ) {
        self.update(predecessor, cost, sortcost);
        self.path_distance = path_distance;
        self.tripid = tripid;
        self.blockid = blockid;
    }
}
