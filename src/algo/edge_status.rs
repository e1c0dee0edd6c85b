use hashbrown::HashMap;

use super::edge_label::INVALID_LABEL;
use crate::model::GraphId;

/// Where an edge stands in the expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeSet {
    #[default]
    Unseen,
    /// Reached, still in the queue; may be improved.
    Temporary,
    /// Settled; the best cost to this edge is final.
    Permanent,
}

#[derive(Debug, Clone, Copy)]
pub struct EdgeStatusInfo {
    pub set: EdgeSet,
    /// Index into the label array for temporary/permanent edges.
    pub index: u32,
}

impl Default for EdgeStatusInfo {
    fn default() -> Self {
        Self { set: EdgeSet::Unseen, index: INVALID_LABEL }
    }
}

/// Expansion status per directed edge, keyed by graph id. Unknown edges are
/// unseen.
#[derive(Debug, Default)]
pub struct EdgeStatus {
    map: HashMap<GraphId, EdgeStatusInfo>,
}

impl EdgeStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn set(&mut self, edge: GraphId, set: EdgeSet, index: u32) {
        self.map.insert(edge, EdgeStatusInfo { set, index });
    }

    /// Change the state of an already-tracked edge, keeping its label index.
    pub fn update(&mut self, edge: GraphId, set: EdgeSet) {
        if let Some(info) = self.map.get_mut(&edge) {
            info.set = set;
        }
    }

    pub fn get(&self, edge: GraphId) -> EdgeStatusInfo {
        self.map.get(&edge).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_by_default_then_tracked() {
        let mut status = EdgeStatus::new();
        let id = GraphId::new(1, 2, 3);
        assert_eq!(status.get(id).set, EdgeSet::Unseen);

        status.set(id, EdgeSet::Temporary, 7);
        assert_eq!(status.get(id).set, EdgeSet::Temporary);
        assert_eq!(status.get(id).index, 7);

        status.update(id, EdgeSet::Permanent);
        assert_eq!(status.get(id).set, EdgeSet::Permanent);
        assert_eq!(status.get(id).index, 7);
    }
}
