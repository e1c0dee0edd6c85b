//! Detection of small disconnected components around a correlated location.

use hashbrown::HashSet;

use crate::model::{DirectedEdge, EdgeUse, GraphId, GraphReader, NodeInfo, PathLocation};

/// Bounded breadth-first expansion from the location's candidate edges.
///
/// Expansion stops as soon as all three thresholds are met, meaning the
/// location is connected to enough graph to not be an island; the result is
/// then empty. If the frontier runs dry first, the location sits on an
/// island and the discovered edges are returned so a second pass can avoid
/// them.
pub fn island<R, EF, NF>(
    location: &PathLocation,
    reader: &R,
    node_filter: NF,
    edge_filter: EF,
    edge_threshold: u32,
    length_threshold: u32,
    node_threshold: u32,
) -> HashSet<GraphId>
where
    R: GraphReader,
    EF: Fn(&DirectedEdge) -> f64,
    NF: Fn(&NodeInfo) -> bool,
{
    let mut todo: HashSet<GraphId> = location.edges.iter().map(|e| e.id).collect();
    let mut done: HashSet<GraphId> = HashSet::with_capacity(edge_threshold as usize);

    let mut total_edge_length = 0u32;
    let mut nodes_expanded = 0u32;
    while (done.len() < edge_threshold as usize
        || total_edge_length < length_threshold
        || nodes_expanded < node_threshold)
        && !todo.is_empty()
    {
        let edge_id = *todo.iter().next().expect("todo is non-empty");
        todo.remove(&edge_id);
        done.insert(edge_id);

        let Some(tile) = reader.graph_tile(edge_id.tile_base()) else {
            continue;
        };
        let Some(directededge) = tile.directededge(edge_id).copied() else {
            continue;
        };
        if edge_filter(&directededge) == 0.0 {
            continue;
        }
        total_edge_length += directededge.length as u32;

        let node_id = directededge.endnode;
        let Some(tile) = reader.graph_tile(node_id.tile_base()) else {
            continue;
        };
        let Some(nodeinfo) = tile.node(node_id).copied() else {
            continue;
        };
        if node_filter(&nodeinfo) {
            continue;
        }

        let mut expanded = false;
        for i in 0..nodeinfo.edge_count {
            let idx = nodeinfo.edge_index + i;
            let Some(edge) = tile.directededge_at(idx).copied() else {
                break;
            };
            // Level transitions and transit connections do not witness road
            // connectivity.
            if edge.is_transition()
                || edge.edge_use == EdgeUse::TransitConnection
                || edge_filter(&edge) == 0.0
            {
                continue;
            }
            let id = node_id.with_index(idx);
            if !done.contains(&id) {
                todo.insert(id);
            }
            expanded = true;
        }
        nodes_expanded += u32::from(expanded);
    }

    if todo.is_empty() { done } else { HashSet::new() }
}
