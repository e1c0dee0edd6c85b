//! Turning a best projection into a `PathLocation`.
//!
//! A candidate either snaps to a node (within [`NODE_SNAP`](super::search::NODE_SNAP)
//! of the shape ends) or lies mid-edge. Node snaps enumerate every incident
//! edge across hierarchy levels; mid-edge snaps emit the candidate edge and
//! its opposing twin with complementary ratios. A supplied heading filters
//! edges pointing the wrong way, but only advisorily: if it would remove
//! everything, the filtered edges are restored.

use super::search::{
    Candidate, DEFAULT_ANGLE_WIDTH, HEADING_SAMPLE, NODE_SNAP, NO_HEADING, Projector,
    SIDE_OF_STREET_SNAP,
};
use crate::error::Error;
use crate::geometry::{distance, is_left, tangent_angle};
use crate::model::{
    DirectedEdge, EdgeInfo, GraphId, GraphReader, Location, PathEdge, PathLocation, SideOfStreet,
    StopType,
};

use geo::Point;

/// Does the heading on the location rule out travel along this edge?
/// Headings are only meaningful close to the geometry.
fn heading_filter(
    edge: &DirectedEdge,
    info: &EdgeInfo,
    location: &Location,
    point: Point<f64>,
    dist: f64,
    index: usize,
) -> bool {
    let Some(heading) = location.heading else {
        return false;
    };
    if dist > NO_HEADING {
        return false;
    }

    let shape = info.shape_points();
    let angle = tangent_angle(index, point, &shape, edge.forward, HEADING_SAMPLE);
    let tolerance = location.heading_tolerance.unwrap_or(DEFAULT_ANGLE_WIDTH);
    // Shortest angular difference, wrapping across north.
    let diff = if heading > angle {
        (heading - angle).min(360.0 - heading + angle)
    } else {
        (angle - heading).min(360.0 - angle + heading)
    };
    diff > tolerance
}

/// Which side of the candidate edge the original query is on. On-street
/// inputs and projections at the shape ends have no side.
fn get_side(candidate: &Candidate, original: Point<f64>, dist: f64) -> SideOfStreet {
    if dist < SIDE_OF_STREET_SNAP {
        return SideOfStreet::None;
    }
    let Some(info) = candidate.edge_info.as_ref() else {
        return SideOfStreet::None;
    };
    let shape = info.shape_points();
    let (front, back) = (shape[0], shape[shape.len() - 1]);
    if distance(candidate.point, front) < SIDE_OF_STREET_SNAP
        || distance(candidate.point, back) < SIDE_OF_STREET_SNAP
    {
        return SideOfStreet::None;
    }

    let a = shape[candidate.index];
    let b = shape[candidate.index + 1];
    if is_left(a, b, original) == candidate.edge.forward {
        SideOfStreet::Left
    } else {
        SideOfStreet::Right
    }
}

/// Enumerate the edges incident to `node_id`, descending one hierarchy level
/// through transition edges when `follow_transitions` is set (only the outer
/// call sets it, which bounds the recursion).
#[allow(clippy::too_many_arguments)]
fn crawl<R, EF>(
    reader: &R,
    edge_filter: &EF,
    location: &Location,
    candidate: &Candidate,
    node_id: GraphId,
    follow_transitions: bool,
    dist: f64,
    correlated: &mut PathLocation,
    heading_filtered: &mut Vec<PathEdge>,
) where
    R: GraphReader,
    EF: Fn(&DirectedEdge) -> f64,
{
    let Some(tile) = reader.graph_tile(node_id.tile_base()) else {
        return;
    };
    let Some(node) = tile.node(node_id).copied() else {
        return;
    };

    for i in 0..node.edge_count {
        let idx = node.edge_index + i;
        let Some(edge) = tile.directededge_at(idx).copied() else {
            break;
        };

        // Co-located edges on the next level down are candidates too.
        if follow_transitions && edge.is_transition() {
            crawl(
                reader,
                edge_filter,
                location,
                candidate,
                edge.endnode,
                false,
                dist,
                correlated,
                heading_filtered,
            );
        }

        let id = node_id.with_index(idx);
        let info = tile.edgeinfo(edge.edgeinfo_offset);
        let shape_len = info.shape.0.len();

        // The outbound edge leaves this node.
        if edge_filter(&edge) != 0.0 {
            let path_edge = PathEdge {
                id,
                ratio: 0.0,
                projected: node.latlng,
                distance: dist,
                side: SideOfStreet::None,
            };
            let index = if edge.forward { 0 } else { shape_len - 2 };
            if heading_filter(&edge, &info, location, candidate.point, dist, index) {
                heading_filtered.push(path_edge);
            } else {
                correlated.edges.push(path_edge);
            }
        }

        // And its twin arrives here.
        let Some((opp_id, opp_edge, _)) = reader.opposing_edge(id) else {
            continue;
        };
        if edge_filter(&opp_edge) != 0.0 {
            let path_edge = PathEdge {
                id: opp_id,
                ratio: 1.0,
                projected: node.latlng,
                distance: dist,
                side: SideOfStreet::None,
            };
            let index = if opp_edge.forward { 0 } else { shape_len - 2 };
            if heading_filter(&opp_edge, &info, location, candidate.point, dist, index) {
                heading_filtered.push(path_edge);
            } else {
                correlated.edges.push(path_edge);
            }
        }
    }
}

/// Correlate a node snap: every allowed edge entering or leaving the node,
/// outbound with ratio 0 and inbound with ratio 1.
fn correlate_node<R, EF>(
    reader: &R,
    location: &Location,
    edge_filter: &EF,
    found_node: GraphId,
    candidate: &Candidate,
) -> Result<PathLocation, Error>
where
    R: GraphReader,
    EF: Fn(&DirectedEdge) -> f64,
{
    let mut correlated = PathLocation::new(location.clone());
    let dist = distance(location.latlng, candidate.point);
    let mut heading_filtered = Vec::new();

    crawl(
        reader,
        edge_filter,
        location,
        candidate,
        found_node,
        true,
        dist,
        &mut correlated,
        &mut heading_filtered,
    );

    // The heading is advisory; with nothing left, take the filtered set.
    if correlated.edges.is_empty() && !heading_filtered.is_empty() {
        correlated.edges = heading_filtered;
    }

    // A through location with a heading wants to exit in that direction, so
    // edges ending at the snap node are of no use.
    if location.stop_type == StopType::Through && location.heading.is_some() {
        correlated.edges.retain(|e| !e.end_node());
    }

    if correlated.edges.is_empty() {
        return Err(Error::NoSuitableEdges);
    }
    Ok(correlated)
}

/// Correlate a mid-edge snap: the candidate edge and, when allowed, its
/// opposing twin with complementary ratio and flipped side.
fn correlate_edge<R, EF>(
    reader: &R,
    location: &Location,
    edge_filter: &EF,
    candidate: &Candidate,
) -> Result<PathLocation, Error>
where
    R: GraphReader,
    EF: Fn(&DirectedEdge) -> f64,
{
    let mut correlated = PathLocation::new(location.clone());
    let dist = distance(location.latlng, candidate.point);

    if candidate.edge_id.is_valid() {
        let info = candidate.edge_info.as_ref().ok_or(Error::NoSuitableEdges)?;
        let shape = info.shape_points();

        // Ratio measured along the shape up to the projection, in the
        // direction the edge travels.
        let mut partial_length = 0.0;
        for i in 0..candidate.index {
            partial_length += distance(shape[i], shape[i + 1]);
        }
        partial_length += distance(shape[candidate.index], candidate.point);
        partial_length = partial_length.min(candidate.edge.length);
        let mut length_ratio = partial_length / candidate.edge.length;
        if !candidate.edge.forward {
            length_ratio = 1.0 - length_ratio;
        }

        let side = get_side(candidate, location.latlng, dist);
        let mut heading_filtered = Vec::new();

        let path_edge = PathEdge {
            id: candidate.edge_id,
            ratio: length_ratio,
            projected: candidate.point,
            distance: dist,
            side,
        };
        if heading_filter(&candidate.edge, info, location, candidate.point, dist, candidate.index) {
            heading_filtered.push(path_edge);
        } else {
            correlated.edges.push(path_edge);
        }

        if let Some((opp_id, opp_edge, _)) = reader.opposing_edge(candidate.edge_id) {
            if edge_filter(&opp_edge) != 0.0 {
                let path_edge = PathEdge {
                    id: opp_id,
                    ratio: 1.0 - length_ratio,
                    projected: candidate.point,
                    distance: dist,
                    side: side.flip(),
                };
                if heading_filter(&opp_edge, info, location, candidate.point, dist, candidate.index)
                {
                    heading_filtered.push(path_edge);
                } else {
                    correlated.edges.push(path_edge);
                }
            }
        }

        if correlated.edges.is_empty() {
            correlated.edges = heading_filtered;
        }
    }

    if correlated.edges.is_empty() {
        return Err(Error::NoSuitableEdges);
    }
    Ok(correlated)
}

/// Classify the best candidate as a node snap or a mid-edge snap and build
/// the `PathLocation` accordingly.
pub(crate) fn finalize<R, EF>(
    projector: &Projector,
    reader: &R,
    edge_filter: &EF,
) -> Result<PathLocation, Error>
where
    R: GraphReader,
    EF: Fn(&DirectedEdge) -> f64,
{
    let candidate = &projector.candidate;
    let info = candidate.edge_info.as_ref().ok_or(Error::NoSuitableEdges)?;
    let shape = info.shape_points();
    let (front, back) = (shape[0], shape[shape.len() - 1]);

    let at_front =
        candidate.point == front || distance(projector.point(), front) < NODE_SNAP;
    let at_back = candidate.point == back || distance(projector.point(), back) < NODE_SNAP;

    // Snapped to the edge's begin node: that node is the opposing edge's end.
    if (at_front && candidate.edge.forward) || (at_back && !candidate.edge.forward) {
        let (_, opp_edge, _) = reader
            .opposing_edge(candidate.edge_id)
            .ok_or(Error::MissingTile(candidate.edge_id))?;
        return correlate_node(reader, &projector.location, edge_filter, opp_edge.endnode, candidate);
    }

    // Snapped to the end node.
    if (at_back && candidate.edge.forward) || (at_front && !candidate.edge.forward) {
        return correlate_node(
            reader,
            &projector.location,
            edge_filter,
            candidate.edge.endnode,
            candidate,
        );
    }

    correlate_edge(reader, &projector.location, edge_filter, candidate)
}
