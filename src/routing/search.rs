//! Correlation of input locations to candidate edges of the graph.
//!
//! Each unique location owns a projector that consumes bins around the query
//! point in closest-first order. Projectors currently sitting on the same
//! bin are batched so every bin is loaded and scanned exactly once across
//! all simultaneous queries. A projector stops pulling bins as soon as the
//! next lower bound cannot beat its best candidate.

use std::sync::Arc;

use geo::Point;
use hashbrown::{HashMap, HashSet};
use log::debug;

use super::correlate;
use crate::geometry::{DistanceApproximator, project_onto_segment};
use crate::model::{
    ClosestFirst, DirectedEdge, EdgeInfo, GraphId, GraphReader, GraphTile, Location, NodeInfo,
    PathLocation,
};

/// Inputs farther than this from any edge are not correlated.
pub const SEARCH_CUTOFF: f64 = 35_000.0;
/// Within this distance of an edge endpoint the input snaps to the node.
pub const NODE_SNAP: f64 = 5.0;
/// Within this distance of the centerline there is no side of street.
pub const SIDE_OF_STREET_SNAP: f64 = 5.0;
/// Beyond this distance from the geometry a supplied heading is ignored.
pub const NO_HEADING: f64 = 30.0;
/// Shape length sampled when estimating the tangent at a point.
pub const HEADING_SAMPLE: f64 = 30.0;
/// Default tolerance around the supplied heading, in degrees.
pub const DEFAULT_ANGLE_WIDTH: f64 = 60.0;

/// Best projection seen so far for one location.
pub(crate) struct Candidate {
    pub sq_distance: f64,
    pub point: Point<f64>,
    /// Shape segment the projection fell on.
    pub index: usize,
    pub edge_id: GraphId,
    pub edge: DirectedEdge,
    pub edge_info: Option<Arc<EdgeInfo>>,
}

impl Default for Candidate {
    fn default() -> Self {
        Self {
            sq_distance: f64::MAX,
            point: Point::new(0.0, 0.0),
            index: 0,
            edge_id: GraphId::INVALID,
            edge: DirectedEdge::default(),
            edge_info: None,
        }
    }
}

/// Projection context of one location: the bin stream, the bin currently
/// being scanned, and the best candidate.
pub(crate) struct Projector {
    binner: ClosestFirst,
    pub cur_tile: Option<Arc<GraphTile>>,
    pub bin_index: u8,
    pub location: Location,
    pub candidate: Candidate,
    lon_scale: f64,
    pub approx: DistanceApproximator,
}

impl Projector {
    fn new<R: GraphReader>(location: Location, reader: &R) -> Self {
        let binner = reader
            .hierarchy()
            .local()
            .tiling
            .closest_first(location.latlng);
        let mut projector = Self {
            binner,
            cur_tile: None,
            bin_index: 0,
            candidate: Candidate::default(),
            lon_scale: location.latlng.y().to_radians().cos(),
            approx: DistanceApproximator::new(location.latlng),
            location,
        };
        projector.advance_bin(reader);
        projector
    }

    pub fn point(&self) -> Point<f64> {
        self.location.latlng
    }

    pub fn has_bin(&self) -> bool {
        self.cur_tile.is_some()
    }

    pub fn projection_found(&self) -> bool {
        self.candidate.edge_id.is_valid()
    }

    fn has_same_bin(&self, other: &Projector) -> bool {
        match (&self.cur_tile, &other.cur_tile) {
            (Some(a), Some(b)) => a.id() == b.id() && self.bin_index == other.bin_index,
            _ => false,
        }
    }

    /// Pull bins until one lands in a loadable tile, or terminate once the
    /// next lower bound cannot possibly beat the current best candidate.
    fn advance_bin<R: GraphReader>(&mut self, reader: &R) {
        let local_level = reader.hierarchy().local().level;
        loop {
            let Some((tile_index, bin_index, lower_bound)) = self.binner.next() else {
                self.cur_tile = None;
                return;
            };
            if lower_bound > SEARCH_CUTOFF || lower_bound > self.candidate.sq_distance.sqrt() {
                self.cur_tile = None;
                return;
            }
            let tile_id = GraphId::new(tile_index, local_level, 0);
            if let Some(tile) = reader.graph_tile(tile_id) {
                self.cur_tile = Some(tile);
                self.bin_index = bin_index;
                return;
            }
        }
    }

    /// Performance critical: one projection per shape segment per projector
    /// in the bin.
    fn project(&self, u: Point<f64>, v: Point<f64>) -> Point<f64> {
        project_onto_segment(self.point(), u, v, self.lon_scale)
    }
}

fn sort_projectors(projectors: &mut [Projector]) {
    // Group equal bins together; finished projectors go last.
    projectors.sort_by_key(|p| {
        (
            p.cur_tile.is_none(),
            p.cur_tile.as_ref().map_or(u64::MAX, |t| t.id().value()),
            p.bin_index,
        )
    });
}

/// Longest run of projectors sharing one live (tile, bin), as a range into
/// the sorted slice.
fn find_best_range(projectors: &[Projector]) -> (usize, usize) {
    let mut best = (0, 0);
    let mut start = 0;
    while start < projectors.len() {
        let mut end = start + 1;
        while end < projectors.len() && projectors[start].has_same_bin(&projectors[end]) {
            end += 1;
        }
        if projectors[start].has_bin() && end - start > best.1 - best.0 {
            best = (start, end);
        }
        start = end;
    }
    best
}

/// Scan one bin for a run of projectors all sitting on it: load each listed
/// edge once, walk its shape lazily, and offer every segment to every
/// projector. Afterwards the whole run advances to its next bins.
fn handle_bin<R, EF>(run: &mut [Projector], reader: &R, edge_filter: &EF)
where
    R: GraphReader,
    EF: Fn(&DirectedEdge) -> f64,
{
    let tile = Arc::clone(run[0].cur_tile.as_ref().expect("run has a bin"));
    let bin_index = run[0].bin_index;

    for &listed in tile.bin(bin_index) {
        let mut edge_id = listed;
        let Some(mut edge_tile) = reader.graph_tile(edge_id.tile_base()) else {
            continue;
        };
        let Some(mut edge) = edge_tile.directededge(edge_id).copied() else {
            continue;
        };

        // No use for this one; maybe its twin is allowed and we correlate
        // to that instead.
        if edge_filter(&edge) == 0.0 {
            let Some((opp_id, opp_tile)) = reader.opposing_edge_id(edge_id) else {
                continue;
            };
            let Some(opp_edge) = opp_tile.directededge(opp_id).copied() else {
                continue;
            };
            if edge_filter(&opp_edge) == 0.0 {
                continue;
            }
            edge_id = opp_id;
            edge_tile = opp_tile;
            edge = opp_edge;
        }

        let edge_info = edge_tile.edgeinfo(edge.edgeinfo_offset);
        let mut points = edge_info.lazy_shape();
        let Some(mut v) = points.next() else {
            continue;
        };

        let mut index = 0;
        for next in points {
            let u = v;
            v = next;
            for projector in run.iter_mut() {
                let point = projector.project(u, v);
                let sq_distance = projector.approx.distance_squared(point);
                if sq_distance < projector.candidate.sq_distance {
                    projector.candidate = Candidate {
                        sq_distance,
                        point,
                        index,
                        edge_id,
                        edge,
                        edge_info: Some(Arc::clone(&edge_info)),
                    };
                }
            }
            index += 1;
        }
    }

    for projector in run.iter_mut() {
        projector.advance_bin(reader);
    }
}

/// Correlate each unique input location to its most plausible edges.
///
/// Locations that cannot be correlated (nothing within the cutoff, or every
/// candidate edge filtered away) are absent from the result.
pub fn search<R, EF, NF>(
    locations: &[Location],
    reader: &R,
    edge_filter: EF,
    _node_filter: NF,
) -> HashMap<Location, PathLocation>
where
    R: GraphReader,
    EF: Fn(&DirectedEdge) -> f64,
    NF: Fn(&NodeInfo) -> bool,
{
    let mut searched = HashMap::new();
    if locations.is_empty() {
        return searched;
    }

    let unique: HashSet<Location> = locations.iter().cloned().collect();
    let mut projectors: Vec<Projector> = unique
        .into_iter()
        .map(|location| Projector::new(location, reader))
        .collect();

    // Keep the projectors sorted so shared bins are adjacent and the front
    // projector tells whether anyone still has work.
    sort_projectors(&mut projectors);
    while projectors.first().is_some_and(Projector::has_bin) {
        let (start, end) = find_best_range(&projectors);
        handle_bin(&mut projectors[start..end], reader, &edge_filter);
        sort_projectors(&mut projectors);
    }

    for projector in &projectors {
        if !projector.projection_found() {
            continue;
        }
        match correlate::finalize(projector, reader, &edge_filter) {
            Ok(correlated) => {
                searched.insert(projector.location.clone(), correlated);
            }
            Err(err) => debug!("dropping location: {err}"),
        }
    }
    searched
}
