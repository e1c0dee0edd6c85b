//! World tiling for the graph hierarchy and the closest-first bin stream
//! that drives correlation.
//!
//! Every hierarchy level partitions the world into square tiles; each tile is
//! further split into a fixed 5x5 grid of bins listing the edges whose
//! geometry passes through them. The graph store fills the bins; this module
//! only describes the tiling and enumerates bins around a query point in
//! order of increasing lower-bound distance.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use geo::{Point, Rect, coord};
use hashbrown::HashSet;

use crate::geometry::{METERS_PER_DEGREE_LAT, meters_per_lng_degree};

/// Bins per tile side.
pub const BIN_DIM: u32 = 5;
/// Bins per tile.
pub const BIN_COUNT: u32 = BIN_DIM * BIN_DIM;

/// A square tiling of the world at one hierarchy level.
#[derive(Debug, Clone, Copy)]
pub struct Tiling {
    bounds: Rect<f64>,
    tile_size: f64,
    nrows: u32,
    ncols: u32,
}

impl Tiling {
    pub fn new(tile_size: f64) -> Self {
        let bounds = Rect::new(coord! { x: -180.0, y: -90.0 }, coord! { x: 180.0, y: 90.0 });
        Self {
            bounds,
            tile_size,
            nrows: (bounds.height() / tile_size).round() as u32,
            ncols: (bounds.width() / tile_size).round() as u32,
        }
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    pub fn nrows(&self) -> u32 {
        self.nrows
    }

    pub fn ncols(&self) -> u32 {
        self.ncols
    }

    /// Row-major tile index containing the point.
    pub fn tile_index(&self, p: Point<f64>) -> u32 {
        let col = self.clamp_col(((p.x() - self.bounds.min().x) / self.tile_size).floor());
        let row = self.clamp_row(((p.y() - self.bounds.min().y) / self.tile_size).floor());
        row * self.ncols + col
    }

    /// Tile index and bin index within that tile for the point.
    pub fn tile_and_bin(&self, p: Point<f64>) -> (u32, u8) {
        let sub = self.subdivision_size();
        let sx = self.clamp_sx(((p.x() - self.bounds.min().x) / sub).floor());
        let sy = self.clamp_sy(((p.y() - self.bounds.min().y) / sub).floor());
        self.tile_and_bin_of_subdivision(sx, sy)
    }

    /// Side length of one bin in degrees.
    pub fn subdivision_size(&self) -> f64 {
        self.tile_size / f64::from(BIN_DIM)
    }

    /// Stream of `(tile_index, bin_index, lower_bound_meters)` tuples in
    /// non-decreasing lower-bound order around `p`.
    pub fn closest_first(&self, p: Point<f64>) -> ClosestFirst {
        ClosestFirst::new(*self, p)
    }

    fn clamp_col(&self, v: f64) -> u32 {
        (v.max(0.0) as u32).min(self.ncols - 1)
    }

    fn clamp_row(&self, v: f64) -> u32 {
        (v.max(0.0) as u32).min(self.nrows - 1)
    }

    fn clamp_sx(&self, v: f64) -> u32 {
        (v.max(0.0) as u32).min(self.ncols * BIN_DIM - 1)
    }

    fn clamp_sy(&self, v: f64) -> u32 {
        (v.max(0.0) as u32).min(self.nrows * BIN_DIM - 1)
    }

    fn tile_and_bin_of_subdivision(&self, sx: u32, sy: u32) -> (u32, u8) {
        let tile = (sy / BIN_DIM) * self.ncols + sx / BIN_DIM;
        let bin = (sy % BIN_DIM) * BIN_DIM + sx % BIN_DIM;
        (tile, bin as u8)
    }

    /// Minimum possible distance in meters from `p` to any coordinate inside
    /// the subdivision, in the same equirectangular metric the projectors
    /// compare candidates with.
    fn subdivision_lower_bound(&self, p: Point<f64>, sx: u32, sy: u32, m_per_lng: f64) -> f64 {
        let sub = self.subdivision_size();
        let min_x = self.bounds.min().x + f64::from(sx) * sub;
        let min_y = self.bounds.min().y + f64::from(sy) * sub;

        let dy = (min_y - p.y()).max(p.y() - (min_y + sub)).max(0.0);
        let dx_raw = (min_x - p.x()).max(p.x() - (min_x + sub)).max(0.0);
        // The tiling wraps in longitude, take the shorter way around.
        let dx = dx_raw.min(360.0 - dx_raw - sub);

        let mx = dx * m_per_lng;
        let my = dy * METERS_PER_DEGREE_LAT;
        (mx * mx + my * my).sqrt()
    }
}

/// Heap entry for the closest-first traversal. Ordered as a min-heap on the
/// lower-bound distance.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BinEntry {
    dist: f64,
    sx: u32,
    sy: u32,
}

impl Eq for BinEntry {}

impl Ord for BinEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| (other.sx, other.sy).cmp(&(self.sx, self.sy)))
    }
}

impl PartialOrd for BinEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Stateful generator over bins in non-decreasing lower-bound order.
///
/// A best-first traversal over the subdivision grid: starting from the
/// subdivision containing the query, each popped subdivision enqueues its
/// unvisited neighbours. Popping a subdivision yields its tile and bin along
/// with the lower-bound distance.
pub struct ClosestFirst {
    tiling: Tiling,
    point: Point<f64>,
    m_per_lng: f64,
    heap: BinaryHeap<BinEntry>,
    visited: HashSet<(u32, u32)>,
}

impl ClosestFirst {
    fn new(tiling: Tiling, point: Point<f64>) -> Self {
        let sub = tiling.subdivision_size();
        let sx = tiling.clamp_sx(((point.x() - tiling.bounds.min().x) / sub).floor());
        let sy = tiling.clamp_sy(((point.y() - tiling.bounds.min().y) / sub).floor());
        let m_per_lng = meters_per_lng_degree(point.y());

        let mut heap = BinaryHeap::new();
        let mut visited = HashSet::new();
        heap.push(BinEntry {
            dist: tiling.subdivision_lower_bound(point, sx, sy, m_per_lng),
            sx,
            sy,
        });
        visited.insert((sx, sy));
        Self {
            tiling,
            point,
            m_per_lng,
            heap,
            visited,
        }
    }

    /// Next bin, or `None` when the whole world has been enumerated.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<(u32, u8, f64)> {
        let entry = self.heap.pop()?;

        let width = self.tiling.ncols * BIN_DIM;
        let height = self.tiling.nrows * BIN_DIM;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let sy = i64::from(entry.sy) + dy;
                if sy < 0 || sy >= i64::from(height) {
                    continue;
                }
                let sx = (i64::from(entry.sx) + dx).rem_euclid(i64::from(width)) as u32;
                let sy = sy as u32;
                if self.visited.insert((sx, sy)) {
                    self.heap.push(BinEntry {
                        dist: self
                            .tiling
                            .subdivision_lower_bound(self.point, sx, sy, self.m_per_lng),
                        sx,
                        sy,
                    });
                }
            }
        }

        let (tile, bin) = self.tiling.tile_and_bin_of_subdivision(entry.sx, entry.sy);
        Some((tile, bin, entry.dist))
    }
}

/// A level of the tile hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct TileLevel {
    pub level: u8,
    pub name: &'static str,
    pub tiling: Tiling,
}

/// The standard hierarchy: three road levels plus the transit level, which
/// shares the local level's tiling. Edges of every level are binned into the
/// local level's tiles.
#[derive(Debug, Clone)]
pub struct TileHierarchy {
    levels: Vec<TileLevel>,
    transit: TileLevel,
}

impl TileHierarchy {
    pub fn standard() -> Self {
        Self {
            levels: vec![
                TileLevel { level: 0, name: "highway", tiling: Tiling::new(4.0) },
                TileLevel { level: 1, name: "arterial", tiling: Tiling::new(1.0) },
                TileLevel { level: 2, name: "local", tiling: Tiling::new(0.25) },
            ],
            transit: TileLevel { level: 3, name: "transit", tiling: Tiling::new(0.25) },
        }
    }

    pub fn levels(&self) -> &[TileLevel] {
        &self.levels
    }

    /// The most detailed road level, which also carries the bins.
    pub fn local(&self) -> &TileLevel {
        self.levels.last().expect("hierarchy has levels")
    }

    pub fn transit(&self) -> &TileLevel {
        &self.transit
    }

    pub fn level(&self, level: u8) -> Option<&TileLevel> {
        if level == self.transit.level {
            return Some(&self.transit);
        }
        self.levels.iter().find(|l| l.level == level)
    }
}

impl Default for TileHierarchy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_level_tile_counts() {
        let tiling = TileHierarchy::standard().local().tiling;
        assert_eq!(tiling.ncols(), 1440);
        assert_eq!(tiling.nrows(), 720);
    }

    #[test]
    fn closest_first_starts_at_containing_bin() {
        let tiling = Tiling::new(0.25);
        let p = Point::new(13.4, 52.5);
        let mut binner = tiling.closest_first(p);
        let (tile, bin, dist) = binner.next().unwrap();
        assert_eq!((tile, bin), tiling.tile_and_bin(p));
        assert_eq!(dist, 0.0);
    }

    #[test]
    fn closest_first_is_non_decreasing() {
        let tiling = Tiling::new(0.25);
        let mut binner = tiling.closest_first(Point::new(13.4001, 52.5001));
        let mut last = 0.0;
        for _ in 0..500 {
            let (_, _, dist) = binner.next().unwrap();
            assert!(dist >= last, "{dist} < {last}");
            last = dist;
        }
    }

    #[test]
    fn bins_tile_the_world_without_overlap() {
        let tiling = Tiling::new(0.25);
        // Two points in the same tile but different bins.
        let (t1, b1) = tiling.tile_and_bin(Point::new(0.01, 0.01));
        let (t2, b2) = tiling.tile_and_bin(Point::new(0.06, 0.01));
        assert_eq!(t1, t2);
        assert_ne!(b1, b2);
    }
}
