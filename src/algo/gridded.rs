//! The isotile: a uniform lat/lng grid of minutes-to-reach.

use geo::{Point, Rect, coord};

/// Uniform grid of floats over a bounding rectangle, one value per cell,
/// initialized to `+inf`. Writes are monotone (`set_if_less`), so a finished
/// grid is directly contourable.
#[derive(Debug, Clone)]
pub struct GriddedData {
    bounds: Rect<f64>,
    cell_size: f64,
    ncols: usize,
    nrows: usize,
    max_value: f32,
    data: Vec<f32>,
}

impl Default for GriddedData {
    fn default() -> Self {
        Self {
            bounds: Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 0.0, y: 0.0 }),
            cell_size: 1.0,
            ncols: 0,
            nrows: 0,
            max_value: 0.0,
            data: Vec::new(),
        }
    }
}

impl GriddedData {
    /// `cell_size` is in degrees; `max_value` caps the value range for the
    /// contour generator.
    pub fn new(bounds: Rect<f64>, cell_size: f64, max_value: f32) -> Self {
        let ncols = ((bounds.width() / cell_size).ceil() as usize).max(1);
        let nrows = ((bounds.height() / cell_size).ceil() as usize).max(1);
        Self {
            bounds,
            cell_size,
            ncols,
            nrows,
            max_value,
            data: vec![f32::INFINITY; ncols * nrows],
        }
    }

    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn max_value(&self) -> f32 {
        self.max_value
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn value(&self, cell: usize) -> f32 {
        self.data[cell]
    }

    /// Cell containing the point, if it is within bounds.
    pub fn cell(&self, p: Point<f64>) -> Option<usize> {
        let gx = (p.x() - self.bounds.min().x) / self.cell_size;
        let gy = (p.y() - self.bounds.min().y) / self.cell_size;
        if gx < 0.0 || gy < 0.0 {
            return None;
        }
        let (col, row) = (gx as usize, gy as usize);
        if col >= self.ncols || row >= self.nrows {
            return None;
        }
        Some(row * self.ncols + col)
    }

    /// Center of a cell, for contouring and tests.
    pub fn cell_center(&self, cell: usize) -> Point<f64> {
        let row = cell / self.ncols;
        let col = cell % self.ncols;
        Point::new(
            self.bounds.min().x + (col as f64 + 0.5) * self.cell_size,
            self.bounds.min().y + (row as f64 + 0.5) * self.cell_size,
        )
    }

    /// Unconditional write at the cell containing `p`. Returns false when
    /// the point lies outside the grid.
    pub fn set(&mut self, p: Point<f64>, value: f32) -> bool {
        match self.cell(p) {
            Some(cell) => {
                self.data[cell] = value;
                true
            }
            None => false,
        }
    }

    /// Monotone write: only ever lowers a cell value.
    pub fn set_if_less(&mut self, cell: usize, value: f32) {
        if value < self.data[cell] {
            self.data[cell] = value;
        }
    }

    /// Every cell the segment `a -> b` crosses, clipped to the grid.
    pub fn intersect(&self, a: Point<f64>, b: Point<f64>) -> Vec<usize> {
        if self.data.is_empty() {
            return Vec::new();
        }

        // Work in grid units so cells are unit squares.
        let ax = (a.x() - self.bounds.min().x) / self.cell_size;
        let ay = (a.y() - self.bounds.min().y) / self.cell_size;
        let bx = (b.x() - self.bounds.min().x) / self.cell_size;
        let by = (b.y() - self.bounds.min().y) / self.cell_size;
        let dx = bx - ax;
        let dy = by - ay;

        // Clip the parameter range to the grid box.
        let mut t0 = 0.0f64;
        let mut t1 = 1.0f64;
        for (p, q) in [
            (-dx, ax),
            (dx, self.ncols as f64 - ax),
            (-dy, ay),
            (dy, self.nrows as f64 - ay),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return Vec::new();
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    t0 = t0.max(r);
                } else {
                    t1 = t1.min(r);
                }
            }
        }
        if t0 > t1 {
            return Vec::new();
        }

        // Step cell to cell from the entry point.
        let sx = ax + dx * t0;
        let sy = ay + dy * t0;
        let mut col = (sx as isize).clamp(0, self.ncols as isize - 1);
        let mut row = (sy as isize).clamp(0, self.nrows as isize - 1);
        let end_col = ((ax + dx * t1) as isize).clamp(0, self.ncols as isize - 1);
        let end_row = ((ay + dy * t1) as isize).clamp(0, self.nrows as isize - 1);

        let step_x: isize = if dx > 0.0 { 1 } else { -1 };
        let step_y: isize = if dy > 0.0 { 1 } else { -1 };
        let mut t_max_x = if dx != 0.0 {
            let next = if dx > 0.0 { col as f64 + 1.0 } else { col as f64 };
            t0 + (next - sx) / dx
        } else {
            f64::INFINITY
        };
        let mut t_max_y = if dy != 0.0 {
            let next = if dy > 0.0 { row as f64 + 1.0 } else { row as f64 };
            t0 + (next - sy) / dy
        } else {
            f64::INFINITY
        };
        let t_delta_x = if dx != 0.0 { (1.0 / dx).abs() } else { f64::INFINITY };
        let t_delta_y = if dy != 0.0 { (1.0 / dy).abs() } else { f64::INFINITY };

        let mut cells = Vec::new();
        loop {
            cells.push(row as usize * self.ncols + col as usize);
            if col == end_col && row == end_row {
                break;
            }
            if t_max_x <= t_max_y {
                t_max_x += t_delta_x;
                col += step_x;
            } else {
                t_max_y += t_delta_y;
                row += step_y;
            }
            if col < 0 || row < 0 || col >= self.ncols as isize || row >= self.nrows as isize {
                break;
            }
        }
        cells
    }
}
