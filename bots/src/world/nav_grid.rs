// tactical_bots_core/bots/src/world/nav_grid.rs
//! Uniform walkability lattice over the level's XZ footprint.

use tracing::debug;

use crate::core::config::{AgentBodyConfig, NavigationConfig};
use crate::core::types::{Aabb, LevelDescription, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Cell { col, row }
    }

    pub fn offset(self, dc: i32, dr: i32) -> Cell {
        Cell::new(self.col + dc, self.row + dr)
    }

    pub fn manhattan(self, other: Cell) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }
}

/// Edge crossings this close along a segment count as passing through a corner.
const CORNER_EPSILON: f32 = 1e-5;

pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

/// Blocked bit and openness per cell. Rows run along +Z, columns along +X.
#[derive(Debug, Clone)]
pub struct NavGrid {
    origin: Vec2,
    cols: i32,
    rows: i32,
    cell_size: f32,
    agent_radius: f32,
    slice_low: f32,
    slice_high: f32,
    blocked: Vec<bool>,
    openness: Vec<u8>,
}

impl NavGrid {
    /// Creates a fully walkable grid covering `bounds_min..bounds_max`.
    /// Only obstacles overlapping the vertical slice `slice_low..slice_high`
    /// are rasterized on rebuild.
    pub fn new(
        bounds_min: Vec2,
        bounds_max: Vec2,
        cell_size: f32,
        agent_radius: f32,
        slice_low: f32,
        slice_high: f32,
    ) -> Self {
        let size = (bounds_max - bounds_min).max(Vec2::splat(cell_size));
        let cols = ((size.x / cell_size).ceil() as i32).max(1);
        let rows = ((size.y / cell_size).ceil() as i32).max(1);
        let total = (cols * rows) as usize;
        let mut grid = NavGrid {
            origin: bounds_min,
            cols,
            rows,
            cell_size,
            agent_radius,
            slice_low,
            slice_high,
            blocked: vec![false; total],
            openness: vec![0; total],
        };
        grid.recompute_openness();
        grid
    }

    pub fn for_level(level: &LevelDescription, body: &AgentBodyConfig, nav: &NavigationConfig) -> Self {
        NavGrid::new(
            level.bounds_min,
            level.bounds_max,
            nav.cell_size,
            body.radius,
            body.foot_clearance,
            body.eye_height,
        )
    }

    /// Re-derives blocked bits and openness from `obstacles`.
    pub fn rebuild(&mut self, obstacles: &[Aabb]) {
        self.blocked.fill(false);
        let mut rasterized = 0usize;
        for obstacle in obstacles {
            if !obstacle.overlaps_vertical(self.slice_low, self.slice_high) {
                continue;
            }
            rasterized += 1;
            let inflated = obstacle.inflated_xz(self.agent_radius);
            let c0 = (((inflated.min.x - self.origin.x) / self.cell_size).floor() as i32).max(0);
            let c1 = (((inflated.max.x - self.origin.x) / self.cell_size).ceil() as i32).min(self.cols);
            let r0 = (((inflated.min.z - self.origin.y) / self.cell_size).floor() as i32).max(0);
            let r1 = (((inflated.max.z - self.origin.y) / self.cell_size).ceil() as i32).min(self.rows);
            for row in r0..r1 {
                for col in c0..c1 {
                    let cell = Cell::new(col, row);
                    let (lo, hi) = self.cell_rect(cell);
                    if inflated.overlaps_rect_xz(lo, hi) {
                        if let Some(idx) = self.index(cell) {
                            self.blocked[idx] = true;
                        }
                    }
                }
            }
        }
        self.recompute_openness();
        debug!(
            "Navigation grid rebuilt: {}x{} cells, {} obstacles rasterized, {} walkable",
            self.cols,
            self.rows,
            rasterized,
            self.walkable_count()
        );
    }

    fn recompute_openness(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let cell = Cell::new(col, row);
                let open = NEIGHBOR_OFFSETS
                    .iter()
                    .filter(|(dc, dr)| self.is_walkable(cell.offset(*dc, *dr)))
                    .count() as u8;
                if let Some(idx) = self.index(cell) {
                    self.openness[idx] = open;
                }
            }
        }
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn agent_radius(&self) -> f32 {
        self.agent_radius
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.col >= 0 && cell.row >= 0 && cell.col < self.cols && cell.row < self.rows
    }

    #[inline]
    pub fn index(&self, cell: Cell) -> Option<usize> {
        if self.contains(cell) {
            Some((cell.row * self.cols + cell.col) as usize)
        } else {
            None
        }
    }

    pub fn cell_from_index(&self, idx: usize) -> Cell {
        let idx = idx as i32;
        Cell::new(idx % self.cols, idx / self.cols)
    }

    pub fn cell_count(&self) -> usize {
        self.blocked.len()
    }

    /// Cell containing `point`, or `None` outside the footprint.
    pub fn cell_at(&self, point: Vec3) -> Option<Cell> {
        let cell = self.cell_at_unclamped(point);
        self.contains(cell).then_some(cell)
    }

    fn cell_at_unclamped(&self, point: Vec3) -> Cell {
        Cell::new(
            ((point.x - self.origin.x) / self.cell_size).floor() as i32,
            ((point.z - self.origin.y) / self.cell_size).floor() as i32,
        )
    }

    fn clamp_cell(&self, cell: Cell) -> Cell {
        Cell::new(cell.col.clamp(0, self.cols - 1), cell.row.clamp(0, self.rows - 1))
    }

    pub fn cell_center(&self, cell: Cell, y: f32) -> Vec3 {
        Vec3::new(
            self.origin.x + (cell.col as f32 + 0.5) * self.cell_size,
            y,
            self.origin.y + (cell.row as f32 + 0.5) * self.cell_size,
        )
    }

    /// World-space XZ square covered by `cell`.
    pub fn cell_rect(&self, cell: Cell) -> (Vec2, Vec2) {
        let lo = Vec2::new(
            self.origin.x + cell.col as f32 * self.cell_size,
            self.origin.y + cell.row as f32 * self.cell_size,
        );
        (lo, lo + Vec2::splat(self.cell_size))
    }

    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.index(cell).map_or(false, |idx| !self.blocked[idx])
    }

    pub fn is_walkable_at(&self, point: Vec3) -> bool {
        self.cell_at(point).map_or(false, |cell| self.is_walkable(cell))
    }

    /// Walkable 8-neighbour count, `0` outside the grid.
    pub fn openness(&self, cell: Cell) -> u8 {
        self.index(cell).map_or(0, |idx| self.openness[idx])
    }

    pub fn openness_at(&self, point: Vec3) -> u8 {
        self.cell_at(point).map_or(0, |cell| self.openness(cell))
    }

    pub fn walkable_count(&self) -> usize {
        self.blocked.iter().filter(|b| !**b).count()
    }

    /// Expanding ring search from the cell containing `point` (clamped onto
    /// the grid). Within a ring the cell closest to `point` wins.
    pub fn find_nearest_walkable(&self, point: Vec3, max_ring: i32) -> Option<Cell> {
        let origin = self.clamp_cell(self.cell_at_unclamped(point));
        if self.is_walkable(origin) {
            return Some(origin);
        }
        for ring in 1..=max_ring {
            let mut best: Option<(f32, Cell)> = None;
            for dr in -ring..=ring {
                for dc in -ring..=ring {
                    if dc.abs() != ring && dr.abs() != ring {
                        continue;
                    }
                    let cell = origin.offset(dc, dr);
                    if !self.is_walkable(cell) {
                        continue;
                    }
                    let d = self.cell_center(cell, point.y).distance_squared(point);
                    if best.map_or(true, |(bd, _)| d < bd) {
                        best = Some((d, cell));
                    }
                }
            }
            if let Some((_, cell)) = best {
                return Some(cell);
            }
        }
        None
    }

    /// True when every cell the segment `a -> b` enters is walkable.
    /// Walks the grid cell by cell; a segment through a cell corner must
    /// have both side cells walkable too.
    pub fn segment_clear(&self, a: Vec3, b: Vec3) -> bool {
        if !(a.is_finite() && b.is_finite()) {
            return false;
        }
        let start = Vec2::new(a.x - self.origin.x, a.z - self.origin.y) / self.cell_size;
        let end = Vec2::new(b.x - self.origin.x, b.z - self.origin.y) / self.cell_size;
        let mut cell = Cell::new(start.x.floor() as i32, start.y.floor() as i32);
        let last = Cell::new(end.x.floor() as i32, end.y.floor() as i32);
        if !self.is_walkable(cell) {
            return false;
        }

        let delta = end - start;
        let step_c = axis_step(delta.x);
        let step_r = axis_step(delta.y);
        let t_delta = Vec2::new(
            if step_c != 0 { 1.0 / delta.x.abs() } else { f32::INFINITY },
            if step_r != 0 { 1.0 / delta.y.abs() } else { f32::INFINITY },
        );
        // Parametric distance to the first vertical and horizontal cell edge.
        let mut t_max = Vec2::new(
            match step_c {
                1 => (cell.col as f32 + 1.0 - start.x) * t_delta.x,
                -1 => (start.x - cell.col as f32) * t_delta.x,
                _ => f32::INFINITY,
            },
            match step_r {
                1 => (cell.row as f32 + 1.0 - start.y) * t_delta.y,
                -1 => (start.y - cell.row as f32) * t_delta.y,
                _ => f32::INFINITY,
            },
        );

        let mut remaining = cell.manhattan(last);
        while remaining > 0 {
            if step_c != 0 && step_r != 0 && (t_max.x - t_max.y).abs() <= CORNER_EPSILON {
                if !self.is_walkable(cell.offset(step_c, 0)) || !self.is_walkable(cell.offset(0, step_r)) {
                    return false;
                }
                cell = cell.offset(step_c, step_r);
                t_max += t_delta;
                remaining -= 2;
            } else if t_max.x < t_max.y {
                cell = cell.offset(step_c, 0);
                t_max.x += t_delta.x;
                remaining -= 1;
            } else {
                cell = cell.offset(0, step_r);
                t_max.y += t_delta.y;
                remaining -= 1;
            }
            if !self.is_walkable(cell) {
                return false;
            }
        }
        self.is_walkable(last)
    }
}

fn axis_step(d: f32) -> i32 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}
