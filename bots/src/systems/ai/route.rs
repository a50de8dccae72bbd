// tactical_bots_core/bots/src/systems/ai/route.rs
use thiserror::Error;
use tracing::{debug, trace};

use crate::core::config::NavigationConfig;
use crate::core::types::{Aabb, Vec3};
use crate::systems::ai::pathfinding::{find_path, PathfindingError, SearchSettings};
use crate::world::nav_grid::NavGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    Destination,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("could not snap the {0:?} onto walkable ground")]
    SnapFailed(Endpoint),
    #[error(transparent)]
    Path(#[from] PathfindingError),
}

/// World-space waypoints for one agent. The last point is always the exact
/// destination that was asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub waypoints: Vec<Vec3>,
    /// Node count of the grid path before smoothing.
    pub raw_len: usize,
}

impl Route {
    pub fn destination(&self) -> Option<Vec3> {
        self.waypoints.last().copied()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Owns the navigation grid and turns world points into smoothed routes.
#[derive(Debug, Clone)]
pub struct RouteBuilder {
    grid: NavGrid,
    settings: SearchSettings,
    snap_ring: i32,
    lookahead: usize,
}

impl RouteBuilder {
    pub fn new(grid: NavGrid, nav: &NavigationConfig) -> Self {
        RouteBuilder {
            grid,
            settings: SearchSettings::from(nav),
            snap_ring: nav.snap_ring,
            lookahead: nav.smooth_lookahead.max(1),
        }
    }

    pub fn grid(&self) -> &NavGrid {
        &self.grid
    }

    pub fn rebuild(&mut self, obstacles: &[Aabb]) {
        self.grid.rebuild(obstacles);
    }

    /// Grid path converted to cell centres, endpoint replaced by `to`. No smoothing.
    pub fn raw_route(&self, from: Vec3, to: Vec3) -> Result<Vec<Vec3>, RouteError> {
        let start = self
            .grid
            .find_nearest_walkable(from, self.snap_ring)
            .ok_or(RouteError::SnapFailed(Endpoint::Start))?;
        let goal = self
            .grid
            .find_nearest_walkable(to, self.snap_ring)
            .ok_or(RouteError::SnapFailed(Endpoint::Destination))?;
        let cells = find_path(&self.grid, start, goal, &self.settings)?;
        let mut points: Vec<Vec3> = cells.iter().map(|c| self.grid.cell_center(*c, from.y)).collect();
        if let Some(last) = points.last_mut() {
            *last = to;
        }
        Ok(points)
    }

    pub fn find_route(&self, from: Vec3, to: Vec3) -> Result<Route, RouteError> {
        let raw = self.raw_route(from, to)?;
        let raw_len = raw.len();
        let waypoints = self.smooth(&raw);
        trace!("Route {:?} -> {:?}: {} nodes smoothed to {}", from, to, raw_len, waypoints.len());
        Ok(Route { waypoints, raw_len })
    }

    /// Greedy string pulling: from each kept point, jump to the farthest point
    /// within the lookahead window that is reachable in a straight line.
    pub fn smooth(&self, points: &[Vec3]) -> Vec<Vec3> {
        if points.len() <= 2 {
            return points.to_vec();
        }
        let last = points.len() - 1;
        let mut out = Vec::with_capacity(points.len());
        out.push(points[0]);
        let mut i = 0;
        while i < last {
            let mut j = (i + self.lookahead).min(last);
            while j > i + 1 && !self.grid.segment_clear(points[i], points[j]) {
                j -= 1;
            }
            out.push(points[j]);
            i = j;
        }
        out
    }

    /// `point` itself when walkable, otherwise the centre of the nearest
    /// walkable cell within the snap ring.
    pub fn nudge_to_walkable(&self, point: Vec3) -> Option<Vec3> {
        if self.grid.is_walkable_at(point) {
            return Some(point);
        }
        let snapped = self.grid.find_nearest_walkable(point, self.snap_ring);
        if snapped.is_none() {
            debug!("No walkable cell within {} rings of {:?}", self.snap_ring, point);
        }
        snapped.map(|cell| self.grid.cell_center(cell, point.y))
    }
}
