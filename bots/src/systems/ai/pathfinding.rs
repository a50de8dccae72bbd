// tactical_bots_core/bots/src/systems/ai/pathfinding.rs
//! Weighted A* over the navigation grid. Routes prefer open space: every step
//! pays a penalty for each blocked neighbour of the cell it enters.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use thiserror::Error;
use tracing::trace;

use crate::core::config::NavigationConfig;
use crate::world::nav_grid::{Cell, NavGrid};

const DIAGONAL_COST: f32 = std::f32::consts::SQRT_2;
const NO_PARENT: u32 = u32::MAX;

// (dc, dr, step cost)
const DIRS: [(i32, i32, f32); 8] = [
    (1, 0, 1.0),
    (-1, 0, 1.0),
    (0, 1, 1.0),
    (0, -1, 1.0),
    (1, 1, DIAGONAL_COST),
    (-1, 1, DIAGONAL_COST),
    (1, -1, DIAGONAL_COST),
    (-1, -1, DIAGONAL_COST),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathfindingError {
    #[error("no path exists between the endpoints")]
    Unreachable,
    #[error("search gave up after {0} expansions")]
    ExpansionBudgetExceeded(usize),
    #[error("endpoint {0:?} is blocked")]
    EndpointBlocked(Cell),
    #[error("endpoint {0:?} lies outside the grid")]
    OutOfBounds(Cell),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    pub max_expansions: usize,
    /// Multiplier on the Manhattan heuristic; at least 1.0.
    pub heuristic_weight: f32,
    pub wall_penalty: f32,
}

impl From<&NavigationConfig> for SearchSettings {
    fn from(nav: &NavigationConfig) -> Self {
        SearchSettings {
            max_expansions: nav.max_expansions,
            heuristic_weight: nav.heuristic_weight.max(1.0),
            wall_penalty: nav.wall_penalty.max(0.0),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings::from(&NavigationConfig::default())
    }
}

/// True when moving from `from` by `(dc, dr)` neither leaves walkable space
/// nor slips diagonally between two blocked orthogonal neighbours.
pub fn is_valid_move(grid: &NavGrid, from: Cell, dc: i32, dr: i32) -> bool {
    if !grid.is_walkable(from.offset(dc, dr)) {
        return false;
    }
    if dc != 0 && dr != 0 {
        return grid.is_walkable(from.offset(dc, 0)) && grid.is_walkable(from.offset(0, dr));
    }
    true
}

fn heuristic(a: Cell, b: Cell, weight: f32) -> f32 {
    a.manhattan(b) as f32 * weight
}

/// Returns the cell sequence from `start` to `goal`, both inclusive.
///
/// Ties in the open set are broken by cell index, so identical inputs always
/// produce identical paths.
pub fn find_path(
    grid: &NavGrid,
    start: Cell,
    goal: Cell,
    settings: &SearchSettings,
) -> Result<Vec<Cell>, PathfindingError> {
    for endpoint in [start, goal] {
        if !grid.contains(endpoint) {
            return Err(PathfindingError::OutOfBounds(endpoint));
        }
        if !grid.is_walkable(endpoint) {
            return Err(PathfindingError::EndpointBlocked(endpoint));
        }
    }
    if start == goal {
        return Ok(vec![start]);
    }

    let total = grid.cell_count();
    let mut g_cost = vec![f32::INFINITY; total];
    let mut parent = vec![NO_PARENT; total];
    let mut closed = vec![false; total];

    let (start_idx, goal_idx) = match (grid.index(start), grid.index(goal)) {
        (Some(s), Some(g)) => (s, g),
        _ => return Err(PathfindingError::Unreachable),
    };

    // f32 bits order like the values for non-negative costs.
    let mut open: BinaryHeap<Reverse<(u32, u32)>> = BinaryHeap::new();
    g_cost[start_idx] = 0.0;
    open.push(Reverse((heuristic(start, goal, settings.heuristic_weight).to_bits(), start_idx as u32)));

    let mut expansions = 0usize;
    while let Some(Reverse((_, idx))) = open.pop() {
        let idx = idx as usize;
        if closed[idx] {
            continue;
        }
        if idx == goal_idx {
            let path = reconstruct(grid, &parent, goal_idx);
            trace!("A* reached {:?} from {:?} after {} expansions, {} nodes", goal, start, expansions, path.len());
            return Ok(path);
        }
        closed[idx] = true;
        expansions += 1;
        if expansions > settings.max_expansions {
            trace!("A* from {:?} to {:?} exceeded {} expansions", start, goal, settings.max_expansions);
            return Err(PathfindingError::ExpansionBudgetExceeded(settings.max_expansions));
        }

        let cell = grid.cell_from_index(idx);
        for (dc, dr, step) in DIRS {
            if !is_valid_move(grid, cell, dc, dr) {
                continue;
            }
            let next = cell.offset(dc, dr);
            let Some(next_idx) = grid.index(next) else { continue };
            if closed[next_idx] {
                continue;
            }
            let penalty = settings.wall_penalty * f32::from(8 - grid.openness(next).min(8));
            let tentative = g_cost[idx] + step + penalty;
            if tentative < g_cost[next_idx] {
                g_cost[next_idx] = tentative;
                parent[next_idx] = idx as u32;
                let f = tentative + heuristic(next, goal, settings.heuristic_weight);
                open.push(Reverse((f.to_bits(), next_idx as u32)));
            }
        }
    }

    Err(PathfindingError::Unreachable)
}

fn reconstruct(grid: &NavGrid, parent: &[u32], goal_idx: usize) -> Vec<Cell> {
    let mut path = vec![grid.cell_from_index(goal_idx)];
    let mut cursor = parent[goal_idx];
    while cursor != NO_PARENT {
        path.push(grid.cell_from_index(cursor as usize));
        cursor = parent[cursor as usize];
    }
    path.reverse();
    path
}
