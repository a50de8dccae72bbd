// tactical_bots_core/bots/src/systems/ai/flank.rs
use rand::Rng;
use tracing::trace;

use crate::core::constants::{FLANK_MAX_OFFSET, FLANK_MIN_OFFSET};
use crate::core::types::{horizontal, lateral, Vec3};
use crate::systems::ai::rand_between;
use crate::world::nav_grid::NavGrid;

/// Proposes an intermediate waypoint beside the midpoint of `from -> to`.
///
/// The side is picked at random and the other side is tried if the first
/// lands on blocked ground. Routes too short to bend return `None`.
pub fn plan_flank<R: Rng + ?Sized>(grid: &NavGrid, from: Vec3, to: Vec3, rng: &mut R) -> Option<Vec3> {
    let preview = horizontal(to - from);
    let length = preview.length();
    if length < FLANK_MIN_OFFSET * 2.0 {
        return None;
    }
    let dir = preview / length;
    let mid = from.lerp(to, 0.5);
    let offset = rand_between(rng, FLANK_MIN_OFFSET, FLANK_MAX_OFFSET);
    let first_side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };

    for side in [first_side, -first_side] {
        let candidate = mid + lateral(dir) * offset * side;
        if grid.is_walkable_at(candidate) {
            trace!("Flank point {:?} offset {:.1} m from midpoint {:?}", candidate, offset * side, mid);
            return Some(candidate);
        }
    }
    None
}
