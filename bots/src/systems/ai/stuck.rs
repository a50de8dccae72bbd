// tactical_bots_core/bots/src/systems/ai/stuck.rs
use rand::Rng;

use crate::core::constants::{STUCK_MIN_PROGRESS, STUCK_MIN_SPEED, STUCK_NUDGE_DISTANCE, STUCK_WINDOW_SECS};
use crate::core::types::{horizontal, horizontal_distance, lateral, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StuckVerdict {
    pub request_repath: bool,
    /// Lateral displacement to apply once; zero unless a repath was requested.
    pub nudge: Vec3,
}

/// Rolling-window progress monitor for one moving agent.
#[derive(Debug, Clone, Default)]
pub struct StuckWatchdog {
    elapsed: f32,
    travelled: f32,
    last_position: Option<Vec3>,
    window_start_goal_distance: Option<f32>,
}

impl StuckWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feeds one tick of movement. Only a closing window can produce a repath.
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        position: Vec3,
        dt: f32,
        goal: Option<Vec3>,
        rng: &mut R,
    ) -> StuckVerdict {
        let Some(goal) = goal else {
            self.reset();
            return StuckVerdict::default();
        };
        if let Some(prev) = self.last_position {
            self.travelled += horizontal_distance(prev, position);
        }
        self.last_position = Some(position);
        let goal_distance = horizontal_distance(position, goal);
        let start_distance = *self.window_start_goal_distance.get_or_insert(goal_distance);
        self.elapsed += dt.max(0.0);

        if self.elapsed < STUCK_WINDOW_SECS {
            return StuckVerdict::default();
        }

        let speed = self.travelled / self.elapsed;
        let progress = start_distance - goal_distance;
        self.elapsed = 0.0;
        self.travelled = 0.0;
        self.window_start_goal_distance = Some(goal_distance);

        if speed >= STUCK_MIN_SPEED || progress >= STUCK_MIN_PROGRESS {
            return StuckVerdict::default();
        }

        let heading = horizontal(goal - position).normalize_or_zero();
        let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let mut nudge = lateral(heading) * side * STUCK_NUDGE_DISTANCE;
        if nudge == Vec3::ZERO {
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            nudge = Vec3::new(angle.cos(), 0.0, angle.sin()) * STUCK_NUDGE_DISTANCE;
        }
        StuckVerdict { request_repath: true, nudge }
    }
}
