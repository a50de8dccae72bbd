// tactical_bots_core/bots/src/core/services.rs
//! Seams to the host application. Every collaborator is optional: when one is
//! missing, the behaviour that depends on it is skipped for that tick and the
//! rest of the bot update carries on.

use crate::core::types::{Aabb, CombatTarget, DamageInfo, RayHit, Team, Vec3};

/// Static geometry and collision queries.
pub trait WorldQuery {
    /// Solid static boxes used to rasterize the navigation grid.
    fn obstacles(&self) -> Vec<Aabb>;

    /// Correction that moves a capsule at `position` (feet) out of any overlap.
    /// Returns `Vec3::ZERO` when the capsule is free.
    fn resolve_capsule_collision(&self, position: Vec3, radius: f32, half_height: f32) -> Vec3;

    /// Nearest hit along a unit direction, tagged with the struck surface.
    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RayHit>;
}

/// Health bookkeeping for bots and the human player.
pub trait DamageService {
    fn register(&mut self, target: CombatTarget, max_health: f32);

    /// Applies damage and reports whether the hit killed the target.
    fn apply_damage(&mut self, target: CombatTarget, info: DamageInfo) -> bool;

    fn health(&self, target: CombatTarget) -> Option<f32>;
}

/// Live state of the human player.
pub trait PlayerStateProvider {
    fn position(&self) -> Vec3;
    fn aim_position(&self) -> Vec3;
    fn team(&self) -> Team;
    fn is_alive(&self) -> bool {
        true
    }
}

/// The host's collaborators, each of which may be absent.
#[derive(Default)]
pub struct Services {
    pub world: Option<Box<dyn WorldQuery>>,
    pub damage: Option<Box<dyn DamageService>>,
    pub player: Option<Box<dyn PlayerStateProvider>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_world(mut self, world: impl WorldQuery + 'static) -> Self {
        self.world = Some(Box::new(world));
        self
    }

    pub fn with_damage(mut self, damage: impl DamageService + 'static) -> Self {
        self.damage = Some(Box::new(damage));
        self
    }

    pub fn with_player(mut self, player: impl PlayerStateProvider + 'static) -> Self {
        self.player = Some(Box::new(player));
        self
    }
}
