// tactical_bots_core/bots/tests/support/mod.rs
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tactical_bots_core::core::config::BotConfig;
use tactical_bots_core::core::services::{DamageService, PlayerStateProvider, WorldQuery};
use tactical_bots_core::core::types::{
    Aabb, CombatTarget, DamageInfo, LevelDescription, Objective, RayHit, SurfaceTags, Team, TeamSpawn, Vec2, Vec3,
};
use tactical_bots_core::entities::health::HealthLedger;
use tactical_bots_core::world::obstacle_index::StaticWorld;

pub fn test_config(seed: u64, bots_per_team: usize) -> BotConfig {
    BotConfig { bots_per_team, seed: Some(seed), ..BotConfig::default() }
}

/// Square arena centred on the origin with one objective in the middle and
/// a spawn per team on opposite sides.
pub fn open_level(half: f32) -> LevelDescription {
    LevelDescription {
        objectives: vec![Objective { id: 1, center: Vec3::ZERO, radius: 3.0 }],
        spawns: vec![
            TeamSpawn { team: Team::Red, position: Vec3::new(-half + 3.0, 0.0, 0.0) },
            TeamSpawn { team: Team::Blue, position: Vec3::new(half - 3.0, 0.0, 0.0) },
        ],
        bounds_min: Vec2::splat(-half),
        bounds_max: Vec2::splat(half),
    }
}

/// Damage service that logs every call and keeps real health underneath.
#[derive(Clone, Default)]
pub struct RecordingDamage {
    pub ledger: Rc<RefCell<HealthLedger>>,
    pub calls: Rc<RefCell<Vec<(CombatTarget, DamageInfo)>>>,
}

impl RecordingDamage {
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn set_health(&self, target: CombatTarget, health: f32) {
        self.ledger.borrow_mut().set_health(target, health);
    }
}

impl DamageService for RecordingDamage {
    fn register(&mut self, target: CombatTarget, max_health: f32) {
        self.ledger.borrow_mut().register(target, max_health);
    }

    fn apply_damage(&mut self, target: CombatTarget, info: DamageInfo) -> bool {
        self.calls.borrow_mut().push((target, info));
        self.ledger.borrow_mut().apply_damage(target, info)
    }

    fn health(&self, target: CombatTarget) -> Option<f32> {
        self.ledger.borrow().health(target)
    }
}

/// Static boxes plus a wall that the test can raise and lower between ticks.
/// The toggled wall only blocks sight, never movement.
#[derive(Clone)]
pub struct ToggleWall {
    pub inner: Rc<StaticWorld>,
    pub raised: Rc<Cell<bool>>,
}

impl ToggleWall {
    pub fn new(solids: &[Aabb]) -> Self {
        ToggleWall { inner: Rc::new(StaticWorld::from_solids(solids)), raised: Rc::new(Cell::new(false)) }
    }
}

impl WorldQuery for ToggleWall {
    fn obstacles(&self) -> Vec<Aabb> {
        self.inner.obstacles()
    }

    fn resolve_capsule_collision(&self, position: Vec3, radius: f32, half_height: f32) -> Vec3 {
        self.inner.resolve_capsule_collision(position, radius, half_height)
    }

    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RayHit> {
        if self.raised.get() && max_distance > 0.2 {
            let distance = max_distance * 0.5;
            return Some(RayHit { point: origin + dir * distance, distance, tags: SurfaceTags::SOLID });
        }
        self.inner.raycast(origin, dir, max_distance)
    }
}

#[derive(Clone)]
pub struct ScriptedPlayer {
    pub position: Rc<Cell<Vec3>>,
    pub aim: Rc<Cell<Vec3>>,
    pub team: Team,
}

impl ScriptedPlayer {
    pub fn new(position: Vec3, team: Team) -> Self {
        ScriptedPlayer { position: Rc::new(Cell::new(position)), aim: Rc::new(Cell::new(Vec3::ZERO)), team }
    }
}

impl PlayerStateProvider for ScriptedPlayer {
    fn position(&self) -> Vec3 {
        self.position.get()
    }

    fn aim_position(&self) -> Vec3 {
        self.aim.get()
    }

    fn team(&self) -> Team {
        self.team
    }
}
