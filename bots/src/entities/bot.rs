// tactical_bots_core/bots/src/entities/bot.rs
use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;
use smallvec::SmallVec;

use crate::core::constants::*;
use crate::core::types::{yaw_to_forward, AgentId, CombatTarget, Team, Vec3, WeaponKind};
use crate::systems::ai::route::Route;
use crate::systems::ai::stuck::StuckWatchdog;
use crate::systems::ai::tactical::TacticalIntent;

/// Per-state data for the combat state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum BotState {
    MoveToObjective,
    HoldObjective { patrol_timer: f32, hunt_roll_timer: f32 },
    Search { last_known: Vec3, timer: f32 },
    Engage { target: CombatTarget },
    Hunt { quarry: AgentId, timer: f32 },
    /// `from` is the threat, `to` the fallback point.
    Retreat { from: Vec3, to: Vec3, timer: f32 },
    Dead { respawn_in: f32 },
}

/// Data-free tag of a `BotState`, used in events and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BotStateKind {
    MoveToObjective,
    HoldObjective,
    Search,
    Engage,
    Hunt,
    Retreat,
    Dead,
}

impl BotState {
    pub fn kind(&self) -> BotStateKind {
        match self {
            BotState::MoveToObjective => BotStateKind::MoveToObjective,
            BotState::HoldObjective { .. } => BotStateKind::HoldObjective,
            BotState::Search { .. } => BotStateKind::Search,
            BotState::Engage { .. } => BotStateKind::Engage,
            BotState::Hunt { .. } => BotStateKind::Hunt,
            BotState::Retreat { .. } => BotStateKind::Retreat,
            BotState::Dead { .. } => BotStateKind::Dead,
        }
    }

    /// States in which perception may pull the bot into a fight.
    pub fn can_acquire_targets(&self) -> bool {
        matches!(
            self,
            BotState::MoveToObjective | BotState::HoldObjective { .. } | BotState::Search { .. } | BotState::Hunt { .. }
        )
    }
}

impl fmt::Display for BotStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Route following bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct NavState {
    pub route: Vec<Vec3>,
    pub cursor: usize,
    /// Point the current route was requested for.
    pub destination: Option<Vec3>,
    pub repath_timer: f32,
    pub snap_retry_timer: f32,
    pub needs_repath: bool,
    /// Consecutive requests where the destination and every alternative failed.
    pub failures: u32,
    pub watchdog: StuckWatchdog,
    pub pending_nudge: Vec3,
    /// Collision correction from the last integration step.
    pub wall_contact: Vec3,
}

impl NavState {
    pub fn set_route(&mut self, route: Route, destination: Vec3) {
        self.cursor = if route.len() > 1 { 1 } else { 0 };
        self.route = route.waypoints;
        self.destination = Some(destination);
        self.repath_timer = REPATH_INTERVAL_SECS;
        self.needs_repath = false;
        self.watchdog.reset();
    }

    pub fn clear(&mut self) {
        self.route.clear();
        self.cursor = 0;
        self.destination = None;
        self.needs_repath = false;
        self.watchdog.reset();
    }

    pub fn current_waypoint(&self) -> Option<Vec3> {
        self.route.get(self.cursor).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.route.len()
    }

    pub fn has_wall_contact(&self) -> bool {
        self.wall_contact.length_squared() > WALL_CONTACT_EPSILON * WALL_CONTACT_EPSILON
    }
}

#[derive(Debug, Clone, Default)]
pub struct Perception {
    /// Accumulated sight time toward `detect_need`.
    pub seen_time: f32,
    /// Threshold drawn from the profile at spawn.
    pub detect_need: f32,
    pub candidate: Option<CombatTarget>,
    /// Whether the engaged or candidate target was visible this tick.
    pub visible: bool,
    pub time_since_los: f32,
    pub last_known: Option<Vec3>,
    pub last_known_age: f32,
}

impl Perception {
    pub fn remember(&mut self, position: Vec3) {
        self.last_known = Some(position);
        self.last_known_age = 0.0;
    }

    pub fn forget(&mut self) {
        self.seen_time = 0.0;
        self.candidate = None;
        self.visible = false;
        self.time_since_los = 0.0;
        self.last_known = None;
        self.last_known_age = 0.0;
    }
}

#[derive(Debug, Clone, Default)]
pub struct CombatTimers {
    pub reaction: f32,
    pub first_shot: f32,
    pub shot_cooldown: f32,
    pub burst_left: u32,
    pub burst_pause: f32,
    pub engage_time: f32,
    pub tactical_cooldown: f32,
    pub tactical_roll: f32,
    pub retreat_cooldown: f32,
    pub strafe_sign: f32,
    pub strafe_timer: f32,
    /// Seconds since each recent hit taken.
    pub recent_hits: SmallVec<[f32; 8]>,
}

impl CombatTimers {
    pub fn tick(&mut self, dt: f32) {
        self.reaction = (self.reaction - dt).max(0.0);
        self.first_shot = (self.first_shot - dt).max(0.0);
        self.shot_cooldown = (self.shot_cooldown - dt).max(0.0);
        self.burst_pause = (self.burst_pause - dt).max(0.0);
        self.tactical_cooldown = (self.tactical_cooldown - dt).max(0.0);
        self.tactical_roll = (self.tactical_roll - dt).max(0.0);
        self.retreat_cooldown = (self.retreat_cooldown - dt).max(0.0);
        self.strafe_timer = (self.strafe_timer - dt).max(0.0);
        for age in self.recent_hits.iter_mut() {
            *age += dt;
        }
        self.recent_hits.retain(|age| *age <= HIT_MEMORY_SECS);
    }

    pub fn record_hit(&mut self) {
        if self.recent_hits.len() == self.recent_hits.inline_size() {
            self.recent_hits.remove(0);
        }
        self.recent_hits.push(0.0);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatusTimers {
    pub blind: f32,
    pub stunned: f32,
}

impl StatusTimers {
    pub fn tick(&mut self, dt: f32) {
        self.blind = (self.blind - dt).max(0.0);
        self.stunned = (self.stunned - dt).max(0.0);
    }

    pub fn is_blind(&self) -> bool {
        self.blind > 0.0
    }

    pub fn is_stunned(&self) -> bool {
        self.stunned > 0.0
    }
}

#[derive(Debug, Clone)]
pub struct Bot {
    pub id: AgentId,
    pub name: String,
    pub team: Team,
    pub weapon: WeaponKind,
    /// Feet position.
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
    pub state: BotState,
    /// Index into the level's objective list.
    pub objective: usize,
    pub intent: Option<TacticalIntent>,
    pub tactical_timer: f32,
    pub visited: VecDeque<Vec3>,
    pub nav: NavState,
    pub perception: Perception,
    pub combat: CombatTimers,
    pub status: StatusTimers,
    pub kills: u32,
    pub deaths: u32,
}

impl Bot {
    pub fn new(id: AgentId, team: Team, weapon: WeaponKind, position: Vec3, max_health: f32) -> Self {
        Bot {
            id,
            name: format!("{:?}Bot{}", team, id),
            team,
            weapon,
            position,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            health: max_health,
            max_health,
            alive: true,
            state: BotState::MoveToObjective,
            objective: 0,
            intent: None,
            tactical_timer: 0.0,
            visited: VecDeque::with_capacity(VISITED_MEMORY),
            nav: NavState::default(),
            perception: Perception::default(),
            combat: CombatTimers::default(),
            status: StatusTimers::default(),
            kills: 0,
            deaths: 0,
        }
    }

    /// Full health and fresh perception at `position`; the objective is kept.
    pub fn reset_for_spawn(&mut self, position: Vec3, yaw: f32, detect_need: f32) {
        self.position = position;
        self.velocity = Vec3::ZERO;
        self.yaw = yaw;
        self.health = self.max_health;
        self.alive = true;
        self.state = BotState::MoveToObjective;
        self.intent = None;
        self.tactical_timer = 0.0;
        self.visited.clear();
        self.nav = NavState::default();
        self.perception = Perception { detect_need, ..Perception::default() };
        self.combat = CombatTimers { strafe_sign: 1.0, ..CombatTimers::default() };
        self.status = StatusTimers::default();
    }

    pub fn eye_position(&self, eye_height: f32) -> Vec3 {
        self.position + Vec3::Y * eye_height
    }

    pub fn forward(&self) -> Vec3 {
        yaw_to_forward(self.yaw)
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            (self.health / self.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn remember_visit(&mut self, point: Vec3) {
        if self.visited.len() == VISITED_MEMORY {
            self.visited.pop_front();
        }
        self.visited.push_back(point);
    }
}
