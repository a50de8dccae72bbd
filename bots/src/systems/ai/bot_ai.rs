// tactical_bots_core/bots/src/systems/ai/bot_ai.rs
//! Per-bot combat state machine. One step function per state; transitions
//! go through `BotAISystem::transition` so every change is logged and
//! reported to the host.

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, trace, warn};

use crate::core::config::BotConfig;
use crate::core::constants::*;
use crate::core::error::{BotError, BotResult};
use crate::core::services::{DamageService, WorldQuery};
use crate::core::types::{
    horizontal, horizontal_distance, lateral, AgentId, CombatTarget, LevelDescription, Objective, Team, Vec3,
};
use crate::entities::bot::{Bot, BotState, BotStateKind};
use crate::operational::monitoring::metrics::BotMetrics;
use crate::server::events::{BotEvent, EventQueue};
use crate::systems::ai::combat::{self, FireOutcome};
use crate::systems::ai::difficulty::DifficultyProfile;
use crate::systems::ai::locomotion::{self, MoveIntent};
use crate::systems::ai::perception::{self, line_of_sight, Sighting, SmokeCloud};
use crate::systems::ai::route::{RouteBuilder, RouteError};
use crate::systems::ai::tactical::{IntentKind, TacticalDirector, TacticalIntent};
use crate::systems::ai::{chance, rand_between};

/// Moves closer than this to the requested point count as the same destination.
const DESTINATION_SLACK: f32 = 1.0;
const LOOK_AROUND_RATE: f32 = 0.5;
const STRAFE_SPEED_FRACTION: f32 = 0.55;
const LOSE_TARGET_RANGE_FACTOR: f32 = 1.2;

/// Tick-start copy of one bot, shared read-only by every bot's step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub team: Team,
    pub position: Vec3,
    pub alive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub position: Vec3,
    pub aim: Vec3,
    pub team: Team,
    pub alive: bool,
}

/// Read-only inputs for one tick. `agents` is indexed by `AgentId`.
pub struct TickContext<'a> {
    pub dt: f32,
    pub profile: &'a DifficultyProfile,
    pub config: &'a BotConfig,
    pub level: &'a LevelDescription,
    pub routes: &'a RouteBuilder,
    pub director: &'a TacticalDirector,
    pub world: Option<&'a dyn WorldQuery>,
    pub agents: &'a [AgentSnapshot],
    pub player: Option<PlayerSnapshot>,
    pub smokes: &'a [SmokeCloud],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    pub victim: AgentId,
    pub source: AgentId,
    pub source_position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillRecord {
    pub target: CombatTarget,
    pub killer: AgentId,
}

/// Side effects of one tick. Hits and kills on other bots are queued here
/// and applied once every bot has stepped.
pub struct TickEffects<'a> {
    pub rng: &'a mut StdRng,
    pub events: &'a mut EventQueue,
    pub damage: Option<&'a mut (dyn DamageService + 'static)>,
    pub metrics: &'a BotMetrics,
    pub hits: Vec<HitRecord>,
    pub kills: Vec<KillRecord>,
}

pub struct BotAISystem;

impl BotAISystem {
    /// Runs perception, the current state's step and locomotion for one bot.
    pub fn update_bot(bot: &mut Bot, ctx: &TickContext, fx: &mut TickEffects) -> BotResult<()> {
        if !bot.position.is_finite() {
            return Err(BotError::NonFinitePosition { agent: bot.id });
        }
        if let BotState::Dead { respawn_in } = &mut bot.state {
            *respawn_in = (*respawn_in - ctx.dt).max(0.0);
            return Ok(());
        }

        let dt = ctx.dt;
        bot.combat.tick(dt);
        bot.status.tick(dt);
        bot.tactical_timer -= dt;
        bot.nav.repath_timer -= dt;
        bot.nav.snap_retry_timer -= dt;

        let sighting = perception::scan(bot, ctx);
        if !matches!(bot.state, BotState::Engage { .. }) {
            perception::accumulate(&mut bot.perception, sighting.as_ref(), dt);
            if bot.state.can_acquire_targets() && perception::detected(&bot.perception) {
                if let Some(s) = sighting {
                    Self::enter_engage(bot, s, ctx, fx);
                }
            }
        }

        let (intent, face_movement) = match bot.state.kind() {
            BotStateKind::MoveToObjective => (Self::step_move_to_objective(bot, ctx, fx), true),
            BotStateKind::HoldObjective => (Self::step_hold_objective(bot, ctx, fx), true),
            BotStateKind::Search => (Self::step_search(bot, ctx, fx), true),
            BotStateKind::Engage => (Self::step_engage(bot, sighting, ctx, fx), false),
            BotStateKind::Hunt => (Self::step_hunt(bot, ctx, fx), true),
            BotStateKind::Retreat => (Self::step_retreat(bot, ctx, fx), true),
            BotStateKind::Dead => return Ok(()),
        };

        locomotion::integrate(bot, intent, face_movement, ctx, fx)
    }

    /// Single entry point for state changes.
    pub fn transition(bot: &mut Bot, next: BotState, fx: &mut TickEffects) {
        let from = bot.state.kind();
        let to = next.kind();
        bot.state = next;
        if from != to {
            debug!("[Bot {} ({})]: {} -> {}", bot.name, bot.id, from, to);
            fx.events.push(BotEvent::StateChanged { agent: bot.id, from, to });
        }
    }

    fn objective<'c>(bot: &Bot, ctx: &TickContext<'c>) -> Option<&'c Objective> {
        let count = ctx.level.objectives.len();
        if count == 0 {
            return None;
        }
        ctx.level.objectives.get(bot.objective % count)
    }

    fn enter_engage(bot: &mut Bot, sighting: Sighting, ctx: &TickContext, fx: &mut TickEffects) {
        combat::arm_engagement(bot, ctx.profile, fx.rng);
        debug!(
            "[Bot {} ({})]: engaging {:?} at distance {:.1}",
            bot.name, bot.id, sighting.target, sighting.distance
        );
        Self::transition(bot, BotState::Engage { target: sighting.target }, fx);
    }

    // --- Route requests ---

    /// Keeps a route toward `destination`, re-requesting on a throttle, on
    /// deviation, after a stuck verdict or when the destination moves.
    fn follow(bot: &mut Bot, destination: Vec3, ctx: &TickContext, fx: &mut TickEffects) -> MoveIntent {
        if horizontal_distance(bot.position, destination) <= WAYPOINT_REACHED_DISTANCE {
            return MoveIntent::FollowRoute;
        }
        let drift = bot.nav.destination.map_or(f32::INFINITY, |d| horizontal_distance(d, destination));
        let moved = drift > DESTINATION_SLACK;
        let request = bot.nav.snap_retry_timer <= 0.0
            && (bot.nav.needs_repath
                || bot.nav.repath_timer <= 0.0
                || (moved && bot.nav.is_finished())
                || drift > WAYPOINT_DEVIATION_LIMIT);
        if request {
            Self::request_route(bot, destination, ctx, fx);
        }
        MoveIntent::FollowRoute
    }

    /// Returns whether a route is in place afterwards.
    fn request_route(bot: &mut Bot, destination: Vec3, ctx: &TickContext, fx: &mut TickEffects) -> bool {
        match ctx.routes.find_route(bot.position, destination) {
            Ok(route) => {
                bot.nav.set_route(route, destination);
                bot.nav.failures = 0;
                true
            }
            Err(RouteError::SnapFailed(endpoint)) => {
                trace!("[Bot {} ({})]: {:?} snap failed, retrying next tick", bot.name, bot.id, endpoint);
                bot.nav.snap_retry_timer = SNAP_RETRY_SECS;
                false
            }
            Err(RouteError::Path(err)) => {
                fx.metrics.record_route_failure();
                debug!("[Bot {} ({})]: no route to {:?}: {}", bot.name, bot.id, destination, err);
                if Self::route_to_alternative(bot, destination, ctx, fx) {
                    return true;
                }

                bot.nav.clear();
                bot.nav.destination = Some(destination);
                bot.nav.repath_timer = REPATH_INTERVAL_SECS;
                bot.nav.failures += 1;
                if bot.nav.failures >= MAX_ROUTE_FAILURES {
                    Self::hard_reset_objective(bot, ctx, fx);
                }
                false
            }
        }
    }

    /// Tries randomized walkable points around an unreachable destination.
    fn route_to_alternative(bot: &mut Bot, destination: Vec3, ctx: &TickContext, fx: &mut TickEffects) -> bool {
        for attempt in 1..=ROUTE_ALTERNATIVES {
            let angle = rand_between(fx.rng, 0.0, std::f32::consts::TAU);
            let radius = rand_between(fx.rng, ROUTE_ALTERNATIVE_MIN_RADIUS, ROUTE_ALTERNATIVE_MAX_RADIUS);
            let candidate = destination + Vec3::new(angle.cos(), 0.0, angle.sin()) * radius;
            let Some(alternative) = ctx.routes.nudge_to_walkable(candidate) else {
                continue;
            };
            if let Ok(route) = ctx.routes.find_route(bot.position, alternative) {
                debug!(
                    "[Bot {} ({})]: routing to fallback {:?} (attempt {}/{})",
                    bot.name, bot.id, alternative, attempt, ROUTE_ALTERNATIVES
                );
                bot.nav.set_route(route, destination);
                bot.nav.failures = 0;
                return true;
            }
        }
        false
    }

    /// Abandons the current objective for a different one.
    fn hard_reset_objective(bot: &mut Bot, ctx: &TickContext, fx: &mut TickEffects) {
        let count = ctx.level.objectives.len();
        let previous = bot.objective;
        if count > 1 {
            let mut next = fx.rng.gen_range(0..count - 1);
            if next >= previous % count {
                next += 1;
            }
            bot.objective = next;
        }
        warn!(
            "[Bot {} ({})]: objective {} unreachable after {} attempts, switching to {}",
            bot.name, bot.id, previous, bot.nav.failures, bot.objective
        );
        fx.metrics.record_hard_reset();
        bot.intent = None;
        bot.nav.clear();
        bot.nav.failures = 0;
        bot.nav.repath_timer = 0.0;
        bot.tactical_timer = ctx.config.tactical.interval_secs;
        if !matches!(bot.state, BotState::MoveToObjective | BotState::Engage { .. }) {
            Self::transition(bot, BotState::MoveToObjective, fx);
        }
    }

    // --- Tactical intent ---

    fn refresh_intent(bot: &mut Bot, objective: &Objective, ctx: &TickContext, fx: &mut TickEffects) {
        if bot.tactical_timer > 0.0 {
            return;
        }
        bot.tactical_timer = ctx.config.tactical.interval_secs;
        if let Some(intent) = ctx.director.choose(bot, objective, ctx, fx.rng) {
            bot.intent = Some(intent);
        }
    }

    /// Drops the mid point or the whole intent once reached.
    fn advance_intent(bot: &mut Bot) {
        let Some(mut intent) = bot.intent else {
            return;
        };
        if let Some(mid) = intent.mid_point {
            if horizontal_distance(bot.position, mid) <= WAYPOINT_REACHED_DISTANCE * 2.0 {
                intent.mid_point = None;
                bot.remember_visit(mid);
            }
        }
        if intent.mid_point.is_none() && horizontal_distance(bot.position, intent.final_point) <= WAYPOINT_REACHED_DISTANCE * 2.0 {
            bot.remember_visit(intent.final_point);
            bot.intent = None;
        } else {
            bot.intent = Some(intent);
        }
    }

    // --- States ---

    fn step_move_to_objective(bot: &mut Bot, ctx: &TickContext, fx: &mut TickEffects) -> MoveIntent {
        let Some(objective) = Self::objective(bot, ctx) else {
            return MoveIntent::Hold;
        };
        Self::refresh_intent(bot, objective, ctx, fx);
        Self::advance_intent(bot);

        let heading_inside = bot.intent.map_or(true, |i| i.mid_point.is_none() && objective.contains(i.final_point));
        if objective.contains(bot.position) && heading_inside {
            bot.remember_visit(bot.position);
            let hold = BotState::HoldObjective {
                patrol_timer: rand_between(fx.rng, HOLD_PATROL_MIN_SECS, HOLD_PATROL_MAX_SECS),
                hunt_roll_timer: HUNT_ROLL_SECS,
            };
            Self::transition(bot, hold, fx);
            return MoveIntent::Hold;
        }

        let destination = bot.intent.map_or(objective.center, |i| i.next_point());
        Self::follow(bot, destination, ctx, fx)
    }

    fn step_hold_objective(bot: &mut Bot, ctx: &TickContext, fx: &mut TickEffects) -> MoveIntent {
        let BotState::HoldObjective { mut patrol_timer, mut hunt_roll_timer } = bot.state else {
            return MoveIntent::Hold;
        };
        let Some(objective) = Self::objective(bot, ctx) else {
            return MoveIntent::Hold;
        };
        patrol_timer -= ctx.dt;
        hunt_roll_timer -= ctx.dt;

        if bot.intent.is_none() && horizontal_distance(bot.position, objective.center) > objective.radius * 1.5 {
            Self::transition(bot, BotState::MoveToObjective, fx);
            return MoveIntent::Hold;
        }

        if hunt_roll_timer <= 0.0 {
            hunt_roll_timer = HUNT_ROLL_SECS;
            if chance(fx.rng, ctx.profile.hunt_chance) {
                if let Some(quarry) = Self::nearest_rival(bot, ctx.profile.detection_range * HUNT_RANGE_FACTOR, ctx) {
                    let timer = rand_between(fx.rng, HUNT_MIN_SECS, HUNT_MAX_SECS);
                    debug!("[Bot {} ({})]: leaving the objective to hunt agent {}", bot.name, bot.id, quarry);
                    Self::transition(bot, BotState::Hunt { quarry, timer }, fx);
                    return MoveIntent::Hold;
                }
            }
        }

        Self::refresh_intent(bot, objective, ctx, fx);
        if patrol_timer <= 0.0 {
            patrol_timer = rand_between(fx.rng, HOLD_PATROL_MIN_SECS, HOLD_PATROL_MAX_SECS);
            if bot.intent.is_none() {
                let angle = rand_between(fx.rng, 0.0, std::f32::consts::TAU);
                let reach = rand_between(fx.rng, 0.0, objective.radius * 0.8);
                let point = objective.center + Vec3::new(angle.cos(), 0.0, angle.sin()) * reach;
                if let Some(point) = ctx.routes.nudge_to_walkable(point) {
                    bot.intent = Some(TacticalIntent { kind: IntentKind::Patrol, mid_point: None, final_point: point });
                }
            }
        }
        Self::advance_intent(bot);

        bot.state = BotState::HoldObjective { patrol_timer, hunt_roll_timer };
        match bot.intent {
            Some(intent) => Self::follow(bot, intent.next_point(), ctx, fx),
            None => MoveIntent::Hold,
        }
    }

    fn nearest_rival(bot: &Bot, range: f32, ctx: &TickContext) -> Option<AgentId> {
        ctx.agents
            .iter()
            .filter(|a| a.alive && a.team != bot.team)
            .map(|a| (a.id, horizontal_distance(a.position, bot.position)))
            .filter(|(_, d)| *d <= range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    fn step_search(bot: &mut Bot, ctx: &TickContext, fx: &mut TickEffects) -> MoveIntent {
        let BotState::Search { last_known, mut timer } = bot.state else {
            return MoveIntent::Hold;
        };
        timer -= ctx.dt;
        if timer <= 0.0 {
            debug!("[Bot {} ({})]: search at {:?} came up empty", bot.name, bot.id, last_known);
            bot.perception.forget();
            Self::transition(bot, BotState::MoveToObjective, fx);
            return MoveIntent::Hold;
        }
        bot.state = BotState::Search { last_known, timer };

        if horizontal_distance(bot.position, last_known) <= WAYPOINT_REACHED_DISTANCE * 2.0 {
            bot.yaw += ctx.profile.turn_rate * LOOK_AROUND_RATE * ctx.dt;
            return MoveIntent::Hold;
        }
        Self::follow(bot, last_known, ctx, fx)
    }

    fn step_hunt(bot: &mut Bot, ctx: &TickContext, fx: &mut TickEffects) -> MoveIntent {
        let BotState::Hunt { quarry, mut timer } = bot.state else {
            return MoveIntent::Hold;
        };
        timer -= ctx.dt;
        let target = ctx.agents.get(quarry).filter(|a| a.alive && a.team != bot.team);
        let Some(target) = target.filter(|_| timer > 0.0) else {
            Self::transition(bot, BotState::MoveToObjective, fx);
            return MoveIntent::Hold;
        };
        bot.state = BotState::Hunt { quarry, timer };
        Self::follow(bot, target.position, ctx, fx)
    }

    fn step_engage(bot: &mut Bot, sighting: Option<Sighting>, ctx: &TickContext, fx: &mut TickEffects) -> MoveIntent {
        let BotState::Engage { target } = bot.state else {
            return MoveIntent::Hold;
        };
        let dt = ctx.dt;
        let profile = ctx.profile;
        bot.combat.engage_time += dt;

        if combat::should_retreat(bot, profile) {
            Self::begin_retreat(bot, ctx, fx);
            return MoveIntent::FollowRoute;
        }

        let Some((target_position, aim_point)) = perception::locate(target, bot, ctx) else {
            debug!("[Bot {} ({})]: {:?} is down or gone", bot.name, bot.id, target);
            bot.perception.forget();
            Self::transition(bot, BotState::MoveToObjective, fx);
            return MoveIntent::Hold;
        };

        let eye = bot.eye_position(ctx.config.body.eye_height);
        let distance = eye.distance(aim_point);
        let visible = !bot.status.is_blind()
            && distance <= profile.detection_range * LOSE_TARGET_RANGE_FACTOR
            && line_of_sight(ctx.world, ctx.smokes, eye, aim_point);

        if visible {
            bot.perception.visible = true;
            bot.perception.time_since_los = 0.0;
            bot.perception.remember(target_position);
        } else {
            bot.perception.visible = false;
            bot.perception.time_since_los += dt;
            bot.perception.last_known_age += dt;
            if let Some(other) = sighting.filter(|s| s.target != target) {
                debug!("[Bot {} ({})]: switching target to {:?}", bot.name, bot.id, other.target);
                bot.perception.remember(other.position);
                bot.perception.time_since_los = 0.0;
                bot.combat.first_shot = bot.combat.first_shot.max(profile.first_shot_delay.min);
                Self::transition(bot, BotState::Engage { target: other.target }, fx);
                return MoveIntent::Hold;
            }
            if bot.perception.time_since_los > profile.lose_sight_grace {
                match bot.perception.last_known {
                    Some(last_known) => {
                        Self::transition(bot, BotState::Search { last_known, timer: SEARCH_DURATION_SECS }, fx)
                    }
                    None => Self::transition(bot, BotState::MoveToObjective, fx),
                }
                return MoveIntent::Hold;
            }
        }

        let look_at = if visible { aim_point } else { bot.perception.last_known.unwrap_or(target_position) };
        combat::turn_towards(bot, look_at, profile.turn_rate, dt);
        combat::maybe_throw_item(bot, aim_point, visible, distance, ctx, fx);
        if visible {
            if let FireOutcome::Fired { killed: true, .. } = combat::try_fire(bot, target, aim_point, ctx, fx) {
                return MoveIntent::Hold;
            }
        }

        let reach = profile.engage_range * bot.weapon.range_factor();
        if !visible || distance > reach {
            let chase = bot.perception.last_known.unwrap_or(target_position);
            return Self::follow(bot, chase, ctx, fx);
        }

        if bot.combat.strafe_timer <= 0.0 {
            bot.combat.strafe_sign = if fx.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            bot.combat.strafe_timer = rand_between(fx.rng, STRAFE_FLIP_MIN_SECS, STRAFE_FLIP_MAX_SECS);
        }
        let to_target = horizontal(target_position - bot.position).normalize_or_zero();
        let preferred = reach * PREFERRED_RANGE_FRACTION;
        let radial = if distance < preferred * 0.5 { -to_target * 0.5 } else { Vec3::ZERO };
        let strafe = lateral(to_target) * bot.combat.strafe_sign;
        MoveIntent::Direct((strafe + radial) * ctx.config.body.max_speed * STRAFE_SPEED_FRACTION)
    }

    fn begin_retreat(bot: &mut Bot, ctx: &TickContext, fx: &mut TickEffects) {
        let threat = bot.perception.last_known.unwrap_or(bot.position + bot.forward());
        let mut away = horizontal(bot.position - threat).normalize_or_zero();
        if away == Vec3::ZERO {
            away = -bot.forward();
        }
        let fallback = [1.0, 0.6, 0.3]
            .into_iter()
            .find_map(|scale| ctx.routes.nudge_to_walkable(bot.position + away * RETREAT_DISTANCE * scale))
            .unwrap_or(bot.position);

        let timer = rand_between(fx.rng, RETREAT_MIN_SECS, RETREAT_MAX_SECS);
        bot.combat.retreat_cooldown = RETREAT_COOLDOWN_SECS + timer;
        debug!(
            "[Bot {} ({})]: retreating to {:?} at {:.0}% health",
            bot.name,
            bot.id,
            fallback,
            bot.health_fraction() * 100.0
        );
        combat::throw_smoke(bot, bot.position.lerp(threat, 0.25), fx);
        bot.nav.needs_repath = true;
        Self::transition(bot, BotState::Retreat { from: threat, to: fallback, timer }, fx);
        Self::follow(bot, fallback, ctx, fx);
    }

    fn step_retreat(bot: &mut Bot, ctx: &TickContext, fx: &mut TickEffects) -> MoveIntent {
        let BotState::Retreat { from, to, mut timer } = bot.state else {
            return MoveIntent::Hold;
        };
        timer -= ctx.dt;
        if timer <= 0.0 {
            Self::transition(bot, BotState::MoveToObjective, fx);
            return MoveIntent::Hold;
        }
        bot.state = BotState::Retreat { from, to, timer };
        Self::follow(bot, to, ctx, fx)
    }
}
