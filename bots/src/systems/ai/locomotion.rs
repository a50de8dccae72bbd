// tactical_bots_core/bots/src/systems/ai/locomotion.rs
//! Steering, integration and collision for living bots.

use tracing::trace;

use crate::core::constants::*;
use crate::core::error::{BotError, BotResult};
use crate::core::types::{angle_delta, forward_to_yaw, horizontal, horizontal_distance, lateral, Vec3};
use crate::entities::bot::Bot;
use crate::systems::ai::bot_ai::{TickContext, TickEffects};

const ARRIVE_RADIUS: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveIntent {
    /// Walk the bot's current route.
    FollowRoute,
    /// Raw planar velocity, used for strafing.
    Direct(Vec3),
    Hold,
}

/// Repulsion from blocked cells ahead, separation from nearby agents and a
/// pull toward open ground.
pub fn avoidance(bot: &Bot, heading: Vec3, ctx: &TickContext) -> Vec3 {
    let grid = ctx.routes.grid();
    let mut push = Vec3::ZERO;

    if heading != Vec3::ZERO {
        for angle in [0.0, FEELER_SPREAD_RAD, -FEELER_SPREAD_RAD] {
            let yaw = forward_to_yaw(heading) + angle;
            let dir = Vec3::new(yaw.cos(), 0.0, yaw.sin());
            let strength = if !grid.is_walkable_at(bot.position + dir * FEELER_LENGTH * 0.5) {
                1.0
            } else if !grid.is_walkable_at(bot.position + dir * FEELER_LENGTH) {
                0.5
            } else {
                continue;
            };
            push -= dir * FEELER_WEIGHT * strength;
        }

        let step = grid.cell_size();
        let sample = |offset: Vec3| f32::from(grid.openness_at(bot.position + offset));
        let gradient = Vec3::new(
            sample(Vec3::X * step) - sample(Vec3::NEG_X * step),
            0.0,
            sample(Vec3::Z * step) - sample(Vec3::NEG_Z * step),
        ) / 8.0;
        push += gradient * OPENNESS_GRADIENT_WEIGHT;
    }

    for other in ctx.agents.iter().filter(|a| a.alive && a.id != bot.id) {
        let away = horizontal(bot.position - other.position);
        let distance = away.length();
        if distance >= SEPARATION_RADIUS {
            continue;
        }
        let dir = if distance > 1e-4 {
            away / distance
        } else {
            // Stacked exactly: split by id so the pair moves apart.
            let side = if bot.id < other.id { 1.0 } else { -1.0 };
            let base = if heading != Vec3::ZERO { lateral(heading) } else { Vec3::X };
            base * side
        };
        push += dir * (1.0 - distance / SEPARATION_RADIUS) * SEPARATION_WEIGHT;
    }

    push
}

/// Steered velocity for this tick, clamped to the bot's max speed.
pub fn desired_velocity(bot: &Bot, intent: MoveIntent, ctx: &TickContext) -> Vec3 {
    let max_speed = ctx.config.body.max_speed;
    if bot.status.is_stunned() {
        return Vec3::ZERO;
    }
    let base = match intent {
        MoveIntent::Hold => Vec3::ZERO,
        MoveIntent::Direct(velocity) => horizontal(velocity),
        MoveIntent::FollowRoute => match bot.nav.current_waypoint() {
            None => Vec3::ZERO,
            Some(waypoint) => {
                let to = horizontal(waypoint - bot.position);
                let distance = to.length();
                let last = bot.nav.cursor + 1 >= bot.nav.route.len();
                let speed = if last && distance < ARRIVE_RADIUS {
                    max_speed * (distance / ARRIVE_RADIUS).max(0.2)
                } else {
                    max_speed
                };
                to.normalize_or_zero() * speed
            }
        },
    };
    let heading = base.normalize_or_zero();
    let steer = avoidance(bot, heading, ctx) * max_speed * 0.5;
    let steered = if intent == MoveIntent::Hold { steer * 0.5 } else { base + steer };
    steered.clamp_length_max(max_speed)
}

/// Moves the bot one tick, resolves collisions and advances route state.
/// The stored position is left untouched if the result is not finite.
pub fn integrate(bot: &mut Bot, intent: MoveIntent, face_movement: bool, ctx: &TickContext, fx: &mut TickEffects) -> BotResult<()> {
    let dt = ctx.dt;
    let velocity = desired_velocity(bot, intent, ctx);
    let mut next = bot.position + velocity * dt;

    if bot.nav.pending_nudge != Vec3::ZERO {
        let step = bot.nav.pending_nudge * (dt / STUCK_NUDGE_DECAY_SECS).min(1.0);
        next += step;
        bot.nav.pending_nudge -= step;
        if bot.nav.pending_nudge.length_squared() < 1e-6 {
            bot.nav.pending_nudge = Vec3::ZERO;
        }
    }

    let correction = match ctx.world {
        Some(world) => world.resolve_capsule_collision(next, ctx.config.body.radius, ctx.config.body.half_height),
        None => Vec3::ZERO,
    };
    next += correction;
    next.x = next.x.clamp(ctx.level.bounds_min.x, ctx.level.bounds_max.x);
    next.z = next.z.clamp(ctx.level.bounds_min.y, ctx.level.bounds_max.y);

    if !next.is_finite() {
        bot.velocity = Vec3::ZERO;
        return Err(BotError::NonFinitePosition { agent: bot.id });
    }

    bot.nav.wall_contact = correction;
    bot.velocity = if dt > 0.0 { (next - bot.position) / dt } else { Vec3::ZERO };
    bot.position = next;

    if face_movement {
        let flat = horizontal(velocity);
        if flat.length_squared() > 0.01 {
            let delta = angle_delta(bot.yaw, forward_to_yaw(flat));
            let max_step = ctx.profile.turn_rate * dt;
            bot.yaw = angle_delta(0.0, bot.yaw + delta.clamp(-max_step, max_step));
        }
    }

    if intent == MoveIntent::FollowRoute {
        advance_route(bot, ctx, fx);
    } else {
        bot.nav.watchdog.reset();
    }
    Ok(())
}

fn advance_route(bot: &mut Bot, ctx: &TickContext, fx: &mut TickEffects) {
    while let Some(waypoint) = bot.nav.current_waypoint() {
        if horizontal_distance(bot.position, waypoint) > WAYPOINT_REACHED_DISTANCE {
            break;
        }
        bot.nav.cursor += 1;
    }

    let goal = bot.nav.current_waypoint();
    if let Some(waypoint) = goal {
        if horizontal_distance(bot.position, waypoint) > WAYPOINT_DEVIATION_LIMIT {
            trace!("[Bot {} ({})]: drifted off route, repath", bot.name, bot.id);
            bot.nav.needs_repath = true;
        }
    }

    let verdict = bot.nav.watchdog.sample(bot.position, ctx.dt, goal, fx.rng);
    if verdict.request_repath {
        trace!("[Bot {} ({})]: stuck near {:?}, nudging {:?}", bot.name, bot.id, bot.position, verdict.nudge);
        fx.metrics.record_stuck_repath();
        bot.nav.needs_repath = true;
        bot.nav.pending_nudge = verdict.nudge;
    }
}
