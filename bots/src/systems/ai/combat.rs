// tactical_bots_core/bots/src/systems/ai/combat.rs
//! Aim, burst fire and the retreat gate for a bot in `Engage`.

use rand::Rng;
use tracing::{debug, trace};

use crate::core::constants::*;
use crate::core::types::{
    angle_delta, forward_to_yaw, horizontal, yaw_to_forward, CombatTarget, DamageInfo, TacticalItemKind, Vec3,
};
use crate::entities::bot::Bot;
use crate::server::events::BotEvent;
use crate::systems::ai::bot_ai::{HitRecord, KillRecord, TickContext, TickEffects};
use crate::systems::ai::difficulty::DifficultyProfile;
use crate::systems::ai::perception::line_of_sight;
use crate::systems::ai::{chance, rand_between, sample_range};

const FLASH_MIN_DISTANCE: f32 = 6.0;
const FLASH_MAX_DISTANCE: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    Stunned,
    Reacting,
    Cooldown,
    Aiming,
    WallContact,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireOutcome {
    Held(HoldReason),
    /// The fresh sight check failed; nothing was fired.
    Occluded,
    Fired { hit: bool, headshot: bool, killed: bool },
}

/// Arms the hesitation timers and the first burst.
pub fn arm_engagement<R: Rng + ?Sized>(bot: &mut Bot, profile: &DifficultyProfile, rng: &mut R) {
    let combat = &mut bot.combat;
    combat.reaction = sample_range(rng, profile.reaction_time);
    combat.first_shot = sample_range(rng, profile.first_shot_delay);
    combat.burst_left = burst_length(profile, rng);
    combat.burst_pause = 0.0;
    combat.engage_time = 0.0;
    combat.strafe_timer = 0.0;
}

fn burst_length<R: Rng + ?Sized>(profile: &DifficultyProfile, rng: &mut R) -> u32 {
    let (lo, hi) = profile.burst_shots;
    if hi > lo {
        rng.gen_range(lo..=hi)
    } else {
        lo.max(1)
    }
}

/// Upper bound of the per-shot yaw error; grows linearly with distance.
pub fn aim_error_bound(distance: f32, profile: &DifficultyProfile) -> f32 {
    AIM_BASE_ERROR_RAD * profile.aim_error_mult * (1.0 + distance.max(0.0) / AIM_ERROR_DISTANCE_SCALE)
}

/// Hit probability before the aim-error penalty.
pub fn hit_chance(distance: f32, profile: &DifficultyProfile) -> f32 {
    let t = ((distance - HIT_FALLOFF_NEAR) / (HIT_FALLOFF_FAR - HIT_FALLOFF_NEAR)).clamp(0.0, 1.0);
    let base = HIT_CHANCE_NEAR + (HIT_CHANCE_FAR - HIT_CHANCE_NEAR) * t;
    (base * profile.hit_chance_mult).clamp(0.0, HIT_CHANCE_CAP)
}

/// Turns toward `point` by at most `turn_rate * dt`. Returns the yaw error left.
pub fn turn_towards(bot: &mut Bot, point: Vec3, turn_rate: f32, dt: f32) -> f32 {
    let flat = horizontal(point - bot.position);
    if flat.length_squared() < 1e-6 {
        return 0.0;
    }
    let delta = angle_delta(bot.yaw, forward_to_yaw(flat));
    let max_step = turn_rate * dt;
    let step = delta.clamp(-max_step, max_step);
    bot.yaw = angle_delta(0.0, bot.yaw + step);
    (delta - step).abs()
}

/// Critically hurt, or hurt and taking repeated hits, after the minimum
/// engagement time and outside the retreat cooldown.
pub fn should_retreat(bot: &Bot, profile: &DifficultyProfile) -> bool {
    if bot.combat.engage_time < profile.retreat_min_engage_secs || bot.combat.retreat_cooldown > 0.0 {
        return false;
    }
    let health = bot.health_fraction();
    health < CRITICAL_HEALTH_FRACTION
        || (health < LOW_HEALTH_FRACTION && bot.combat.recent_hits.len() >= REPEATED_HIT_COUNT)
}

/// The collision correction points back at the shooter when a wall sits
/// between it and the target.
fn firing_into_wall(bot: &Bot, to_target: Vec3) -> bool {
    if !bot.nav.has_wall_contact() {
        return false;
    }
    let push = horizontal(bot.nav.wall_contact).normalize_or_zero();
    let aim = horizontal(to_target).normalize_or_zero();
    push.dot(aim) < -0.5
}

/// One trigger pull. The sight line is re-tested here, so a target known only
/// from memory is never damaged.
pub fn try_fire(
    bot: &mut Bot,
    target: CombatTarget,
    aim_point: Vec3,
    ctx: &TickContext,
    fx: &mut TickEffects,
) -> FireOutcome {
    let profile = ctx.profile;
    if bot.status.is_stunned() {
        return FireOutcome::Held(HoldReason::Stunned);
    }
    if bot.combat.reaction > 0.0 || bot.combat.first_shot > 0.0 {
        return FireOutcome::Held(HoldReason::Reacting);
    }
    if bot.combat.shot_cooldown > 0.0 || bot.combat.burst_pause > 0.0 {
        return FireOutcome::Held(HoldReason::Cooldown);
    }

    let eye = bot.eye_position(ctx.config.body.eye_height);
    let to_target = aim_point - eye;
    let flat = horizontal(to_target);
    let desired_yaw = forward_to_yaw(flat);
    if flat.length_squared() > 1e-6 && angle_delta(bot.yaw, desired_yaw).abs() > AIM_FIRE_TOLERANCE_RAD {
        return FireOutcome::Held(HoldReason::Aiming);
    }
    if firing_into_wall(bot, to_target) {
        return FireOutcome::Held(HoldReason::WallContact);
    }
    if !line_of_sight(ctx.world, ctx.smokes, eye, aim_point) {
        trace!("[Bot {} ({})]: held fire, {:?} occluded", bot.name, bot.id, target);
        return FireOutcome::Occluded;
    }

    let distance = to_target.length();
    let bound = aim_error_bound(distance, profile);
    let error = rand_between(fx.rng, -bound, bound);
    let precision = if bound > f32::EPSILON { 1.0 - 0.5 * error.abs() / bound } else { 1.0 };
    let hit = chance(fx.rng, hit_chance(distance, profile) * precision);
    let headshot = hit && chance(fx.rng, profile.headshot_chance);

    let direction = (yaw_to_forward(desired_yaw + error) * flat.length() + Vec3::Y * to_target.y).normalize_or_zero();
    let amount = bot.weapon.damage() * if headshot { HEADSHOT_MULTIPLIER } else { 1.0 };

    let mut killed = false;
    let mut applied = 0.0;
    if hit {
        match fx.damage.as_deref_mut() {
            Some(service) => {
                let info = DamageInfo { source: bot.id, source_team: bot.team, weapon: bot.weapon, amount, headshot };
                killed = service.apply_damage(target, info);
                applied = amount;
                if let CombatTarget::Agent(victim) = target {
                    fx.hits.push(HitRecord { victim, source: bot.id, source_position: bot.position });
                }
                if killed {
                    bot.kills += 1;
                    fx.kills.push(KillRecord { target, killer: bot.id });
                    debug!("[Bot {} ({})]: killed {:?}", bot.name, bot.id, target);
                }
            }
            None => trace!("[Bot {} ({})]: hit {:?} but no damage service is attached", bot.name, bot.id, target),
        }
    }

    fx.events.push(BotEvent::ShotFired {
        shooter: bot.id,
        target,
        origin: eye,
        direction,
        hit,
        headshot,
        damage: applied,
    });
    fx.metrics.record_shot(hit);

    bot.combat.shot_cooldown = bot.weapon.cadence_seconds();
    bot.combat.burst_left = bot.combat.burst_left.saturating_sub(1);
    if bot.combat.burst_left == 0 {
        bot.combat.burst_pause = sample_range(fx.rng, profile.burst_pause);
        bot.combat.burst_left = burst_length(profile, fx.rng);
    }

    FireOutcome::Fired { hit, headshot, killed }
}

/// Rolls for a frag onto an occluded last known position or a flash at a
/// visible target in mid range. The host resolves the throw.
pub fn maybe_throw_item(
    bot: &mut Bot,
    target_point: Vec3,
    visible: bool,
    distance: f32,
    ctx: &TickContext,
    fx: &mut TickEffects,
) -> Option<TacticalItemKind> {
    if bot.combat.tactical_cooldown > 0.0 || bot.combat.tactical_roll > 0.0 || bot.status.is_stunned() {
        return None;
    }
    bot.combat.tactical_roll = TACTICAL_ITEM_ROLL_SECS;
    if !chance(fx.rng, TACTICAL_ITEM_BASE_CHANCE * (0.5 + ctx.profile.aggression)) {
        return None;
    }

    let (kind, at) = if !visible && bot.perception.time_since_los >= TACTICAL_ITEM_OCCLUDED_SECS {
        (TacticalItemKind::Frag, bot.perception.last_known?)
    } else if visible && (FLASH_MIN_DISTANCE..=FLASH_MAX_DISTANCE).contains(&distance) {
        (TacticalItemKind::Flash, target_point)
    } else {
        return None;
    };

    emit_item(bot, kind, at, fx);
    Some(kind)
}

/// Covers a retreat. Ignores the roll timer but honours the item cooldown.
pub fn throw_smoke(bot: &mut Bot, at: Vec3, fx: &mut TickEffects) -> bool {
    if bot.combat.tactical_cooldown > 0.0 || bot.status.is_stunned() {
        return false;
    }
    emit_item(bot, TacticalItemKind::Smoke, at, fx);
    true
}

fn emit_item(bot: &mut Bot, kind: TacticalItemKind, at: Vec3, fx: &mut TickEffects) {
    bot.combat.tactical_cooldown = rand_between(fx.rng, TACTICAL_ITEM_MIN_COOLDOWN, TACTICAL_ITEM_MAX_COOLDOWN);
    debug!("[Bot {} ({})]: throwing {:?} at {:?}", bot.name, bot.id, kind, at);
    fx.events.push(BotEvent::TacticalItem { thrower: bot.id, team: bot.team, kind, target: at });
}
