// tactical_bots_core/bots/src/systems/ai/perception.rs
//! Range, field-of-view and occlusion tests plus the "seen" accumulator that
//! turns sustained sight into a detection.

use crate::core::constants::*;
use crate::core::services::WorldQuery;
use crate::core::types::{horizontal, CombatTarget, Vec3};
use crate::entities::bot::{Bot, Perception};
use crate::systems::ai::bot_ai::TickContext;

/// Smoke volume that blocks sight for every team until it dissipates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmokeCloud {
    pub center: Vec3,
    pub radius: f32,
    pub remaining: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    pub target: CombatTarget,
    /// Feet position.
    pub position: Vec3,
    pub aim_point: Vec3,
    pub distance: f32,
}

fn segment_hits_sphere(from: Vec3, to: Vec3, center: Vec3, radius: f32) -> bool {
    let seg = to - from;
    let len_sq = seg.length_squared();
    let t = if len_sq > f32::EPSILON { ((center - from).dot(seg) / len_sq).clamp(0.0, 1.0) } else { 0.0 };
    (from + seg * t).distance_squared(center) <= radius * radius
}

/// Occlusion test between two eye-level points. Decals, agent bodies and
/// non-blocking markers are stepped over; any smoke cloud on the segment
/// blocks. Without a world every unsmoked segment is clear.
pub fn line_of_sight(world: Option<&dyn WorldQuery>, smokes: &[SmokeCloud], from: Vec3, to: Vec3) -> bool {
    if smokes.iter().any(|s| segment_hits_sphere(from, to, s.center, s.radius)) {
        return false;
    }
    let delta = to - from;
    let distance = delta.length();
    if distance <= f32::EPSILON {
        return true;
    }
    let Some(world) = world else {
        return true;
    };
    let dir = delta / distance;
    let mut origin = from;
    let mut remaining = distance;
    for _ in 0..MAX_RAY_PASSES {
        match world.raycast(origin, dir, remaining) {
            None => return true,
            Some(hit) if hit.distance >= remaining => return true,
            Some(hit) if hit.tags.blocks_sight() => return false,
            Some(hit) => {
                let advance = hit.distance.max(0.0) + RAY_SKIP_EPSILON;
                origin += dir * advance;
                remaining -= advance;
                if remaining <= 0.0 {
                    return true;
                }
            }
        }
    }
    // A stack of see-through surfaces this deep is treated as a wall.
    false
}

/// Range, cone and occlusion, in that order.
pub fn can_see(eye: Vec3, forward: Vec3, aim_point: Vec3, range: f32, fov_cos: f32, ctx: &TickContext) -> bool {
    let to_target = aim_point - eye;
    let distance = to_target.length();
    if distance > range {
        return false;
    }
    let flat = horizontal(to_target).normalize_or_zero();
    if flat != Vec3::ZERO && flat.dot(forward) < fov_cos {
        return false;
    }
    line_of_sight(ctx.world, ctx.smokes, eye, aim_point)
}

/// Current position of `target`, or `None` once it is dead or gone.
pub fn locate(target: CombatTarget, viewer: &Bot, ctx: &TickContext) -> Option<(Vec3, Vec3)> {
    match target {
        CombatTarget::Agent(id) => ctx
            .agents
            .get(id)
            .filter(|a| a.alive && a.team != viewer.team)
            .map(|a| (a.position, a.position + Vec3::Y * TARGET_TORSO_HEIGHT)),
        CombatTarget::Player => ctx
            .player
            .filter(|p| p.alive && p.team != viewer.team)
            .map(|p| (p.position, p.position + Vec3::Y * TARGET_TORSO_HEIGHT)),
    }
}

/// Nearest visible rival: agents first, then the human player. A player who
/// is aiming at the viewer ranks as if at half distance.
pub fn scan(bot: &Bot, ctx: &TickContext) -> Option<Sighting> {
    if bot.status.is_blind() {
        return None;
    }
    let eye = bot.eye_position(ctx.config.body.eye_height);
    let forward = bot.forward();
    let range = ctx.profile.detection_range;
    let mut best: Option<(f32, Sighting)> = None;

    for agent in ctx.agents.iter().filter(|a| a.alive && a.team != bot.team && a.id != bot.id) {
        let aim_point = agent.position + Vec3::Y * TARGET_TORSO_HEIGHT;
        if !can_see(eye, forward, aim_point, range, ctx.profile.fov_cos, ctx) {
            continue;
        }
        let distance = eye.distance(aim_point);
        if best.map_or(true, |(rank, _)| distance < rank) {
            best = Some((
                distance,
                Sighting { target: CombatTarget::Agent(agent.id), position: agent.position, aim_point, distance },
            ));
        }
    }

    if let Some(player) = ctx.player.filter(|p| p.alive && p.team != bot.team) {
        let aim_point = player.position + Vec3::Y * TARGET_TORSO_HEIGHT;
        if can_see(eye, forward, aim_point, range, ctx.profile.fov_cos, ctx) {
            let distance = eye.distance(aim_point);
            let threatening = player.aim.distance(bot.position + Vec3::Y * TARGET_TORSO_HEIGHT) < 1.5;
            let rank = if threatening { distance * 0.5 } else { distance };
            if best.map_or(true, |(r, _)| rank < r) {
                best = Some((rank, Sighting { target: CombatTarget::Player, position: player.position, aim_point, distance }));
            }
        }
    }

    best.map(|(_, sighting)| sighting)
}

/// Grows the seen timer at 1x while visible, decays it at `SEEN_DECAY_RATE`x
/// otherwise. Ages the last known position.
pub fn accumulate(perception: &mut Perception, sighting: Option<&Sighting>, dt: f32) {
    match sighting {
        Some(s) => {
            perception.visible = true;
            perception.candidate = Some(s.target);
            perception.time_since_los = 0.0;
            perception.remember(s.position);
            perception.seen_time = (perception.seen_time + dt).min(perception.detect_need.max(0.0) + 1.0);
        }
        None => {
            perception.visible = false;
            perception.time_since_los += dt;
            perception.seen_time = (perception.seen_time - SEEN_DECAY_RATE * dt).max(0.0);
            perception.last_known_age += dt;
            if perception.last_known_age > LAST_KNOWN_MEMORY_SECS {
                perception.last_known = None;
            }
            if perception.seen_time <= 0.0 {
                perception.candidate = None;
            }
        }
    }
}

pub fn detected(perception: &Perception) -> bool {
    perception.visible && perception.seen_time >= perception.detect_need
}
