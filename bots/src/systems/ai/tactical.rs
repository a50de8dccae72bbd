// tactical_bots_core/bots/src/systems/ai/tactical.rs
//! Utility-scored choice of a bot's long-term destination.
//!
//! Candidates come from four sources: the objective area, the ground around
//! the bot, the nearest teammate, and a straight preview toward the
//! objective. Each is scored as a weighted sum and one of the top-K is drawn
//! with probability proportional to its score, so squads spread out instead
//! of stacking on the single best point.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, trace};

use crate::core::config::TacticalConfig;
use crate::core::types::{horizontal, horizontal_distance, Objective, Vec3};
use crate::entities::bot::Bot;
use crate::systems::ai::bot_ai::TickContext;
use crate::systems::ai::flank::plan_flank;
use crate::systems::ai::{chance, rand_between};

const OBJECTIVE_SAMPLES: usize = 4;
const AROUND_SAMPLES: usize = 4;
const TEAMMATE_SAMPLES: usize = 3;
const PREVIEW_FRACTIONS: [f32; 3] = [0.25, 0.5, 0.75];
const PREFERRED_TEAMMATE_SPACING: f32 = 6.0;
const TEAMMATE_SPACING_SIGMA: f32 = 3.0;
const NOVELTY_RADIUS: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IntentKind {
    ObjectivePush,
    GroupUp,
    Patrol,
    Flank,
}

/// Replaces a bot's long-term destination. Never touches its combat target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TacticalIntent {
    pub kind: IntentKind,
    /// Visited before `final_point` when present.
    pub mid_point: Option<Vec3>,
    pub final_point: Vec3,
}

impl TacticalIntent {
    pub fn next_point(&self) -> Vec3 {
        self.mid_point.unwrap_or(self.final_point)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub point: Vec3,
    pub kind: IntentKind,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilityWeights {
    pub objective: f32,
    pub novelty: f32,
    pub spacing: f32,
    pub forward: f32,
    pub low_openness: f32,
}

impl Default for UtilityWeights {
    fn default() -> Self {
        UtilityWeights { objective: 1.0, novelty: 0.6, spacing: 0.5, forward: 0.3, low_openness: 0.8 }
    }
}

#[derive(Debug, Clone)]
pub struct TacticalDirector {
    pub weights: UtilityWeights,
    pub top_k: usize,
    pub flank_chance: f32,
}

impl TacticalDirector {
    pub fn new(config: &TacticalConfig) -> Self {
        TacticalDirector { weights: UtilityWeights::default(), top_k: config.top_k.max(1), flank_chance: config.flank_chance }
    }

    /// Raw candidate points snapped onto walkable ground.
    pub fn candidates<R: Rng + ?Sized>(
        &self,
        bot: &Bot,
        objective: &Objective,
        teammate: Option<Vec3>,
        ctx: &TickContext,
        rng: &mut R,
    ) -> Vec<(Vec3, IntentKind)> {
        let mut raw = Vec::with_capacity(OBJECTIVE_SAMPLES + AROUND_SAMPLES + TEAMMATE_SAMPLES + PREVIEW_FRACTIONS.len());
        let ring = |rng: &mut R, centre: Vec3, min: f32, max: f32| {
            let angle = rand_between(rng, 0.0, std::f32::consts::TAU);
            let distance = rand_between(rng, min, max);
            centre + Vec3::new(angle.cos(), 0.0, angle.sin()) * distance
        };

        for _ in 0..OBJECTIVE_SAMPLES {
            raw.push((ring(&mut *rng, objective.center, 0.0, objective.radius * 0.8), IntentKind::ObjectivePush));
        }
        for _ in 0..AROUND_SAMPLES {
            raw.push((ring(&mut *rng, bot.position, 4.0, 10.0), IntentKind::Patrol));
        }
        if let Some(mate) = teammate {
            for _ in 0..TEAMMATE_SAMPLES {
                raw.push((ring(&mut *rng, mate, 2.0, 4.0), IntentKind::GroupUp));
            }
        }
        for t in PREVIEW_FRACTIONS {
            raw.push((bot.position.lerp(objective.center, t), IntentKind::ObjectivePush));
        }

        raw.into_iter()
            .filter_map(|(point, kind)| ctx.routes.nudge_to_walkable(point).map(|p| (p, kind)))
            .collect()
    }

    pub fn score(&self, bot: &Bot, point: Vec3, objective: &Objective, teammate: Option<Vec3>, ctx: &TickContext) -> f32 {
        let w = &self.weights;

        let objective_norm = (objective.radius * 4.0).max(1.0);
        let proximity = 1.0 - (horizontal_distance(point, objective.center) / objective_norm).clamp(0.0, 1.0);

        let novelty = bot
            .visited
            .iter()
            .map(|v| horizontal_distance(*v, point))
            .fold(None, |acc: Option<f32>, d| Some(acc.map_or(d, |a| a.min(d))))
            .map_or(1.0, |d| (d / NOVELTY_RADIUS).clamp(0.0, 1.0));

        let spacing = teammate.map_or(0.5, |mate| {
            let d = horizontal_distance(point, mate) - PREFERRED_TEAMMATE_SPACING;
            (-(d * d) / (2.0 * TEAMMATE_SPACING_SIGMA * TEAMMATE_SPACING_SIGMA)).exp()
        });

        let heading = horizontal(point - bot.position).normalize_or_zero();
        let forward = heading.dot(bot.forward()).max(0.0);

        let openness = f32::from(ctx.routes.grid().openness_at(point));
        let cramped = (8.0 - openness) / 8.0;

        w.objective * (1.0 + ctx.profile.aggression) * proximity + w.novelty * novelty + w.spacing * spacing
            + w.forward * forward
            - w.low_openness * cramped
    }

    /// Scores every candidate and draws one of the best `top_k`, possibly
    /// bending the route through a flank point. `None` when nothing is walkable.
    pub fn choose<R: Rng + ?Sized>(
        &self,
        bot: &Bot,
        objective: &Objective,
        ctx: &TickContext,
        rng: &mut R,
    ) -> Option<TacticalIntent> {
        let teammate = ctx
            .agents
            .iter()
            .filter(|a| a.alive && a.team == bot.team && a.id != bot.id)
            .min_by(|a, b| {
                horizontal_distance(a.position, bot.position).total_cmp(&horizontal_distance(b.position, bot.position))
            })
            .map(|a| a.position);

        let mut scored: Vec<Candidate> = self
            .candidates(bot, objective, teammate, ctx, rng)
            .into_iter()
            .map(|(point, kind)| Candidate { point, kind, score: self.score(bot, point, objective, teammate, ctx) })
            .collect();
        if scored.is_empty() {
            return None;
        }
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.top_k);

        for c in &scored {
            trace!("[Bot {} ({})]: candidate {:?} {:?} score={:.3}", bot.name, bot.id, c.kind, c.point, c.score);
        }

        let pick = pick_weighted(&scored, rng);
        let mut intent = TacticalIntent { kind: pick.kind, mid_point: None, final_point: pick.point };

        if chance(rng, self.flank_chance) {
            if let Some(mid) = plan_flank(ctx.routes.grid(), bot.position, pick.point, rng) {
                intent.kind = IntentKind::Flank;
                intent.mid_point = Some(mid);
            }
        }

        debug!(
            "[Bot {} ({})]: tactical intent {:?} -> {:?} (score={:.3})",
            bot.name, bot.id, intent.kind, intent.final_point, pick.score
        );
        Some(intent)
    }
}

/// Draws from `top` with weight `score - min + 0.05`; `top` must be non-empty.
fn pick_weighted<R: Rng + ?Sized>(top: &[Candidate], rng: &mut R) -> Candidate {
    let floor = top.iter().map(|c| c.score).fold(f32::INFINITY, f32::min);
    let weights: Vec<f32> = top.iter().map(|c| c.score - floor + 0.05).collect();
    match WeightedIndex::new(&weights) {
        Ok(dist) => top[dist.sample(rng)],
        Err(_) => top[0],
    }
}
