// tactical_bots_core/bots/src/systems/respawn.rs

use std::collections::HashMap;

use rand::Rng;
use tracing::{debug, warn};

use crate::core::constants::*;
use crate::core::types::{horizontal_distance, AgentId, LevelDescription, Team, Vec3};
use crate::world::nav_grid::NavGrid;

const TOP_CANDIDATES: usize = 3;
const DEATH_MEMORY_SECS: f32 = 60.0;

#[derive(Clone, Debug)]
pub struct SpawnPoint {
    pub position: Vec3,
    pub team: Team,
    /// Match time of the last spawn here; `None` if never used.
    pub last_used: Option<f32>,
}

/// Picks team spawn points away from enemies, away from where the bot last
/// died and not reused back to back. Times are match seconds.
pub struct RespawnManager {
    spawn_points: Vec<SpawnPoint>,
    recent_deaths: HashMap<AgentId, (Vec3, f32)>,
}

impl RespawnManager {
    pub fn new(level: &LevelDescription) -> Self {
        let spawn_points = level
            .spawns
            .iter()
            .map(|s| SpawnPoint { position: s.position, team: s.team, last_used: None })
            .collect();
        RespawnManager { spawn_points, recent_deaths: HashMap::new() }
    }

    pub fn spawn_points(&self) -> &[SpawnPoint] {
        &self.spawn_points
    }

    pub fn record_death(&mut self, agent: AgentId, position: Vec3, now: f32) {
        self.recent_deaths.insert(agent, (position, now));
        self.recent_deaths.retain(|_, (_, at)| now - *at < DEATH_MEMORY_SECS);
    }

    pub fn clear(&mut self) {
        self.recent_deaths.clear();
        for sp in &mut self.spawn_points {
            sp.last_used = None;
        }
    }

    fn score(&self, sp: &SpawnPoint, death: Option<Vec3>, enemies: &[Vec3], now: f32) -> f32 {
        let mut score = 100.0;
        if let Some(used) = sp.last_used {
            let since = now - used;
            if since < SPAWN_REUSE_PENALTY_SECS {
                score -= (SPAWN_REUSE_PENALTY_SECS - since) * 15.0;
            }
        }
        if let Some(death) = death {
            score += horizontal_distance(sp.position, death) * 0.1;
        }
        let nearest_enemy = enemies
            .iter()
            .map(|e| horizontal_distance(sp.position, *e))
            .fold(f32::MAX, f32::min);
        if nearest_enemy < SAFE_SPAWN_RADIUS_FROM_ENEMY {
            score -= (SAFE_SPAWN_RADIUS_FROM_ENEMY - nearest_enemy) * 4.0;
        } else if nearest_enemy < f32::MAX {
            score += nearest_enemy * 0.05;
        }
        score.max(0.0)
    }

    /// Draws one of the best few walkable spawns for `team`. `None` when the
    /// team has no spawn points at all.
    pub fn choose_spawn<R: Rng + ?Sized>(
        &mut self,
        agent: AgentId,
        team: Team,
        enemies: &[Vec3],
        grid: &NavGrid,
        now: f32,
        rng: &mut R,
    ) -> Option<Vec3> {
        let death = self.recent_deaths.get(&agent).map(|(p, _)| *p);
        let mut scored: Vec<(usize, f32)> = self
            .spawn_points
            .iter()
            .enumerate()
            .filter(|(_, sp)| sp.team == team && grid.is_walkable_at(sp.position))
            .map(|(idx, sp)| (idx, self.score(sp, death, enemies, now)))
            .collect();

        if scored.is_empty() {
            // Every team spawn is blocked; use any of them rather than none.
            let fallback = self.spawn_points.iter().position(|sp| sp.team == team)?;
            warn!("All {:?} spawn points are blocked, using spawn {} for agent {}", team, fallback, agent);
            self.spawn_points[fallback].last_used = Some(now);
            return Some(self.spawn_points[fallback].position);
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(TOP_CANDIDATES);
        let (idx, score) = scored[rng.gen_range(0..scored.len())];
        self.spawn_points[idx].last_used = Some(now);
        debug!("Agent {} ({:?}) spawning at {:?} (score {:.1})", agent, team, self.spawn_points[idx].position, score);
        Some(self.spawn_points[idx].position)
    }
}
