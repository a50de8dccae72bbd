// tactical_bots_core/bots/src/server/instance.rs
//! Host-facing bot subsystem: owns every bot, the navigation data and the
//! host's services, and steps the whole roster once per `update`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, trace, warn};

use crate::core::config::BotConfig;
use crate::core::constants::*;
use crate::core::error::{BotError, BotResult};
use crate::core::services::{DamageService, Services};
use crate::core::types::{
    angle_delta, forward_to_yaw, horizontal, AgentId, CombatTarget, LevelDescription, MinimapMarker,
    StatusEffectKind, Team, Vec3, WeaponKind,
};
use crate::entities::bot::{Bot, BotState};
use crate::operational::monitoring::metrics::BotMetrics;
use crate::server::events::{BotEvent, EventQueue};
use crate::systems::ai::bot_ai::{AgentSnapshot, BotAISystem, PlayerSnapshot, TickContext, TickEffects};
use crate::systems::ai::difficulty::DifficultyProfile;
use crate::systems::ai::perception::{line_of_sight, SmokeCloud};
use crate::systems::ai::route::RouteBuilder;
use crate::systems::ai::sample_range;
use crate::systems::ai::tactical::TacticalDirector;
use crate::systems::respawn::RespawnManager;
use crate::world::nav_grid::NavGrid;

pub struct BotSubsystem {
    config: BotConfig,
    profile: &'static DifficultyProfile,
    level: LevelDescription,
    routes: RouteBuilder,
    director: TacticalDirector,
    services: Services,
    bots: Vec<Bot>,
    smokes: Vec<SmokeCloud>,
    respawns: RespawnManager,
    events: EventQueue,
    rng: StdRng,
    metrics: BotMetrics,
    match_time: f32,
    frame: u64,
}

impl BotSubsystem {
    pub fn new(config: BotConfig, level: LevelDescription, services: Services) -> BotResult<Self> {
        config.validate()?;
        if !(level.bounds_max.x > level.bounds_min.x && level.bounds_max.y > level.bounds_min.y) {
            return Err(BotError::Level(format!(
                "empty level footprint {:?}..{:?}",
                level.bounds_min, level.bounds_max
            )));
        }
        if config.bots_per_team > 0 {
            for team in Team::ALL {
                if level.spawns_for(team).next().is_none() {
                    return Err(BotError::Level(format!("no spawn points for team {:?}", team)));
                }
            }
        }
        if level.objectives.is_empty() {
            warn!("Level has no objectives; bots will hold their spawn");
        }

        let mut grid = NavGrid::for_level(&level, &config.body, &config.navigation);
        let obstacles = services.world.as_ref().map(|w| w.obstacles()).unwrap_or_default();
        grid.rebuild(&obstacles);
        info!(
            "Navigation grid {}x{} built from {} obstacles ({} walkable cells)",
            grid.cols(),
            grid.rows(),
            obstacles.len(),
            grid.walkable_count()
        );

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(BotSubsystem {
            profile: config.difficulty.profile(),
            routes: RouteBuilder::new(grid, &config.navigation),
            director: TacticalDirector::new(&config.tactical),
            respawns: RespawnManager::new(&level),
            config,
            level,
            services,
            bots: Vec::new(),
            smokes: Vec::new(),
            events: EventQueue::new(),
            rng,
            metrics: BotMetrics::new(),
            match_time: 0.0,
            frame: 0,
        })
    }

    /// Spawns `bots_per_team` bots for each team. Replaces any existing roster.
    pub fn init(&mut self) -> BotResult<()> {
        self.clear();
        let objective_count = self.level.objectives.len().max(1);
        for team in Team::ALL {
            for slot in 0..self.config.bots_per_team {
                let id = self.bots.len();
                let weapon = WeaponKind::LOADOUT[slot % WeaponKind::LOADOUT.len()];
                let mut bot = Bot::new(id, team, weapon, Vec3::ZERO, self.config.body.max_health);
                bot.objective = (slot + id) % objective_count;
                self.bots.push(bot);
            }
        }
        for id in 0..self.bots.len() {
            self.spawn(id)?;
        }
        info!(
            "Spawned {} bots ({} per team) on {} difficulty",
            self.bots.len(),
            self.config.bots_per_team,
            self.profile.tier
        );
        Ok(())
    }

    /// Despawns every bot and forgets transient state.
    pub fn clear(&mut self) {
        if !self.bots.is_empty() {
            info!("Despawning {} bots", self.bots.len());
        }
        self.bots.clear();
        self.smokes.clear();
        self.events.clear();
        self.respawns.clear();
    }

    fn spawn(&mut self, id: AgentId) -> BotResult<()> {
        let team = self.bots.get(id).ok_or(BotError::NoSuchAgent(id))?.team;
        let enemies: Vec<Vec3> = self.bots.iter().filter(|b| b.alive && b.team != team && b.id != id).map(|b| b.position).collect();
        let position = self
            .respawns
            .choose_spawn(id, team, &enemies, self.routes.grid(), self.match_time, &mut self.rng)
            .ok_or_else(|| BotError::Level(format!("no spawn points for team {:?}", team)))?;

        let facing = self
            .level
            .objectives
            .get(self.bots[id].objective % self.level.objectives.len().max(1))
            .map(|o| o.center)
            .unwrap_or(Vec3::ZERO);
        let yaw = forward_to_yaw(horizontal(facing - position));
        let detect_need = sample_range(&mut self.rng, self.profile.detect_time);

        let bot = &mut self.bots[id];
        bot.reset_for_spawn(position, yaw, detect_need);
        if let Some(damage) = self.services.damage.as_deref_mut() {
            damage.register(CombatTarget::Agent(id), bot.max_health);
        }
        debug!("[Bot {} ({})]: spawned at {:?}", bot.name, bot.id, position);
        self.events.push(BotEvent::AgentRespawned { agent: id, position });
        Ok(())
    }

    /// Steps every bot by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            warn!("Ignoring bot update with dt={}", dt);
            return;
        }
        let started = Instant::now();
        self.frame += 1;
        self.match_time += dt;
        self.smokes.retain_mut(|s| {
            s.remaining -= dt;
            s.remaining > 0.0
        });

        self.sync_health();

        // A bot with a corrupt position is invisible to everyone else.
        let agents: Vec<AgentSnapshot> = self
            .bots
            .iter()
            .map(|b| AgentSnapshot { id: b.id, team: b.team, position: b.position, alive: b.alive && b.position.is_finite() })
            .collect();
        let player = self.services.player.as_deref().map(|p| PlayerSnapshot {
            position: p.position(),
            aim: p.aim_position(),
            team: p.team(),
            alive: p.is_alive(),
        });

        let ctx = TickContext {
            dt,
            profile: self.profile,
            config: &self.config,
            level: &self.level,
            routes: &self.routes,
            director: &self.director,
            world: self.services.world.as_deref(),
            agents: &agents,
            player,
            smokes: &self.smokes,
        };
        let mut fx = TickEffects {
            rng: &mut self.rng,
            events: &mut self.events,
            damage: self.services.damage.as_deref_mut(),
            metrics: &self.metrics,
            hits: Vec::new(),
            kills: Vec::new(),
        };

        for bot in self.bots.iter_mut() {
            let step_started = Instant::now();
            // A panicking host service must not take the rest of the roster down with it.
            let failure = match panic::catch_unwind(AssertUnwindSafe(|| BotAISystem::update_bot(bot, &ctx, &mut fx))) {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(payload) => Some(format!("panicked: {}", panic_message(&*payload))),
            };
            if let Some(reason) = failure {
                error!("[Bot {} ({})]: update failed, skipped this tick: {}", bot.name, bot.id, reason);
                self.metrics.record_step_error();
                bot.velocity = Vec3::ZERO;
                bot.nav.clear();
            }
            let elapsed = step_started.elapsed();
            if elapsed.as_millis() as u64 > SLOW_TICK_LOG_MS {
                warn!("[Bot {} ({})]: slow update took {:?}", bot.name, bot.id, elapsed);
            }
        }

        let TickEffects { hits, kills, .. } = fx;
        for hit in hits {
            self.alert_victim(hit.victim, hit.source_position);
        }
        for kill in kills {
            if let CombatTarget::Agent(victim) = kill.target {
                self.kill(victim, Some(kill.killer));
            }
        }

        self.respawn_ready();

        let alive = self.bots.iter().filter(|b| b.alive).count();
        self.metrics.record_tick(started.elapsed().as_secs_f64(), alive);
        if self.frame % 600 == 0 {
            trace!("Bot frame {}: {} alive, {} queued events", self.frame, alive, self.events.len());
        }
    }

    /// Pulls health from the damage service so damage dealt by the host shows up.
    fn sync_health(&mut self) {
        let Some(damage) = self.services.damage.as_deref() else {
            return;
        };
        let mut deaths = Vec::new();
        for bot in self.bots.iter_mut().filter(|b| b.alive) {
            let Some(health) = damage.health(CombatTarget::Agent(bot.id)) else {
                continue;
            };
            if health < bot.health - 1e-3 {
                bot.combat.record_hit();
                if bot.state.can_acquire_targets() {
                    bot.perception.seen_time =
                        bot.perception.seen_time.max(bot.perception.detect_need * HIT_ALERT_FRACTION);
                }
            }
            bot.health = health.min(bot.max_health);
            if bot.health <= 0.0 {
                deaths.push(bot.id);
            }
        }
        for id in deaths {
            self.kill(id, None);
        }
    }

    /// Being shot pulls the victim's attention toward the shooter.
    fn alert_victim(&mut self, victim: AgentId, source_position: Vec3) {
        let Some(bot) = self.bots.get_mut(victim).filter(|b| b.alive) else {
            return;
        };
        if bot.state.can_acquire_targets() {
            bot.perception.seen_time = bot.perception.seen_time.max(bot.perception.detect_need * HIT_ALERT_FRACTION);
            bot.perception.remember(source_position);
            let toward = forward_to_yaw(horizontal(source_position - bot.position));
            bot.yaw += angle_delta(bot.yaw, toward) * 0.5;
        }
    }

    fn kill(&mut self, victim: AgentId, killer: Option<AgentId>) {
        let respawn_delay = self.config.respawn_delay_secs;
        let Some(bot) = self.bots.get_mut(victim).filter(|b| b.alive) else {
            return;
        };
        bot.alive = false;
        bot.health = 0.0;
        bot.velocity = Vec3::ZERO;
        bot.deaths += 1;
        bot.nav.clear();
        bot.intent = None;
        let from = bot.state.kind();
        bot.state = BotState::Dead { respawn_in: respawn_delay };
        debug!("[Bot {} ({})]: died (killer {:?})", bot.name, bot.id, killer);
        self.respawns.record_death(victim, bot.position, self.match_time);
        self.events.push(BotEvent::StateChanged { agent: victim, from, to: bot.state.kind() });
        self.events.push(BotEvent::AgentDied { agent: victim, killer });
    }

    fn respawn_ready(&mut self) {
        let ready: Vec<AgentId> = self
            .bots
            .iter()
            .filter(|b| matches!(b.state, BotState::Dead { respawn_in } if respawn_in <= 0.0))
            .map(|b| b.id)
            .collect();
        for id in ready {
            if let Err(e) = self.spawn(id) {
                error!("Respawn of agent {} failed: {}", id, e);
            }
        }
    }

    /// Read-only minimap data for every living bot.
    pub fn minimap_markers(&self) -> Vec<MinimapMarker> {
        self.bots
            .iter()
            .filter(|b| b.alive)
            .map(|b| MinimapMarker { agent: b.id, position: b.position, team: b.team })
            .collect()
    }

    /// Area effect from an external grenade or ability. Friendly bots of
    /// `source_team` are spared. Returns how many bots were affected.
    pub fn apply_status_effect(
        &mut self,
        kind: StatusEffectKind,
        position: Vec3,
        radius: f32,
        duration: f32,
        source_team: Team,
    ) -> usize {
        if !(radius > 0.0 && duration > 0.0) {
            return 0;
        }
        if kind == StatusEffectKind::Obscure {
            self.smokes.push(SmokeCloud { center: position, radius, remaining: duration });
            debug!("Smoke at {:?} (r={:.1}) for {:.1}s", position, radius, duration);
            return 0;
        }

        let eye_height = self.config.body.eye_height;
        let world = self.services.world.as_deref();
        let mut affected = 0;
        for bot in self.bots.iter_mut().filter(|b| b.alive && b.team != source_team) {
            let eye = bot.eye_position(eye_height);
            if eye.distance(position) > radius {
                continue;
            }
            match kind {
                StatusEffectKind::Blind => {
                    if !line_of_sight(world, &self.smokes, position, eye) {
                        continue;
                    }
                    bot.status.blind = bot.status.blind.max(duration);
                    bot.perception.visible = false;
                }
                StatusEffectKind::Stun => bot.status.stunned = bot.status.stunned.max(duration),
                StatusEffectKind::Obscure => {}
            }
            affected += 1;
            trace!("[Bot {} ({})]: {:?} for {:.1}s", bot.name, bot.id, kind, duration);
        }
        affected
    }

    /// Re-rasterizes the grid from the world service's current obstacles and
    /// invalidates every route.
    pub fn rebuild_navigation(&mut self) {
        let obstacles = self.services.world.as_ref().map(|w| w.obstacles()).unwrap_or_default();
        self.routes.rebuild(&obstacles);
        for bot in &mut self.bots {
            bot.nav.needs_repath = true;
        }
        info!("Navigation rebuilt from {} obstacles", obstacles.len());
    }

    pub fn drain_events(&mut self) -> Vec<BotEvent> {
        self.events.drain()
    }

    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    pub fn bot(&self, id: AgentId) -> Option<&Bot> {
        self.bots.get(id)
    }

    pub fn bot_mut(&mut self, id: AgentId) -> Option<&mut Bot> {
        self.bots.get_mut(id)
    }

    pub fn routes(&self) -> &RouteBuilder {
        &self.routes
    }

    pub fn level(&self) -> &LevelDescription {
        &self.level
    }

    pub fn profile(&self) -> &'static DifficultyProfile {
        self.profile
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn smokes(&self) -> &[SmokeCloud] {
        &self.smokes
    }

    pub fn damage_service(&self) -> Option<&dyn DamageService> {
        self.services.damage.as_deref()
    }

    pub fn damage_service_mut(&mut self) -> Option<&mut (dyn DamageService + 'static)> {
        self.services.damage.as_deref_mut()
    }

    pub fn match_time(&self) -> f32 {
        self.match_time
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn metrics(&self) -> &BotMetrics {
        &self.metrics
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
