// tactical_bots_core/bots/src/core/config.rs
use std::path::Path;

use serde::Deserialize;

use crate::core::constants::*;
use crate::core::error::{BotError, BotResult};
use crate::systems::ai::difficulty::DifficultyTier;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentBodyConfig {
    pub radius: f32,
    pub half_height: f32,
    pub eye_height: f32,
    pub foot_clearance: f32,
    pub max_speed: f32,
    pub max_health: f32,
}

impl Default for AgentBodyConfig {
    fn default() -> Self {
        AgentBodyConfig {
            radius: AGENT_RADIUS,
            half_height: AGENT_HALF_HEIGHT,
            eye_height: AGENT_EYE_HEIGHT,
            foot_clearance: AGENT_FOOT_CLEARANCE,
            max_speed: AGENT_MAX_SPEED,
            max_health: AGENT_MAX_HEALTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub cell_size: f32,
    pub max_expansions: usize,
    pub heuristic_weight: f32,
    pub wall_penalty: f32,
    pub snap_ring: i32,
    pub smooth_lookahead: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        NavigationConfig {
            cell_size: NAV_CELL_SIZE,
            max_expansions: NAV_MAX_EXPANSIONS,
            heuristic_weight: NAV_HEURISTIC_WEIGHT,
            wall_penalty: NAV_WALL_PENALTY,
            snap_ring: NAV_SNAP_RING,
            smooth_lookahead: NAV_SMOOTH_LOOKAHEAD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TacticalConfig {
    pub interval_secs: f32,
    pub top_k: usize,
    pub flank_chance: f32,
}

impl Default for TacticalConfig {
    fn default() -> Self {
        TacticalConfig {
            interval_secs: TACTICAL_INTERVAL_SECS,
            top_k: TACTICAL_TOP_K,
            flank_chance: FLANK_CHANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub bots_per_team: usize,
    pub difficulty: DifficultyTier,
    /// Fixed seed for reproducible matches; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub respawn_delay_secs: f32,
    pub body: AgentBodyConfig,
    pub navigation: NavigationConfig,
    pub tactical: TacticalConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            bots_per_team: 5,
            difficulty: DifficultyTier::Normal,
            seed: None,
            respawn_delay_secs: DEFAULT_RESPAWN_DELAY_SECS,
            body: AgentBodyConfig::default(),
            navigation: NavigationConfig::default(),
            tactical: TacticalConfig::default(),
        }
    }
}

impl BotConfig {
    pub fn from_yaml_str(text: &str) -> BotResult<Self> {
        let config: BotConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> BotResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> BotResult<()> {
        let positive = [
            ("body.radius", self.body.radius),
            ("body.half_height", self.body.half_height),
            ("body.eye_height", self.body.eye_height),
            ("body.max_speed", self.body.max_speed),
            ("body.max_health", self.body.max_health),
            ("navigation.cell_size", self.navigation.cell_size),
            ("tactical.interval_secs", self.tactical.interval_secs),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(BotError::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        if self.navigation.heuristic_weight < 1.0 {
            return Err(BotError::Config(format!(
                "navigation.heuristic_weight must be >= 1.0, got {}",
                self.navigation.heuristic_weight
            )));
        }
        if self.navigation.wall_penalty < 0.0 {
            return Err(BotError::Config("navigation.wall_penalty must not be negative".into()));
        }
        if self.navigation.max_expansions == 0 || self.navigation.snap_ring < 0 {
            return Err(BotError::Config("navigation budget and snap ring must be usable".into()));
        }
        if !(0.0..=1.0).contains(&self.tactical.flank_chance) {
            return Err(BotError::Config(format!(
                "tactical.flank_chance must be within [0, 1], got {}",
                self.tactical.flank_chance
            )));
        }
        if self.tactical.top_k == 0 {
            return Err(BotError::Config("tactical.top_k must be at least 1".into()));
        }
        if self.respawn_delay_secs < 0.0 {
            return Err(BotError::Config("respawn_delay_secs must not be negative".into()));
        }
        if self.body.foot_clearance >= self.body.eye_height {
            return Err(BotError::Config("body.foot_clearance must sit below body.eye_height".into()));
        }
        Ok(())
    }
}
