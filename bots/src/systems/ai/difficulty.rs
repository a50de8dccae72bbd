// tactical_bots_core/bots/src/systems/ai/difficulty.rs
//! Named tuning tables read by the bot controller. One profile is selected per
//! match and shared by every agent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{BotError, BotResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    Easy,
    Normal,
    Hard,
    Expert,
}

impl Default for DifficultyTier {
    fn default() -> Self {
        DifficultyTier::Normal
    }
}

impl DifficultyTier {
    /// Easiest first.
    pub const ORDERED: [DifficultyTier; 4] =
        [DifficultyTier::Easy, DifficultyTier::Normal, DifficultyTier::Hard, DifficultyTier::Expert];

    pub fn name(self) -> &'static str {
        match self {
            DifficultyTier::Easy => "easy",
            DifficultyTier::Normal => "normal",
            DifficultyTier::Hard => "hard",
            DifficultyTier::Expert => "expert",
        }
    }

    pub fn profile(self) -> &'static DifficultyProfile {
        match self {
            DifficultyTier::Easy => &EASY,
            DifficultyTier::Normal => &NORMAL,
            DifficultyTier::Hard => &HARD,
            DifficultyTier::Expert => &EXPERT,
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DifficultyTier {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DifficultyTier::ORDERED
            .into_iter()
            .find(|tier| tier.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BotError::UnknownDifficulty(s.to_string()))
    }
}

/// Closed interval sampled with the controller's RNG.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Range { min, max }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyProfile {
    pub tier: DifficultyTier,
    /// Furthest distance at which a rival can be noticed.
    pub detection_range: f32,
    /// Preferred fighting distance before weapon range scaling.
    pub engage_range: f32,
    /// Cosine of the half field-of-view angle.
    pub fov_cos: f32,
    /// Seconds of accumulated sight needed before engaging.
    pub detect_time: Range,
    pub reaction_time: Range,
    pub first_shot_delay: Range,
    pub aim_error_mult: f32,
    pub hit_chance_mult: f32,
    pub headshot_chance: f32,
    /// 0..1, scales hunt rolls, tactical item use and flank appetite.
    pub aggression: f32,
    pub burst_shots: (u32, u32),
    pub burst_pause: Range,
    /// Radians per second.
    pub turn_rate: f32,
    pub retreat_min_engage_secs: f32,
    pub hunt_chance: f32,
    /// Seconds without sight before an engaged bot gives up and searches.
    pub lose_sight_grace: f32,
}

pub static EASY: DifficultyProfile = DifficultyProfile {
    tier: DifficultyTier::Easy,
    detection_range: 28.0,
    engage_range: 18.0,
    fov_cos: 0.42,
    detect_time: Range::new(0.55, 0.9),
    reaction_time: Range::new(0.45, 0.8),
    first_shot_delay: Range::new(0.35, 0.6),
    aim_error_mult: 2.2,
    hit_chance_mult: 0.55,
    headshot_chance: 0.04,
    aggression: 0.25,
    burst_shots: (2, 3),
    burst_pause: Range::new(0.7, 1.2),
    turn_rate: 2.5,
    retreat_min_engage_secs: 1.0,
    hunt_chance: 0.1,
    lose_sight_grace: 1.2,
};

pub static NORMAL: DifficultyProfile = DifficultyProfile {
    tier: DifficultyTier::Normal,
    detection_range: 36.0,
    engage_range: 24.0,
    fov_cos: 0.34,
    detect_time: Range::new(0.35, 0.6),
    reaction_time: Range::new(0.28, 0.5),
    first_shot_delay: Range::new(0.2, 0.4),
    aim_error_mult: 1.5,
    hit_chance_mult: 0.75,
    headshot_chance: 0.08,
    aggression: 0.45,
    burst_shots: (3, 4),
    burst_pause: Range::new(0.5, 0.9),
    turn_rate: 3.5,
    retreat_min_engage_secs: 1.5,
    hunt_chance: 0.2,
    lose_sight_grace: 1.6,
};

pub static HARD: DifficultyProfile = DifficultyProfile {
    tier: DifficultyTier::Hard,
    detection_range: 44.0,
    engage_range: 30.0,
    fov_cos: 0.26,
    detect_time: Range::new(0.22, 0.4),
    reaction_time: Range::new(0.18, 0.32),
    first_shot_delay: Range::new(0.12, 0.25),
    aim_error_mult: 1.0,
    hit_chance_mult: 0.9,
    headshot_chance: 0.14,
    aggression: 0.65,
    burst_shots: (3, 5),
    burst_pause: Range::new(0.35, 0.7),
    turn_rate: 5.0,
    retreat_min_engage_secs: 2.0,
    hunt_chance: 0.3,
    lose_sight_grace: 2.0,
};

pub static EXPERT: DifficultyProfile = DifficultyProfile {
    tier: DifficultyTier::Expert,
    detection_range: 52.0,
    engage_range: 36.0,
    fov_cos: 0.17,
    detect_time: Range::new(0.15, 0.28),
    reaction_time: Range::new(0.12, 0.22),
    first_shot_delay: Range::new(0.08, 0.16),
    aim_error_mult: 0.7,
    hit_chance_mult: 1.0,
    headshot_chance: 0.22,
    aggression: 0.8,
    burst_shots: (4, 6),
    burst_pause: Range::new(0.25, 0.5),
    turn_rate: 6.5,
    retreat_min_engage_secs: 2.5,
    hunt_chance: 0.4,
    lose_sight_grace: 2.5,
};

impl DifficultyProfile {
    /// Looks a profile up by its case-insensitive name.
    pub fn by_name(name: &str) -> BotResult<&'static DifficultyProfile> {
        name.parse::<DifficultyTier>().map(DifficultyTier::profile)
    }
}
