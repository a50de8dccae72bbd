// tactical_bots_core/bots/src/core/constants.rs
use std::time::Duration;

pub const DEFAULT_TICK_RATE: u64 = 60;
pub const TICK_DURATION_MS: u64 = 1000 / DEFAULT_TICK_RATE;
pub const TICK_DURATION: Duration = Duration::from_millis(TICK_DURATION_MS);
pub const SLOW_TICK_LOG_MS: u64 = 8; // warn if one bot update exceeds this

// Agent body
pub const AGENT_RADIUS: f32 = 0.35;
pub const AGENT_HALF_HEIGHT: f32 = 0.9;
pub const AGENT_EYE_HEIGHT: f32 = 1.6;
pub const AGENT_FOOT_CLEARANCE: f32 = 0.25; // boxes entirely below this never block walking
pub const AGENT_MAX_SPEED: f32 = 4.5;
pub const AGENT_MAX_HEALTH: f32 = 100.0;
pub const TARGET_TORSO_HEIGHT: f32 = 1.2;

// Navigation
pub const NAV_CELL_SIZE: f32 = 1.0;
pub const NAV_MAX_EXPANSIONS: usize = 8_000;
pub const NAV_HEURISTIC_WEIGHT: f32 = 1.15;
pub const NAV_WALL_PENALTY: f32 = 0.35;
pub const NAV_SNAP_RING: i32 = 4;
pub const NAV_SMOOTH_LOOKAHEAD: usize = 12;

// Route following
pub const WAYPOINT_REACHED_DISTANCE: f32 = 0.6;
pub const WAYPOINT_DEVIATION_LIMIT: f32 = 4.0;
pub const REPATH_INTERVAL_SECS: f32 = 1.5;
pub const SNAP_RETRY_SECS: f32 = 0.2;
pub const ROUTE_ALTERNATIVES: usize = 4;
pub const ROUTE_ALTERNATIVE_MIN_RADIUS: f32 = 3.0;
pub const ROUTE_ALTERNATIVE_MAX_RADIUS: f32 = 8.0;
pub const MAX_ROUTE_FAILURES: u32 = 3;

// Stuck watchdog
pub const STUCK_WINDOW_SECS: f32 = 0.85;
pub const STUCK_MIN_SPEED: f32 = 0.35;
pub const STUCK_MIN_PROGRESS: f32 = 0.25;
pub const STUCK_NUDGE_DISTANCE: f32 = 0.6;
pub const STUCK_NUDGE_DECAY_SECS: f32 = 0.4;

// Local avoidance
pub const FEELER_LENGTH: f32 = 1.5;
pub const FEELER_SPREAD_RAD: f32 = 0.6;
pub const FEELER_WEIGHT: f32 = 1.6;
pub const SEPARATION_RADIUS: f32 = 1.4;
pub const SEPARATION_WEIGHT: f32 = 2.2;
pub const OPENNESS_GRADIENT_WEIGHT: f32 = 0.35;
pub const WALL_CONTACT_EPSILON: f32 = 0.01;

// Perception
pub const SEEN_DECAY_RATE: f32 = 2.0;
pub const LAST_KNOWN_MEMORY_SECS: f32 = 8.0;
pub const HIT_ALERT_FRACTION: f32 = 0.5;
pub const MAX_RAY_PASSES: usize = 6;
pub const RAY_SKIP_EPSILON: f32 = 0.02;

// Combat
pub const AIM_BASE_ERROR_RAD: f32 = 0.035;
pub const AIM_ERROR_DISTANCE_SCALE: f32 = 25.0;
pub const AIM_FIRE_TOLERANCE_RAD: f32 = 0.35;
pub const HIT_CHANCE_NEAR: f32 = 0.85;
pub const HIT_CHANCE_FAR: f32 = 0.25;
pub const HIT_FALLOFF_NEAR: f32 = 8.0;
pub const HIT_FALLOFF_FAR: f32 = 45.0;
pub const HIT_CHANCE_CAP: f32 = 0.98;
pub const HEADSHOT_MULTIPLIER: f32 = 2.5;
pub const STRAFE_FLIP_MIN_SECS: f32 = 0.8;
pub const STRAFE_FLIP_MAX_SECS: f32 = 2.0;
pub const PREFERRED_RANGE_FRACTION: f32 = 0.8;

// Retreat
pub const CRITICAL_HEALTH_FRACTION: f32 = 0.25;
pub const LOW_HEALTH_FRACTION: f32 = 0.5;
pub const REPEATED_HIT_COUNT: usize = 3;
pub const HIT_MEMORY_SECS: f32 = 2.5;
pub const RETREAT_DISTANCE: f32 = 12.0;
pub const RETREAT_MIN_SECS: f32 = 3.0;
pub const RETREAT_MAX_SECS: f32 = 5.0;
pub const RETREAT_COOLDOWN_SECS: f32 = 8.0;

// Tactical items
pub const TACTICAL_ITEM_MIN_COOLDOWN: f32 = 12.0;
pub const TACTICAL_ITEM_MAX_COOLDOWN: f32 = 20.0;
pub const TACTICAL_ITEM_ROLL_SECS: f32 = 1.0;
pub const TACTICAL_ITEM_BASE_CHANCE: f32 = 0.25;
pub const TACTICAL_ITEM_OCCLUDED_SECS: f32 = 0.5;

// Objective behaviour
pub const SEARCH_DURATION_SECS: f32 = 6.0;
pub const HOLD_PATROL_MIN_SECS: f32 = 2.5;
pub const HOLD_PATROL_MAX_SECS: f32 = 5.0;
pub const HUNT_ROLL_SECS: f32 = 2.0;
pub const HUNT_MIN_SECS: f32 = 4.0;
pub const HUNT_MAX_SECS: f32 = 7.0;
pub const HUNT_RANGE_FACTOR: f32 = 1.5;
pub const VISITED_MEMORY: usize = 6;

// Tactical director
pub const TACTICAL_INTERVAL_SECS: f32 = 4.0;
pub const TACTICAL_TOP_K: usize = 3;
pub const FLANK_CHANCE: f32 = 0.33;
pub const FLANK_MIN_OFFSET: f32 = 4.0;
pub const FLANK_MAX_OFFSET: f32 = 8.0;

// Respawn
pub const DEFAULT_RESPAWN_DELAY_SECS: f32 = 5.0;
pub const SAFE_SPAWN_RADIUS_FROM_ENEMY: f32 = 15.0;
pub const SPAWN_REUSE_PENALTY_SECS: f32 = 6.0;
