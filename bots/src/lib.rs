// tactical_bots_core/bots/src/lib.rs

pub mod core;
pub mod entities;
pub mod operational;
pub mod server;
pub mod systems;
pub mod world;

pub use crate::core::config::BotConfig;
pub use crate::core::error::{BotError, BotResult};
pub use crate::core::services::{DamageService, PlayerStateProvider, Services, WorldQuery};
pub use crate::server::instance::BotSubsystem;
