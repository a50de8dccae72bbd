// tactical_bots_core/bots/src/core/mod.rs
pub mod config;
pub mod constants;
pub mod error;
pub mod services;
pub mod types;
