// tactical_bots_core/bots/src/entities/mod.rs
pub mod bot;
pub mod health;
