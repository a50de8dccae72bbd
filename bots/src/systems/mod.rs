// tactical_bots_core/bots/src/systems/mod.rs
pub mod ai;
pub mod respawn;
