// tactical_bots_core/bots/src/server/mod.rs
pub mod events;
pub mod game_loop;
pub mod instance;
