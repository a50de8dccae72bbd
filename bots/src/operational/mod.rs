// tactical_bots_core/bots/src/operational/mod.rs
pub mod monitoring;
