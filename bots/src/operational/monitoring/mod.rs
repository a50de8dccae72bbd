// tactical_bots_core/bots/src/operational/monitoring/mod.rs
pub mod metrics;
