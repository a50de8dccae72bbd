// tactical_bots_core/bots/src/world/mod.rs
pub mod map_generator;
pub mod nav_grid;
pub mod obstacle_index;
