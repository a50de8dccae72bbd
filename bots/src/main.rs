// tactical_bots_core/bots/src/main.rs
use std::time::Duration;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use tactical_bots_core::core::config::BotConfig;
use tactical_bots_core::core::services::Services;
use tactical_bots_core::entities::health::HealthLedger;
use tactical_bots_core::operational::monitoring::metrics::init_logging;
use tactical_bots_core::server::game_loop::MatchRunner;
use tactical_bots_core::server::instance::BotSubsystem;
use tactical_bots_core::world::map_generator::MapGenerator;
use tactical_bots_core::world::obstacle_index::StaticWorld;

const DEFAULT_MATCH_SECS: u64 = 60;

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = match std::env::var("BOT_CONFIG") {
        Ok(path) => BotConfig::from_file(&path).with_context(|| format!("loading bot config from {}", path))?,
        Err(_) => BotConfig::default(),
    };
    let match_secs = std::env::var("MATCH_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MATCH_SECS);
    let realtime = std::env::var("REALTIME").map_or(false, |v| v == "1");

    let mut map_rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let generated = MapGenerator::generate_arena(&mut map_rng);
    info!(
        "Generated arena with {} boxes, {} objectives and {} spawns",
        generated.boxes.len(),
        generated.level.objectives.len(),
        generated.level.spawns.len()
    );

    let services = Services::new()
        .with_world(StaticWorld::new(generated.boxes))
        .with_damage(HealthLedger::new());
    let mut subsystem = BotSubsystem::new(config, generated.level, services).context("creating bot subsystem")?;
    subsystem.init().context("spawning bots")?;

    let mut runner = MatchRunner::new(subsystem);
    let summary = if realtime {
        runner.run_realtime(Duration::from_secs(match_secs))
    } else {
        let ticks = match_secs * tactical_bots_core::core::constants::DEFAULT_TICK_RATE;
        runner.run_ticks(ticks)
    };

    let subsystem = runner.subsystem();
    for bot in subsystem.bots() {
        info!(
            "{:<10} {:?} {:>3} kills {:>3} deaths, state {}",
            bot.name,
            bot.weapon,
            bot.kills,
            bot.deaths,
            bot.state.kind()
        );
    }
    info!(
        "Match summary: {}",
        serde_yaml::to_string(&summary).unwrap_or_else(|_| format!("{:?}", summary))
    );
    Ok(())
}
