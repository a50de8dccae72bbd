// tactical_bots_core/bots/src/operational/monitoring/metrics.rs
use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Thin facade over the `metrics` macros. Recording is a no-op until the host
/// installs a recorder.
pub struct BotMetrics;

impl BotMetrics {
    pub fn new() -> Self {
        describe_counter!("bots_ticks_total", "Bot subsystem updates processed");
        describe_counter!("bots_route_failures_total", "Route requests that found no path");
        describe_counter!("bots_route_hard_resets_total", "Agents forced onto a different objective");
        describe_counter!("bots_stuck_repaths_total", "Repaths requested by the stuck watchdog");
        describe_counter!("bots_shots_fired_total", "Simulated shots fired by bots");
        describe_counter!("bots_agent_step_errors_total", "Per-agent updates that failed and were skipped");
        describe_gauge!("bots_alive", "Living bots after the last update");
        describe_histogram!("bots_tick_seconds", "Wall time of one bot subsystem update");
        BotMetrics
    }

    pub fn record_tick(&self, duration: f64, alive: usize) {
        histogram!("bots_tick_seconds").record(duration);
        counter!("bots_ticks_total").increment(1);
        gauge!("bots_alive").set(alive as f64);
    }

    pub fn record_route_failure(&self) {
        counter!("bots_route_failures_total").increment(1);
    }

    pub fn record_hard_reset(&self) {
        counter!("bots_route_hard_resets_total").increment(1);
    }

    pub fn record_stuck_repath(&self) {
        counter!("bots_stuck_repaths_total").increment(1);
    }

    pub fn record_shot(&self, hit: bool) {
        counter!("bots_shots_fired_total", "hit" => if hit { "true" } else { "false" }).increment(1);
    }

    pub fn record_step_error(&self) {
        counter!("bots_agent_step_errors_total").increment(1);
    }
}

impl Default for BotMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs a global `tracing` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "tactical_bots_core=info,warn".into()))
        .with(fmt::layer())
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}
