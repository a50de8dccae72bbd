// tactical_bots_core/bots/src/server/game_loop.rs
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::events::BotEvent;
use super::instance::BotSubsystem;
use crate::core::constants::TICK_DURATION;

/// Counters accumulated from drained events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub ticks: u64,
    pub shots: u64,
    pub hits: u64,
    pub headshots: u64,
    pub deaths: u64,
    pub respawns: u64,
    pub state_changes: u64,
    pub tactical_items: u64,
}

impl MatchSummary {
    pub fn record(&mut self, event: &BotEvent) {
        match event {
            BotEvent::ShotFired { hit, headshot, .. } => {
                self.shots += 1;
                self.hits += u64::from(*hit);
                self.headshots += u64::from(*headshot);
            }
            BotEvent::TacticalItem { .. } => self.tactical_items += 1,
            BotEvent::StateChanged { .. } => self.state_changes += 1,
            BotEvent::AgentDied { .. } => self.deaths += 1,
            BotEvent::AgentRespawned { .. } => self.respawns += 1,
        }
    }
}

/// Fixed-step driver for headless matches.
pub struct MatchRunner {
    subsystem: BotSubsystem,
    tick: Duration,
    summary: MatchSummary,
}

impl MatchRunner {
    pub fn new(subsystem: BotSubsystem) -> Self {
        Self::with_tick(subsystem, TICK_DURATION)
    }

    pub fn with_tick(subsystem: BotSubsystem, tick: Duration) -> Self {
        MatchRunner { subsystem, tick, summary: MatchSummary::default() }
    }

    pub fn subsystem(&self) -> &BotSubsystem {
        &self.subsystem
    }

    pub fn subsystem_mut(&mut self) -> &mut BotSubsystem {
        &mut self.subsystem
    }

    pub fn summary(&self) -> MatchSummary {
        self.summary
    }

    pub fn into_subsystem(self) -> BotSubsystem {
        self.subsystem
    }

    /// One fixed step plus event bookkeeping.
    pub fn step(&mut self) {
        let frame_start = Instant::now();
        self.subsystem.update(self.tick.as_secs_f32());
        for event in self.subsystem.drain_events() {
            self.summary.record(&event);
        }
        self.summary.ticks += 1;

        let frame_time = frame_start.elapsed();
        if frame_time > self.tick {
            warn!("Frame {} took too long: {:?} (target: {:?})", self.summary.ticks, frame_time, self.tick);
        }
    }

    /// Runs as fast as possible for `ticks` steps.
    pub fn run_ticks(&mut self, ticks: u64) -> MatchSummary {
        for _ in 0..ticks {
            self.step();
        }
        self.summary
    }

    /// Runs for `duration` of wall time, sleeping between steps.
    pub fn run_realtime(&mut self, duration: Duration) -> MatchSummary {
        info!("Match loop started. Tick rate: {}ms", self.tick.as_millis());
        let started = Instant::now();
        let mut next_tick = started;
        while started.elapsed() < duration {
            self.step();
            next_tick += self.tick;
            let now = Instant::now();
            if next_tick > now {
                std::thread::sleep(next_tick - now);
            } else if now - next_tick > self.tick * 4 {
                debug!("Match loop is {:?} behind, resetting the schedule", now - next_tick);
                next_tick = now;
            }
        }
        info!("Match loop stopped after {} ticks", self.summary.ticks);
        self.summary
    }
}
