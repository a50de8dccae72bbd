// tactical_bots_core/bots/src/entities/health.rs
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::core::services::DamageService;
use crate::core::types::{CombatTarget, DamageInfo};

#[derive(Debug, Clone, Copy, PartialEq)]
struct HealthEntry {
    current: f32,
    max: f32,
}

/// In-memory `DamageService` for hosts without their own health system.
#[derive(Debug, Default)]
pub struct HealthLedger {
    entries: HashMap<CombatTarget, HealthEntry>,
    damage_dealt: f32,
}

impl HealthLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_damage(&self) -> f32 {
        self.damage_dealt
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overrides a target's health, clamped to its maximum.
    pub fn set_health(&mut self, target: CombatTarget, health: f32) {
        if let Some(entry) = self.entries.get_mut(&target) {
            entry.current = health.clamp(0.0, entry.max);
        }
    }
}

impl DamageService for HealthLedger {
    fn register(&mut self, target: CombatTarget, max_health: f32) {
        self.entries.insert(target, HealthEntry { current: max_health, max: max_health });
    }

    fn apply_damage(&mut self, target: CombatTarget, info: DamageInfo) -> bool {
        let Some(entry) = self.entries.get_mut(&target) else {
            warn!("Damage from agent {} against unregistered target {:?} ignored", info.source, target);
            return false;
        };
        if entry.current <= 0.0 {
            return false;
        }
        let amount = info.amount.max(0.0);
        entry.current = (entry.current - amount).max(0.0);
        self.damage_dealt += amount;
        let died = entry.current <= 0.0;
        if died {
            debug!(
                "{:?} killed by agent {} ({:?}{})",
                target,
                info.source,
                info.weapon,
                if info.headshot { ", headshot" } else { "" }
            );
        }
        died
    }

    fn health(&self, target: CombatTarget) -> Option<f32> {
        self.entries.get(&target).map(|e| e.current)
    }
}
