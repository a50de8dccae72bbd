// tactical_bots_core/bots/src/server/events.rs
use std::collections::VecDeque;

use serde::Serialize;

use crate::core::types::{AgentId, CombatTarget, TacticalItemKind, Team, Vec3};
use crate::entities::bot::BotStateKind;

/// Notifications the host drains once per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BotEvent {
    ShotFired {
        shooter: AgentId,
        target: CombatTarget,
        origin: Vec3,
        direction: Vec3,
        hit: bool,
        headshot: bool,
        damage: f32,
    },
    /// The host resolves the item and reports effects back via `apply_status_effect`.
    TacticalItem {
        thrower: AgentId,
        team: Team,
        kind: TacticalItemKind,
        target: Vec3,
    },
    StateChanged {
        agent: AgentId,
        from: BotStateKind,
        to: BotStateKind,
    },
    AgentDied {
        agent: AgentId,
        killer: Option<AgentId>,
    },
    AgentRespawned {
        agent: AgentId,
        position: Vec3,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPriority {
    High,
    Normal,
    Low,
}

impl BotEvent {
    pub fn priority(&self) -> EventPriority {
        match self {
            BotEvent::AgentDied { .. } | BotEvent::ShotFired { hit: true, .. } => EventPriority::High,
            BotEvent::StateChanged { .. } => EventPriority::Low,
            _ => EventPriority::Normal,
        }
    }
}

/// Three FIFO lanes; draining empties high before normal before low.
#[derive(Debug, Default)]
pub struct EventQueue {
    high_priority: VecDeque<BotEvent>,
    normal_priority: VecDeque<BotEvent>,
    low_priority: VecDeque<BotEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: BotEvent) {
        match event.priority() {
            EventPriority::High => self.high_priority.push_back(event),
            EventPriority::Normal => self.normal_priority.push_back(event),
            EventPriority::Low => self.low_priority.push_back(event),
        }
    }

    pub fn pop(&mut self) -> Option<BotEvent> {
        self.high_priority
            .pop_front()
            .or_else(|| self.normal_priority.pop_front())
            .or_else(|| self.low_priority.pop_front())
    }

    pub fn pop_batch(&mut self, max_count: usize) -> Vec<BotEvent> {
        let mut batch = Vec::with_capacity(max_count.min(self.len()));
        while batch.len() < max_count {
            match self.pop() {
                Some(event) => batch.push(event),
                None => break,
            }
        }
        batch
    }

    pub fn drain(&mut self) -> Vec<BotEvent> {
        self.pop_batch(usize::MAX)
    }

    pub fn clear(&mut self) {
        self.high_priority.clear();
        self.normal_priority.clear();
        self.low_priority.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.high_priority.is_empty() && self.normal_priority.is_empty() && self.low_priority.is_empty()
    }

    pub fn len(&self) -> usize {
        self.high_priority.len() + self.normal_priority.len() + self.low_priority.len()
    }
}
