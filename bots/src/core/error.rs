// tactical_bots_core/bots/src/core/error.rs
use thiserror::Error;

use crate::core::types::AgentId;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown difficulty profile: {0}")]
    UnknownDifficulty(String),

    #[error("Level error: {0}")]
    Level(String),

    #[error("Agent {agent} has a non-finite position")]
    NonFinitePosition { agent: AgentId },

    #[error("Agent {0} does not exist")]
    NoSuchAgent(AgentId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type BotResult<T> = Result<T, BotError>;
