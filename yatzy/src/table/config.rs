//! Table and session configuration models.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::game::constants::{
    DEFAULT_BOT_ROUND_DELAY_MS, DEFAULT_ROUNDS_PER_PARTICIPANT, DEFAULT_TABLE_CAPACITY,
    DEFAULT_TURN_TIMEOUT_MS, NUM_CATEGORIES,
};

/// How turns progress between participants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnMode {
    /// One shared turn pointer, advanced on each scoring action
    #[default]
    Rotation,
    /// Each participant plays their own rounds at their own pace
    Independent,
}

impl fmt::Display for TurnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnMode::Rotation => write!(f, "rotation"),
            TurnMode::Independent => write!(f, "independent"),
        }
    }
}

impl FromStr for TurnMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rotation" => Ok(TurnMode::Rotation),
            "independent" => Ok(TurnMode::Independent),
            other => Err(format!("unknown turn mode `{other}`")),
        }
    }
}

/// Bot difficulty presets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for BotDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotDifficulty::Easy => write!(f, "easy"),
            BotDifficulty::Medium => write!(f, "medium"),
            BotDifficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for BotDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(BotDifficulty::Easy),
            "medium" => Ok(BotDifficulty::Medium),
            "hard" => Ok(BotDifficulty::Hard),
            other => Err(format!("unknown bot difficulty `{other}`")),
        }
    }
}

/// Who a lone human wants to play against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpponentPreference {
    /// Backfill with a bot if nobody else is waiting
    #[default]
    Any,
    /// Wait for another human
    Human,
}

impl FromStr for OpponentPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(OpponentPreference::Human),
            _ => Ok(OpponentPreference::Any),
        }
    }
}

/// Session configuration, fixed when a table's game is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Turn progression model
    pub turn_mode: TurnMode,

    /// Scoring actions each participant makes before the game ends (default: 13)
    pub rounds_per_participant: u32,

    /// Skill tier of synthesized bots
    pub bot_difficulty: BotDifficulty,

    /// Rotation-mode turn timeout in milliseconds (default: 30s)
    pub turn_timeout_ms: u64,

    /// Participants per table (default: 2)
    pub capacity: usize,

    /// Pause between independent-mode bot rounds in milliseconds
    pub bot_round_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            turn_mode: TurnMode::Rotation,
            rounds_per_participant: DEFAULT_ROUNDS_PER_PARTICIPANT,
            bot_difficulty: BotDifficulty::Medium,
            turn_timeout_ms: DEFAULT_TURN_TIMEOUT_MS,
            capacity: DEFAULT_TABLE_CAPACITY,
            bot_round_delay_ms: DEFAULT_BOT_ROUND_DELAY_MS,
        }
    }
}

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("table capacity must be at least 1")]
    InvalidCapacity,

    #[error("rounds per participant must be between 1 and {max}, got {got}")]
    InvalidRounds { got: u32, max: usize },

    #[error("turn timeout must be greater than 0")]
    InvalidTimeout,

    #[error("a session needs at least one participant")]
    NoParticipants,

    #[error("{count} participants exceed table capacity {capacity}")]
    TooManyParticipants { count: usize, capacity: usize },

    #[error("participant {0} is seated twice")]
    DuplicateParticipant(String),
}

impl SessionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }

        if self.rounds_per_participant == 0
            || self.rounds_per_participant as usize > NUM_CATEGORIES
        {
            return Err(ConfigError::InvalidRounds {
                got: self.rounds_per_participant,
                max: NUM_CATEGORIES,
            });
        }

        if self.turn_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(())
    }

    pub fn turn_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.turn_timeout_ms)
    }

    pub fn bot_round_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.bot_round_delay_ms)
    }
}
