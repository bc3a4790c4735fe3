//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::{fmt::Display, net::SocketAddr, str::FromStr};
use yatzy::table::{BotDifficulty, SessionConfig, TurnMode};

/// Port the server listens on when nothing else is configured.
pub const DEFAULT_PORT: u16 = 9000;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Settings applied to every table's session
    pub session: SessionConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_or(
                "SERVER_BIND",
                SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            )?,
        };

        let defaults = SessionConfig::default();
        let session = SessionConfig {
            turn_mode: parse_env_or::<TurnMode>("TURN_MODE", defaults.turn_mode)?,
            rounds_per_participant: parse_env_or(
                "ROUNDS_PER_PARTICIPANT",
                defaults.rounds_per_participant,
            )?,
            bot_difficulty: parse_env_or::<BotDifficulty>("BOT_DIFFICULTY", defaults.bot_difficulty)?,
            turn_timeout_ms: parse_env_or("TURN_TIMEOUT_MS", defaults.turn_timeout_ms)?,
            capacity: parse_env_or("TABLE_CAPACITY", defaults.capacity)?,
            bot_round_delay_ms: parse_env_or("BOT_ROUND_DELAY_MS", defaults.bot_round_delay_ms)?,
        };

        Ok(ServerConfig { bind, session })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session.validate()?;
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error("Invalid session settings: {0}")]
    Session(#[from] yatzy::table::ConfigError),
}

/// Parse an environment variable, falling back to `default` when unset.
/// A set but unparsable value is an error rather than silently ignored.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: key.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
