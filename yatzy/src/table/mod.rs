//! Table module providing multi-table support with async actor model.
//!
//! This module implements:
//! - TableRegistry: seats participants into fixed-size tables, with bot backfill
//! - TableActor: async actor owning a single game session
//! - TableManager: routes connections and actions to table actors
//! - Session configuration and the rotation-mode turn timer
//!
//! ## Architecture
//!
//! Each running table is a Tokio task with an mpsc message inbox, so all
//! mutation of one session is serialized. Membership lives in the registry
//! behind its own lock, separate from any session.
//!
//! ## Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use std::sync::Arc;
//! use yatzy::game::entities::ParticipantId;
//! use yatzy::net::{Transport, messages::ServerMessage};
//! use yatzy::table::{OpponentPreference, SessionConfig, TableManager};
//!
//! struct Stdout;
//!
//! #[async_trait]
//! impl Transport for Stdout {
//!     async fn send_to_participant(&self, participant: &ParticipantId, message: &ServerMessage) {
//!         println!("{participant} <- {message}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = TableManager::new(SessionConfig::default(), Arc::new(Stdout)).unwrap();
//!     let alice = ParticipantId::new("alice");
//!
//!     // A lone player is paired with a bot and the game starts.
//!     let outcome = manager
//!         .connect(&alice, OpponentPreference::Any, None)
//!         .await
//!         .unwrap();
//!     assert!(outcome.table.is_full);
//! }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;
pub mod registry;
pub mod timer;

pub use actor::{TableActor, TableHandle};
pub use config::{BotDifficulty, ConfigError, OpponentPreference, SessionConfig, TurnMode};
pub use manager::{TableDirectory, TableManager};
pub use messages::{TableError, TableMessage, TableStateResponse};
pub use registry::{JoinOutcome, RegistryError, TableId, TableInfo, TableRegistry};
pub use timer::TurnTimer;
