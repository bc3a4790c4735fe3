//! # Yatzy
//!
//! Server-side core of a multiplayer Yatzy game: table matching, one
//! authoritative session per table, and bots that play through the same
//! action interface as humans.
//!
//! ## Architecture
//!
//! A session moves through a small set of phases:
//!
//! - **AwaitingFirstAction**: table just filled, nobody has acted yet
//! - **InProgress**: participants roll, lock and score
//! - **Finished**: a winner (or a draw) has been declared
//!
//! A participant who rolls a repeat Yatzy whose upper slot is taken owes a
//! joker choice before anything else they do is accepted.
//!
//! Turn progression is either **rotation** (one shared pointer advanced on
//! every score) or **independent** (everyone plays their own rounds).
//!
//! ## Core Modules
//!
//! - [`game`]: Scoring engine, entities and the session state machine
//! - [`bot`]: Keep and category decisions with difficulty tiers
//! - [`table`]: Registry, per-table actors and the table manager
//! - [`net`]: Wire messages and the transport boundary
//!
//! ## Example
//!
//! ```
//! use yatzy::{GameSession, MoveRequest, ParticipantId, SessionConfig};
//!
//! let players = vec![ParticipantId::new("alice"), ParticipantId::new("bob")];
//! let mut game = GameSession::new(players, SessionConfig::default()).unwrap();
//! game.start();
//!
//! let alice = ParticipantId::new("alice");
//! assert!(game.apply_action(&alice, &MoveRequest::roll()));
//! ```

/// Automatic players.
pub mod bot;

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    Dispatch, GameEvent, GameSession, Phase, UserError,
    constants,
    entities::{self, Category, ParticipantId, ScoreCard},
    scoring,
};

/// Wire messages and transport boundary.
pub mod net;
pub use net::messages::{self, MoveRequest, ServerMessage, Snapshot};

/// Tables, their actors and the dispatcher.
pub mod table;
pub use table::{SessionConfig, TableManager};
