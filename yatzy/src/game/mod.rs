//! Yatzy game engine - scoring, dice and the per-table session.
//!
//! This module provides:
//! - A pure scoring engine over five dice and thirteen categories
//! - Turn-progression policies (rotation and independent)
//! - The authoritative session state machine with joker and bonus rules
//! - Injectable dice sources so sessions can be replayed in tests

// Submodules
pub mod constants;
pub mod dice;
pub mod entities;
pub mod scoring;
pub mod turns;

mod state_machine;

pub use state_machine::*;
