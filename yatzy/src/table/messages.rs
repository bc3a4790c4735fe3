//! Table actor message types.

use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::oneshot;

use super::{config::TurnMode, registry::TableId};
use crate::{
    game::entities::ParticipantId,
    net::messages::{MoveRequest, Snapshot},
};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Participant action (roll, lock, score, joker)
    TakeAction {
        participant: ParticipantId,
        request: MoveRequest,
    },

    /// Participant left or disconnected
    Leave { participant: ParticipantId },

    /// Participant reconnected; resend the current state to them
    Resync { participant: ParticipantId },

    /// Get the current snapshot as a participant would see it
    GetSnapshot {
        participant: ParticipantId,
        response: oneshot::Sender<Option<Snapshot>>,
    },

    /// Get a summary of the table
    GetState {
        response: oneshot::Sender<TableStateResponse>,
    },

    /// Stop the actor without finishing the game
    Close,
}

/// Table error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("table {0} is closed")]
    Closed(TableId),
}

/// Table state response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStateResponse {
    /// Table ID
    pub table_id: TableId,

    /// Participants still seated, in join order
    pub participants: Vec<ParticipantId>,

    pub turn_mode: TurnMode,

    /// Rotation-mode turn holder
    pub current_turn: Option<ParticipantId>,

    /// Running totals, including departed participants
    pub totals: BTreeMap<ParticipantId, u32>,

    /// Winner once the game is over; empty for a draw
    pub winner: Option<String>,
}

impl TableStateResponse {
    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }
}
