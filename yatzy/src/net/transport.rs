use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::messages::ServerMessage;
use crate::game::{GameEvent, entities::ParticipantId};

/// Structured analytics record for one game event.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventRecord {
    pub table_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<ParticipantId>,
    pub kind: String,
    pub detail: String,
    pub at: DateTime<Utc>,
}

impl EventRecord {
    pub fn from_event(table_id: u64, event: &GameEvent) -> Self {
        Self {
            table_id,
            participant: event.participant().cloned(),
            kind: event.kind().to_string(),
            detail: event.to_string(),
            at: Utc::now(),
        }
    }
}

/// Outbound side of a table. Implementations are fire-and-forget: a failed
/// delivery is the transport's problem and is never retried by the core.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one message to one participant.
    async fn send_to_participant(&self, participant: &ParticipantId, message: &ServerMessage);

    /// Deliver one message to every listed participant, in order.
    async fn broadcast_to_table(&self, participants: &[ParticipantId], message: &ServerMessage) {
        for participant in participants {
            self.send_to_participant(participant, message).await;
        }
    }

    async fn log_event(&self, record: &EventRecord) {
        log::info!(
            "[table {}] {}: {}",
            record.table_id,
            record.kind,
            record.detail
        );
    }
}
