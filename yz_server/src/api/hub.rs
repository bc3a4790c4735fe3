//! Live WebSocket connections keyed by participant.
//!
//! The hub is the server's side of the [`Transport`] boundary: tables hand
//! it messages for participants, and it forwards them as JSON envelopes to
//! whichever socket currently belongs to that participant.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;
use yatzy::{
    ParticipantId, ServerMessage,
    net::{EventRecord, Transport},
};

/// Frames buffered per socket before new ones are dropped.
const OUTBOUND_BUFFER: usize = 64;

#[derive(Debug)]
struct Connection {
    id: Uuid,
    sender: mpsc::Sender<String>,
}

/// Registry of open sockets.
#[derive(Debug, Default)]
pub struct ConnectionHub {
    connections: RwLock<HashMap<ParticipantId, Connection>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `participant` for a new socket.
    ///
    /// A previous socket for the same participant is replaced; its outbound
    /// channel closes, which ends that socket's writer.
    pub async fn register(&self, participant: &ParticipantId) -> (Uuid, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(OUTBOUND_BUFFER);
        let id = Uuid::new_v4();
        let previous = self
            .connections
            .write()
            .await
            .insert(participant.clone(), Connection { id, sender });
        if let Some(previous) = previous {
            tracing::info!(
                participant = participant.as_str(),
                old = %previous.id,
                new = %id,
                "Connection replaced"
            );
        }
        (id, receiver)
    }

    /// Release `participant` if `connection_id` still owns it.
    ///
    /// Returns `false` for a socket that was already replaced, so that its
    /// close is not mistaken for the participant leaving.
    pub async fn unregister(&self, participant: &ParticipantId, connection_id: Uuid) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get(participant) {
            Some(connection) if connection.id == connection_id => {
                connections.remove(participant);
                true
            }
            _ => false,
        }
    }

    pub async fn is_connected(&self, participant: &ParticipantId) -> bool {
        self.connections.read().await.contains_key(participant)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[async_trait]
impl Transport for ConnectionHub {
    async fn send_to_participant(&self, participant: &ParticipantId, message: &ServerMessage) {
        let connections = self.connections.read().await;
        let Some(connection) = connections.get(participant) else {
            // Bots and departed participants have no socket.
            tracing::trace!(participant = participant.as_str(), "No connection for message");
            return;
        };

        let frame = match serde_json::to_string(&message.clone().into_envelope()) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to serialize {}: {}", message, e);
                return;
            }
        };

        if let Err(e) = connection.sender.try_send(frame) {
            tracing::warn!(
                participant = participant.as_str(),
                "Dropped outbound frame: {}",
                e
            );
        }
    }

    async fn log_event(&self, record: &EventRecord) {
        tracing::info!(
            table_id = record.table_id,
            participant = record.participant.as_ref().map(ParticipantId::as_str),
            kind = record.kind.as_str(),
            at = %record.at,
            "{}",
            record.detail
        );
    }
}
