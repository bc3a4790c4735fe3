//! WebSocket handler connecting clients to their table.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws?winzoId=<id>[&opponent=human][&difficulty=hard]`
//! 2. The socket is registered with the [`ConnectionHub`](super::hub::ConnectionHub)
//!    and the participant is seated by the table manager
//! 3. A send task forwards everything the table emits for this participant
//! 4. Inbound frames are `{ "code": 5001, "data": ... }` envelopes carrying
//!    either a `MOVE` or a `LEAVE` packet
//! 5. On close (or `LEAVE`) the participant is unseated, unless a newer
//!    socket has already taken over the identifier
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:9000/ws?winzoId=alice');
//!
//! ws.send(JSON.stringify({
//!   code: 5001,
//!   data: { type: "MOVE", action: "lock", diceIndices: [0, 2] }
//! }));
//! ```

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use serde::Deserialize;
use std::str::FromStr;
use yatzy::{
    ParticipantId,
    messages::{CLIENT_TO_SERVER, ClientPayload, Envelope},
    table::{BotDifficulty, OpponentPreference},
};

use super::AppState;
use crate::logging::log_connection_event;

/// Handshake query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectQuery {
    winzo_id: Option<String>,
    opponent: Option<String>,
    difficulty: Option<String>,
}

/// Validated handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub participant: ParticipantId,
    pub preference: OpponentPreference,
    pub difficulty: Option<BotDifficulty>,
}

impl ConnectQuery {
    /// Returns `None` when no usable participant identifier was given.
    pub fn into_params(self) -> Option<ConnectParams> {
        let participant = ParticipantId::new(self.winzo_id.as_deref()?);
        if participant.as_str().is_empty() {
            return None;
        }

        let preference = self
            .opponent
            .as_deref()
            .and_then(|o| OpponentPreference::from_str(o).ok())
            .unwrap_or_default();

        let difficulty = self.difficulty.as_deref().and_then(|d| match d.parse() {
            Ok(difficulty) => Some(difficulty),
            Err(e) => {
                warn!("Ignoring difficulty override: {e}");
                None
            }
        });

        Some(ConnectParams {
            participant,
            preference,
            difficulty,
        })
    }
}

/// What the read loop should do after a frame.
#[derive(Debug, PartialEq, Eq)]
enum FrameOutcome {
    Continue,
    Leave,
}

/// Upgrade HTTP connection to WebSocket.
///
/// # Response
///
/// On success, upgrades connection to WebSocket protocol (101 Switching Protocols).
/// Without a `winzoId`, returns `400 Bad Request`.
pub async fn websocket_handler(
    Query(query): Query<ConnectQuery>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(params) = query.into_params() else {
        return (StatusCode::BAD_REQUEST, "Missing winzoId").into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, params: ConnectParams, state: AppState) {
    let participant = params.participant.clone();
    let (mut sender, mut receiver) = socket.split();

    let (connection_id, mut outbound) = state.hub.register(&participant).await;
    let connection = connection_id.to_string();
    log_connection_event("connected", participant.as_str(), &connection);

    let send_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    match state
        .table_manager
        .connect(&participant, params.preference, params.difficulty)
        .await
    {
        Ok(outcome) => {
            tracing::info!(
                participant = participant.as_str(),
                table_id = outcome.table.table_id,
                reconnect = !outcome.was_newly_added,
                "Participant seated"
            );

            while let Some(msg) = receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if handle_frame(&state, &participant, &text).await == FrameOutcome::Leave {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Err(e) => {
                        tracing::warn!(participant = participant.as_str(), "WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        }
        Err(e) => {
            tracing::warn!(participant = participant.as_str(), "Connection refused: {}", e);
        }
    }

    if state.hub.unregister(&participant, connection_id).await {
        state.table_manager.leave(&participant).await;
        log_connection_event("closed", participant.as_str(), &connection);
    } else {
        log_connection_event("superseded", participant.as_str(), &connection);
    }
    send_task.abort();
}

/// Route one inbound text frame.
///
/// Frames that are not valid envelopes, carry another code, or hold an
/// unrecognized payload are dropped.
async fn handle_frame(state: &AppState, participant: &ParticipantId, text: &str) -> FrameOutcome {
    let envelope = match serde_json::from_str::<Envelope<serde_json::Value>>(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!("Unparsable frame from {participant}: {e}");
            return FrameOutcome::Continue;
        }
    };
    if envelope.code != CLIENT_TO_SERVER {
        debug!("Frame with code {} from {participant} ignored", envelope.code);
        return FrameOutcome::Continue;
    }

    match serde_json::from_value::<ClientPayload>(envelope.data) {
        Ok(ClientPayload::Leave(_)) => FrameOutcome::Leave,
        Ok(ClientPayload::Move(request)) => {
            state.table_manager.dispatch(participant, request).await;
            FrameOutcome::Continue
        }
        Err(e) => {
            debug!("Unrecognized payload from {participant}: {e}");
            FrameOutcome::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use yatzy::table::SessionConfig;

    fn query(winzo_id: Option<&str>, opponent: Option<&str>, difficulty: Option<&str>) -> ConnectQuery {
        ConnectQuery {
            winzo_id: winzo_id.map(str::to_string),
            opponent: opponent.map(str::to_string),
            difficulty: difficulty.map(str::to_string),
        }
    }

    #[test]
    fn test_query_requires_identifier() {
        assert!(query(None, None, None).into_params().is_none());
        assert!(query(Some("   "), None, None).into_params().is_none());
    }

    #[test]
    fn test_query_parses_preferences() {
        let params = query(Some("alice"), Some("human"), Some("hard"))
            .into_params()
            .unwrap();
        assert_eq!(params.participant, ParticipantId::new("alice"));
        assert_eq!(params.preference, OpponentPreference::Human);
        assert_eq!(params.difficulty, Some(BotDifficulty::Hard));

        let params = query(Some("bob"), Some("anyone"), Some("nightmare"))
            .into_params()
            .unwrap();
        assert_eq!(params.preference, OpponentPreference::Any);
        assert_eq!(params.difficulty, None);
    }

    #[tokio::test]
    async fn test_frames_are_routed_to_the_table() {
        let state = AppState::new(SessionConfig::default()).unwrap();
        let alice = ParticipantId::new("alice");
        let (_, mut rx) = state.hub.register(&alice).await;
        state
            .table_manager
            .connect(&alice, OpponentPreference::Any, None)
            .await
            .unwrap();

        let table_info: serde_json::Value =
            serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(table_info["code"], 5004);

        let roll = r#"{"code":5001,"data":{"type":"MOVE","action":"roll"}}"#;
        assert_eq!(handle_frame(&state, &alice, roll).await, FrameOutcome::Continue);

        let update = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let update: serde_json::Value = serde_json::from_str(&update).unwrap();
        assert_eq!(update["code"], 5002);
        assert_eq!(update["data"]["type"], "CHANGE_TURN");
        assert_eq!(update["data"]["rollsLeft"], 2);
    }

    #[tokio::test]
    async fn test_leave_and_junk_frames() {
        let state = AppState::new(SessionConfig::default()).unwrap();
        let alice = ParticipantId::new("alice");

        let leave = r#"{"code":5001,"data":{"type":"LEAVE"}}"#;
        assert_eq!(handle_frame(&state, &alice, leave).await, FrameOutcome::Leave);

        for junk in [
            "not json",
            r#"{"code":5002,"data":{"type":"LEAVE"}}"#,
            r#"{"code":5001,"data":{"foo":1}}"#,
        ] {
            assert_eq!(handle_frame(&state, &alice, junk).await, FrameOutcome::Continue);
        }
    }
}
