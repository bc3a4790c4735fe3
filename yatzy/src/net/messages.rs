use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use crate::game::{
    UserError,
    constants::NUM_DICE,
    entities::{Category, Dice, JokerPrompt, Move, ParticipantId, ScoreCard},
};

/// Frame codes carried in the `code` field of every envelope.
pub const CLIENT_TO_SERVER: u16 = 5001;
pub const SERVER_TO_CLIENT: u16 = 5002;
pub const TABLE_INFO: u16 = 5004;

/// Outer frame of every message on the wire: `{ "code": ..., "data": ... }`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(code: u16, data: T) -> Self {
        Self { code, data }
    }
}

impl From<ServerMessage> for Envelope<ServerMessage> {
    fn from(value: ServerMessage) -> Self {
        Self::new(value.code(), value)
    }
}

/// Discriminator of the `type` field inside a payload.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PacketType {
    Move,
    ChangeTurn,
    JokerChoice,
    GameOver,
    TableInfo,
    Leave,
    #[serde(other)]
    Unknown,
}

/// Action requested inside a `MOVE` packet.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveKind {
    Roll,
    Lock,
    Score,
    Joker,
    #[serde(other)]
    Unknown,
}

/// Inbound action as sent by a client, before validation.
///
/// Indices and category labels are kept loose here so that malformed
/// values reach the session and are rejected there as no-ops instead of
/// failing deserialization of the whole frame.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    #[serde(rename = "type")]
    pub packet: PacketType,
    #[serde(default = "MoveRequest::unknown_action")]
    pub action: MoveKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dice_indices: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl MoveRequest {
    fn unknown_action() -> MoveKind {
        MoveKind::Unknown
    }

    fn new(action: MoveKind) -> Self {
        Self {
            packet: PacketType::Move,
            action,
            dice_indices: None,
            category: None,
        }
    }

    #[must_use]
    pub fn roll() -> Self {
        Self::new(MoveKind::Roll)
    }

    #[must_use]
    pub fn lock(indices: &[usize]) -> Self {
        Self {
            dice_indices: Some(indices.iter().map(|&i| i as i64).collect()),
            ..Self::new(MoveKind::Lock)
        }
    }

    #[must_use]
    pub fn score(category: Category) -> Self {
        Self {
            category: Some(category.to_string()),
            ..Self::new(MoveKind::Score)
        }
    }

    #[must_use]
    pub fn joker(category: Category) -> Self {
        Self {
            category: Some(category.to_string()),
            ..Self::new(MoveKind::Joker)
        }
    }
}

impl From<&Move> for MoveRequest {
    fn from(value: &Move) -> Self {
        match value {
            Move::Roll => Self::roll(),
            Move::Lock(indices) => Self::lock(indices),
            Move::Score(category) => Self::score(*category),
            Move::Joker(category) => Self::joker(*category),
        }
    }
}

impl TryFrom<&MoveRequest> for Move {
    type Error = UserError;

    fn try_from(value: &MoveRequest) -> Result<Self, Self::Error> {
        if value.packet != PacketType::Move {
            return Err(UserError::UnrecognizedPacket);
        }
        let category = || -> Result<Category, UserError> {
            let label = value.category.as_deref().ok_or(UserError::MissingCategory)?;
            label
                .parse()
                .map_err(|_| UserError::UnknownCategory(label.to_string()))
        };
        match value.action {
            MoveKind::Roll => Ok(Move::Roll),
            MoveKind::Lock => {
                let indices = value
                    .dice_indices
                    .as_ref()
                    .ok_or(UserError::MissingDiceIndices)?;
                let valid: Vec<usize> = indices
                    .iter()
                    .filter_map(|&i| usize::try_from(i).ok())
                    .filter(|&i| i < NUM_DICE)
                    .collect();
                if valid.is_empty() {
                    return Err(UserError::InvalidDieIndex);
                }
                Ok(Move::Lock(valid))
            }
            MoveKind::Score => Ok(Move::Score(category()?)),
            MoveKind::Joker => Ok(Move::Joker(category()?)),
            MoveKind::Unknown => Err(UserError::UnknownAction),
        }
    }
}

/// Any payload a client may put inside a `CLIENT_TO_SERVER` envelope.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClientPayload {
    Leave(LeaveRequest),
    Move(MoveRequest),
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LeaveRequest {
    #[serde(rename = "type", deserialize_with = "leave_only")]
    pub packet: PacketType,
}

fn leave_only<'de, D>(deserializer: D) -> Result<PacketType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let packet = PacketType::deserialize(deserializer)?;
    if packet == PacketType::Leave {
        Ok(packet)
    } else {
        Err(serde::de::Error::custom("not a LEAVE packet"))
    }
}

/// Authoritative view of a session, broadcast after every accepted action.
///
/// `dice`, `rollsLeft`, `lockedDice` and `hasRolledThisTurn` describe
/// `participant`'s dice: the turn holder in rotation mode, the acting or
/// viewing participant in independent mode.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub participant: ParticipantId,
    pub dice: Dice,
    pub rolls_left: u8,
    pub locked_dice: [bool; NUM_DICE],
    pub scores: BTreeMap<ParticipantId, ScoreCard>,
    #[serde(
        rename = "currentPlayerTurn",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_turn: Option<ParticipantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_rolled_this_turn: Option<bool>,
    pub pending_joker: bool,
    pub game_over: bool,
}

/// A message from a table to one of its participants.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// State after an accepted action.
    ChangeTurn(Snapshot),
    /// Category choice owed after a repeat Yatzy. Sent only to the
    /// participant who rolled it.
    JokerChoice(JokerPrompt),
    /// Terminal notice; an empty winner is a draw.
    GameOver { winner: String },
    /// Full state sent when a table starts and on reconnect.
    TableInfo(Snapshot),
}

impl ServerMessage {
    /// Envelope code this message travels under.
    pub fn code(&self) -> u16 {
        match self {
            Self::TableInfo(_) => TABLE_INFO,
            _ => SERVER_TO_CLIENT,
        }
    }

    pub fn into_envelope(self) -> Envelope<ServerMessage> {
        self.into()
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::ChangeTurn(snapshot) => format!("state of {}", snapshot.participant),
            Self::JokerChoice(prompt) => format!("joker choice among {:?}", prompt.options),
            Self::GameOver { winner } if winner.is_empty() => "game over (draw)".to_string(),
            Self::GameOver { winner } => format!("game over, {winner} wins"),
            Self::TableInfo(_) => "table info".to_string(),
        };
        write!(f, "{repr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_move_request_parses_wire_shape() {
        let raw = json!({"type": "MOVE", "action": "lock", "diceIndices": [0, 4, 9, -1]});
        let request: MoveRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(request.action, MoveKind::Lock);
        assert_eq!(Move::try_from(&request), Ok(Move::Lock(vec![0, 4])));
    }

    #[test]
    fn test_unknown_action_is_not_a_parse_error() {
        let raw = json!({"type": "MOVE", "action": "cheat"});
        let request: MoveRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(Move::try_from(&request), Err(UserError::UnknownAction));
    }

    #[test]
    fn test_non_move_packet_rejected() {
        let raw = json!({"type": "PING", "action": "roll"});
        let request: MoveRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(request.packet, PacketType::Unknown);
        assert_eq!(Move::try_from(&request), Err(UserError::UnrecognizedPacket));
    }

    #[test]
    fn test_score_requires_known_category() {
        let missing = MoveRequest {
            category: None,
            ..MoveRequest::score(Category::Chance)
        };
        assert_eq!(Move::try_from(&missing), Err(UserError::MissingCategory));

        let bogus = MoveRequest {
            category: Some("Pairs".to_string()),
            ..MoveRequest::score(Category::Chance)
        };
        assert_eq!(
            Move::try_from(&bogus),
            Err(UserError::UnknownCategory("Pairs".to_string()))
        );
        assert_eq!(
            Move::try_from(&MoveRequest::joker(Category::Yatzy)),
            Ok(Move::Joker(Category::Yatzy))
        );
    }

    #[test]
    fn test_client_payload_distinguishes_leave() {
        let leave: ClientPayload = serde_json::from_value(json!({"type": "LEAVE"})).unwrap();
        assert!(matches!(leave, ClientPayload::Leave(_)));

        let roll: ClientPayload =
            serde_json::from_value(json!({"type": "MOVE", "action": "roll"})).unwrap();
        assert!(matches!(roll, ClientPayload::Move(_)));
    }

    #[test]
    fn test_server_messages_are_tagged() {
        let over = ServerMessage::GameOver {
            winner: String::new(),
        };
        assert_eq!(over.code(), SERVER_TO_CLIENT);
        let value = serde_json::to_value(over.into_envelope()).unwrap();
        assert_eq!(
            value,
            json!({"code": 5002, "data": {"type": "GAME_OVER", "winner": ""}})
        );

        let prompt = ServerMessage::JokerChoice(JokerPrompt {
            options: vec![Category::Chance],
            dice_value: 3,
        });
        let value = serde_json::to_value(&prompt).unwrap();
        assert_eq!(
            value,
            json!({"type": "JOKER_CHOICE", "options": ["Chance"], "diceValue": 3})
        );
    }

    #[test]
    fn test_snapshot_field_names() {
        let snapshot = Snapshot {
            participant: ParticipantId::new("alice"),
            dice: [1, 2, 3, 4, 5],
            rolls_left: 2,
            locked_dice: [false; NUM_DICE],
            scores: BTreeMap::new(),
            current_turn: Some(ParticipantId::new("alice")),
            has_rolled_this_turn: None,
            pending_joker: false,
            game_over: false,
        };
        let message = ServerMessage::TableInfo(snapshot);
        assert_eq!(message.code(), TABLE_INFO);
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "TABLE_INFO");
        assert_eq!(value["rollsLeft"], 2);
        assert_eq!(value["currentPlayerTurn"], "alice");
        assert!(value.get("hasRolledThisTurn").is_none());
    }
}
