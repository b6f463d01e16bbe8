//! Everything the server sends to clients.
//!
//! A [`ServerEvent`] is a typed outbound message. The room layer builds
//! them and pairs each with a [`Recipient`]; the connection's writer turns
//! them into an [`OutboundFrame`] and hands that to the codec.

use serde::Serialize;

use parlor_transport::ConnectionId;

use crate::{GameKind, GameSnapshot, MoveResult, OutboundFrame, ProtocolError};

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Specifies who in a room should receive an event.
///
/// Rooms produce `(Recipient, ServerEvent)` pairs; their fan-out resolves
/// the recipient against current membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every member of the room.
    All,

    /// One member, by the connection they are currently bound to.
    Connection(ConnectionId),

    /// Every member except one. Used to tell the others someone left.
    AllExcept(ConnectionId),
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// `roomCreated` / `roomJoined`: which seat you got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomAssignment {
    pub code: String,
    pub role: &'static str,
    pub game_type: GameKind,
    pub is_host: bool,
    pub username: String,
}

/// One row of the lobby's player list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyPlayer {
    pub username: String,
    pub role: &'static str,
    pub is_host: bool,
}

/// `lobbyUpdate`: who is in the room. `is_host` and `username` describe the
/// receiving member, so each member gets their own copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyUpdate {
    pub code: String,
    pub players: Vec<LobbyPlayer>,
    pub game_type: GameKind,
    pub is_host: bool,
    pub username: String,
}

/// `startGame`: both seats are filled. Personalized like [`LobbyUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGame {
    pub code: String,
    pub game_type: GameKind,
    pub is_host: bool,
    pub username: String,
}

/// `gameEnd`: the grid games' terminal announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEnd {
    /// The winning role token, or `"draw"`.
    pub winner: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_username: Option<String>,
}

impl GameEnd {
    /// The payload for a drawn game.
    pub fn draw() -> Self {
        Self {
            winner: "draw",
            winner_username: None,
        }
    }
}

/// `playerLeft`: a member's connection dropped. Their seat is held for the
/// grace period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLeft {
    pub player: &'static str,
    pub username: String,
    pub is_host: bool,
}

/// `chatMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub username: String,
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub role: &'static str,
}

// ---------------------------------------------------------------------------
// ServerEvent
// ---------------------------------------------------------------------------

/// A message from the server to one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    RoomCreated(RoomAssignment),
    RoomJoined(RoomAssignment),
    LobbyUpdate(LobbyUpdate),
    StartGame(StartGame),
    GameState(GameSnapshot),
    /// A move-result broadcast; the kind comes from the result itself.
    Move(MoveResult),
    GameEnd(GameEnd),
    PlayerLeft(PlayerLeft),
    /// The host's seat was vacated and the room closed.
    HostLeft { host: String },
    /// A client-visible failure, sent as plain text.
    Error(String),
    ChatMessage(ChatMessage),
    /// The host reset the game.
    Restart,
}

impl ServerEvent {
    /// The envelope `type` this event travels under.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::RoomCreated(_) => "roomCreated",
            ServerEvent::RoomJoined(_) => "roomJoined",
            ServerEvent::LobbyUpdate(_) => "lobbyUpdate",
            ServerEvent::StartGame(_) => "startGame",
            ServerEvent::GameState(_) => "gameState",
            ServerEvent::Move(result) => result.kind(),
            ServerEvent::GameEnd(_) => "gameEnd",
            ServerEvent::PlayerLeft(_) => "playerLeft",
            ServerEvent::HostLeft { .. } => "hostLeft",
            ServerEvent::Error(_) => "error",
            ServerEvent::ChatMessage(_) => "chatMessage",
            ServerEvent::Restart => "restart",
        }
    }

    /// Renders the event into its wire frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if a structured payload fails to
    /// serialize.
    pub fn to_frame(&self) -> Result<OutboundFrame, ProtocolError> {
        let payload = match self {
            ServerEvent::RoomCreated(p) | ServerEvent::RoomJoined(p) => json(p)?,
            ServerEvent::LobbyUpdate(p) => json(p)?,
            ServerEvent::StartGame(p) => json(p)?,
            ServerEvent::GameState(p) => json(p)?,
            ServerEvent::Move(p) => json(p)?,
            ServerEvent::GameEnd(p) => json(p)?,
            ServerEvent::PlayerLeft(p) => json(p)?,
            ServerEvent::ChatMessage(p) => json(p)?,
            ServerEvent::HostLeft { host } => {
                format!("Host {host} has left the game")
            }
            ServerEvent::Error(message) => message.clone(),
            ServerEvent::Restart => String::new(),
        };
        Ok(OutboundFrame {
            kind: self.kind().to_string(),
            payload,
        })
    }
}

fn json<T: Serialize>(payload: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(payload).map_err(ProtocolError::Encode)
}
