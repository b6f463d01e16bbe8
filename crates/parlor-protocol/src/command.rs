//! Classifying inbound envelopes into typed commands.
//!
//! [`Command::from_envelope`] is the single place where raw client input
//! gets validated. Anything that comes out of it is structurally sound:
//! names are non-empty, room codes are normalized, chat fits the length
//! limit. Whether a command is *allowed* (your turn? room full?) is a
//! question for the room and game layers.

use serde::Deserialize;

use crate::{Envelope, GameKind, Hand, LineOrientation, ProtocolError};

/// Longest chat message accepted, in characters.
pub const MAX_CHAT_LEN: usize = 500;

/// A game move, as requested by a client.
///
/// Numeric fields are kept signed and unbounded here: range checks are part
/// of each game's legality rules, and an out-of-range move is an illegal
/// move (silently ignored), not malformed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameMove {
    /// `move`: mark a tic-tac-toe cell.
    Place { index: i64 },
    /// `connect4Move`: drop a disc into a column.
    Drop { column: i64 },
    /// `rpsChoice`: lock in a hand for this round.
    Throw { hand: Hand },
    /// `numberGuess`: guess the secret number.
    GuessNumber { number: i64 },
    /// `letterGuess`: guess one letter (already uppercased).
    GuessLetter { letter: char },
    /// `dotsMove`: draw a line.
    DrawLine {
        orientation: LineOrientation,
        row: i64,
        col: i64,
    },
}

/// A fully decoded client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a new room and take the first seat.
    Create { game: GameKind, username: String },
    /// Take a seat in an existing room, or reclaim one by name.
    Join { code: String, username: String },
    /// Play a move in the current room.
    Move(GameMove),
    /// Reset the game (host only).
    Restart,
    /// Ask for a full state snapshot. Without a code, the connection's
    /// current room is used.
    GetGameState { code: Option<String> },
    /// Say something to the room.
    Chat { message: String },
    /// Give up the seat immediately, without a grace period.
    Leave,
}

#[derive(Deserialize)]
struct JoinPayload {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Deserialize)]
struct PlacePayload {
    index: i64,
}

#[derive(Deserialize)]
struct DropPayload {
    column: i64,
}

#[derive(Deserialize)]
struct ThrowPayload {
    choice: Hand,
}

#[derive(Deserialize)]
struct NumberPayload {
    number: i64,
}

#[derive(Deserialize)]
struct LetterPayload {
    letter: String,
}

#[derive(Deserialize)]
struct LinePayload {
    #[serde(rename = "type")]
    orientation: LineOrientation,
    row: i64,
    col: i64,
}

#[derive(Deserialize)]
struct StatePayload {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Deserialize)]
struct ChatPayload {
    message: String,
}

impl Command {
    /// Classifies an envelope.
    ///
    /// Returns `Ok(None)` for kinds this server doesn't know, which callers
    /// drop without a reply.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` when the payload doesn't parse, and
    /// `ProtocolError::InvalidMessage` when it parses but breaks a
    /// structural rule (blank name, unknown game type, bad letter, chat
    /// length).
    pub fn from_envelope(env: &Envelope) -> Result<Option<Command>, ProtocolError> {
        let command = match env.kind.as_str() {
            "create" => Command::Create {
                game: env.game_type.as_deref().unwrap_or_default().parse()?,
                username: display_name(env.username.as_deref())?,
            },
            "join" => {
                let p: JoinPayload = env.payload_as()?;
                let code = p
                    .code
                    .filter(|code| !code.trim().is_empty())
                    .or_else(|| env.code.clone());
                let username = p
                    .username
                    .filter(|name| !name.trim().is_empty())
                    .or_else(|| env.username.clone());
                Command::Join {
                    code: room_code(code.as_deref())?,
                    username: display_name(username.as_deref())?,
                }
            }
            "move" => {
                let p: PlacePayload = env.payload_as()?;
                Command::Move(GameMove::Place { index: p.index })
            }
            "connect4Move" => {
                let p: DropPayload = env.payload_as()?;
                Command::Move(GameMove::Drop { column: p.column })
            }
            "rpsChoice" => {
                let p: ThrowPayload = env.payload_as()?;
                Command::Move(GameMove::Throw { hand: p.choice })
            }
            "numberGuess" => {
                let p: NumberPayload = env.payload_as()?;
                Command::Move(GameMove::GuessNumber { number: p.number })
            }
            "letterGuess" => {
                let p: LetterPayload = env.payload_as()?;
                Command::Move(GameMove::GuessLetter {
                    letter: single_letter(&p.letter)?,
                })
            }
            "dotsMove" => {
                let p: LinePayload = env.payload_as()?;
                Command::Move(GameMove::DrawLine {
                    orientation: p.orientation,
                    row: p.row,
                    col: p.col,
                })
            }
            "restart" => Command::Restart,
            "getGameState" => {
                let p: StatePayload = env.payload_as()?;
                let code = p.code.or_else(|| env.code.clone());
                Command::GetGameState {
                    code: code
                        .filter(|c| !c.trim().is_empty())
                        .map(|c| normalize_code(&c)),
                }
            }
            "chat" => {
                let p: ChatPayload = env.payload_as()?;
                let len = p.message.chars().count();
                if len == 0 || len > MAX_CHAT_LEN {
                    return Err(ProtocolError::InvalidMessage(format!(
                        "chat message must be 1-{MAX_CHAT_LEN} characters, got {len}"
                    )));
                }
                Command::Chat { message: p.message }
            }
            "leave" => Command::Leave,
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

/// Room codes are matched case-insensitively: clients may type them in
/// lowercase.
fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

fn room_code(code: Option<&str>) -> Result<String, ProtocolError> {
    match code.map(normalize_code) {
        Some(code) if !code.is_empty() => Ok(code),
        _ => Err(ProtocolError::InvalidMessage("missing room code".into())),
    }
}

fn display_name(name: Option<&str>) -> Result<String, ProtocolError> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ProtocolError::InvalidMessage(
            "display name must not be empty".into(),
        )),
    }
}

fn single_letter(raw: &str) -> Result<char, ProtocolError> {
    let mut chars = raw.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(c.to_ascii_uppercase()),
        _ => Err(ProtocolError::InvalidMessage(format!(
            "expected a single letter, got {raw:?}"
        ))),
    }
}
