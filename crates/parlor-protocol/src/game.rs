//! Game-facing wire types: which game a room plays, who sits where, and
//! the payloads the game state machines put on the wire.
//!
//! The state machines themselves live in `parlor-game`. They build the
//! structs in this module, and the room layer wraps them in a
//! [`ServerEvent`](crate::ServerEvent) without ever looking inside.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// GameKind
// ---------------------------------------------------------------------------

/// The rule set a room is playing.
///
/// Serialized in lowercase (`"tictactoe"`, `"connect4"`, ...), which is the
/// `gameType` string clients send on `create` and receive back in every
/// assignment and lobby payload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    /// Noughts and crosses on a 3x3 board. Used when `gameType` is absent.
    #[default]
    TicTacToe,
    /// Rock-paper-scissors, played in rounds.
    Rps,
    /// Drop discs into a 6x7 grid, four in a row wins.
    Connect4,
    /// Both players race to guess a secret number.
    GuessNumber,
    /// Players take turns revealing letters of a shared secret word.
    WordGuess,
    /// Dots and boxes on a 4x4 dot grid.
    Dots,
}

impl GameKind {
    /// Every variant, in declaration order.
    pub const ALL: [GameKind; 6] = [
        GameKind::TicTacToe,
        GameKind::Rps,
        GameKind::Connect4,
        GameKind::GuessNumber,
        GameKind::WordGuess,
        GameKind::Dots,
    ];

    /// The wire name of this variant.
    pub fn as_str(self) -> &'static str {
        match self {
            GameKind::TicTacToe => "tictactoe",
            GameKind::Rps => "rps",
            GameKind::Connect4 => "connect4",
            GameKind::GuessNumber => "guessnumber",
            GameKind::WordGuess => "wordguess",
            GameKind::Dots => "dots",
        }
    }

    /// The role token shown to clients for a seat in this variant.
    ///
    /// ```rust
    /// use parlor_protocol::{GameKind, Seat};
    ///
    /// assert_eq!(GameKind::TicTacToe.token(Seat::First), "X");
    /// assert_eq!(GameKind::Connect4.token(Seat::Second), "Yellow");
    /// assert_eq!(GameKind::Dots.token(Seat::First), "P1");
    /// ```
    pub fn token(self, seat: Seat) -> &'static str {
        match (self, seat) {
            (GameKind::TicTacToe, Seat::First) => "X",
            (GameKind::TicTacToe, Seat::Second) => "O",
            (GameKind::Connect4, Seat::First) => "Red",
            (GameKind::Connect4, Seat::Second) => "Yellow",
            (_, Seat::First) => "P1",
            (_, Seat::Second) => "P2",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = ProtocolError;

    /// Parses a `gameType` string. An empty string means tic-tac-toe,
    /// matching what clients get when they omit the field.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(GameKind::TicTacToe);
        }
        GameKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                ProtocolError::InvalidMessage(format!("unknown game type {s:?}"))
            })
    }
}

// ---------------------------------------------------------------------------
// Seat
// ---------------------------------------------------------------------------

/// One of the two seats in a room.
///
/// The creator always takes [`Seat::First`]. A seat is game-agnostic; turn
/// it into the client-visible token with [`GameKind::token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Seat {
    /// The host's seat. Moves first wherever the game has turns.
    First,
    /// The joiner's seat.
    Second,
}

impl Seat {
    /// The opposite seat.
    pub fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    /// `0` for the first seat, `1` for the second. Handy for indexing
    /// per-seat arrays.
    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Small move vocabulary
// ---------------------------------------------------------------------------

/// A rock-paper-scissors hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Rock,
    Paper,
    Scissors,
}

impl Hand {
    /// Returns `true` if `self` wins against `other`.
    pub fn beats(self, other: Hand) -> bool {
        matches!(
            (self, other),
            (Hand::Rock, Hand::Scissors)
                | (Hand::Paper, Hand::Rock)
                | (Hand::Scissors, Hand::Paper)
        )
    }
}

/// Which way a dots-and-boxes line runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineOrientation {
    Horizontal,
    Vertical,
}

/// Whether a number guess was too low, too high, or right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuessHint {
    /// The secret is higher than the guess.
    Higher,
    /// The secret is lower than the guess.
    Lower,
    Correct,
}

// ---------------------------------------------------------------------------
// Move results
// ---------------------------------------------------------------------------

/// `move`: a mark was placed on the tic-tac-toe board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceResult {
    pub index: usize,
    pub player: &'static str,
    pub username: String,
}

/// `connect4Move`: a disc landed at `row` in `column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropResult {
    pub row: usize,
    pub column: usize,
    pub player: &'static str,
    pub username: String,
}

/// `rpsChoiceMade`: a player locked in a hand. The hand itself stays
/// hidden until the round resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceMade {
    pub player: &'static str,
    pub username: String,
}

/// `rpsResult`: both hands revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundResult {
    pub p1: Hand,
    pub p2: Hand,
    /// `"P1"`, `"P2"` or `"draw"`.
    pub winner: &'static str,
    pub round: u32,
}

/// `numberGuessResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberGuessResult {
    pub player: &'static str,
    pub username: String,
    pub guess: u32,
    pub result: GuessHint,
    pub game_active: bool,
    /// Winning role token, or empty while nobody has won.
    pub winner: &'static str,
    /// Only revealed once the game is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
}

/// `letterGuessResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterGuessResult {
    pub letter: String,
    pub found: bool,
    pub guessed_word: Vec<String>,
    pub guessed_letters: Vec<String>,
    pub wrong_guesses: u32,
    pub game_active: bool,
    pub current_turn: &'static str,
    /// Only revealed once the game is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
}

/// `dotsMove`: a line was drawn, possibly closing boxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineResult {
    #[serde(rename = "type")]
    pub orientation: LineOrientation,
    pub row: usize,
    pub col: usize,
    pub player: &'static str,
    pub username: String,
    /// `[row, col]` of every box this line closed.
    pub captured: Vec<[usize; 2]>,
    pub scores: BTreeMap<&'static str, u32>,
    pub current_turn: &'static str,
    pub game_active: bool,
    /// Leading token or `"draw"` once the board is full, empty before.
    pub winner: &'static str,
}

/// The public outcome of one accepted move.
///
/// Serialized untagged: the event kind travels in the envelope's `type`
/// field (see [`MoveResult::kind`]), the struct becomes the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MoveResult {
    Place(PlaceResult),
    Drop(DropResult),
    ChoiceMade(ChoiceMade),
    Round(RoundResult),
    NumberGuess(NumberGuessResult),
    LetterGuess(LetterGuessResult),
    Line(LineResult),
}

impl MoveResult {
    /// The envelope `type` this result is broadcast under.
    pub fn kind(&self) -> &'static str {
        match self {
            MoveResult::Place(_) => "move",
            MoveResult::Drop(_) => "connect4Move",
            MoveResult::ChoiceMade(_) => "rpsChoiceMade",
            MoveResult::Round(_) => "rpsResult",
            MoveResult::NumberGuess(_) => "numberGuessResult",
            MoveResult::LetterGuess(_) => "letterGuessResult",
            MoveResult::Line(_) => "dotsMove",
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// A drawn dots-and-boxes line as it appears in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawnLine {
    #[serde(rename = "type")]
    pub orientation: LineOrientation,
    pub row: usize,
    pub col: usize,
    pub player: &'static str,
}

/// The `gameState` payload: everything a (re)joining client needs to
/// redraw the game. Secrets (RPS hands, the target number, the hidden
/// word) are left out while the game is still running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum GameSnapshot {
    /// Nine cells, each `""`, `"X"` or `"O"`.
    TicTacToe {
        board: Vec<&'static str>,
        current_turn: &'static str,
        game_active: bool,
    },
    /// Seats that have locked in a hand this round.
    Rps {
        chosen: Vec<&'static str>,
        round: u32,
    },
    /// Six rows of seven cells, top row first.
    Connect4 {
        board: Vec<Vec<&'static str>>,
        current_turn: &'static str,
        game_active: bool,
    },
    GuessNumber {
        guesses: BTreeMap<&'static str, Vec<u32>>,
        max_guesses: u32,
        game_active: bool,
        winner: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<u32>,
    },
    WordGuess {
        guessed_word: Vec<String>,
        guessed_letters: Vec<String>,
        wrong_guesses: u32,
        max_wrong_guesses: u32,
        game_active: bool,
        current_turn: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        word: Option<String>,
    },
    Dots {
        lines: Vec<DrawnLine>,
        /// Three rows of three boxes, each `""` or the owner's token.
        boxes: Vec<Vec<&'static str>>,
        scores: BTreeMap<&'static str, u32>,
        current_turn: &'static str,
        game_active: bool,
    },
}
