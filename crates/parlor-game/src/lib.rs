//! Game state machines for Parlor rooms.
//!
//! Every game implements the [`GameRules`] trait. The room layer never talks
//! to a concrete game; it holds a [`GameState`], the sum type with one case
//! per [`GameKind`], and drives it through the same handful of calls:
//!
//! ```text
//! GameState::new(kind, rng)      fresh game
//! state.play(actor, &move)       None = illegal / inactive, nothing changed
//!                                Some(Applied { result, outcome })
//! state.snapshot()               the `gameState` payload
//! state.restart(rng)             host-only reset, back to `new`
//! ```
//!
//! ## The contract
//!
//! - An illegal or out-of-turn move returns `None` and leaves the state
//!   exactly as it was.
//! - A legal move mutates the state and returns exactly one public
//!   [`MoveResult`].
//! - Once a game reports a terminal [`Outcome`], it is finished: every later
//!   move returns `None` until [`GameState::restart`].

mod connect_four;
mod dots;
mod guess_number;
mod rps;
mod tictactoe;
mod word_guess;

pub use connect_four::ConnectFour;
pub use dots::Dots;
pub use guess_number::GuessNumber;
pub use rps::RockPaperScissors;
pub use tictactoe::TicTacToe;
pub use word_guess::WordGuess;

use parlor_protocol::{GameKind, GameMove, GameSnapshot, MoveResult, Seat};
use rand::Rng;

/// Who is making a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor<'a> {
    pub seat: Seat,
    pub username: &'a str,
}

impl<'a> Actor<'a> {
    pub fn new(seat: Seat, username: &'a str) -> Self {
        Self { seat, username }
    }
}

/// Where a game stands after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nobody has won yet.
    InProgress,
    /// One seat won.
    Win(Seat),
    /// Board full, nobody won.
    Draw,
    /// Cooperative game won by both players.
    Solved,
    /// Cooperative game lost by both players.
    Failed,
}

impl Outcome {
    /// Returns `true` for every outcome except [`Outcome::InProgress`].
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// A move that was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// The broadcast describing the move.
    pub result: MoveResult,
    /// The game's outcome after the move.
    pub outcome: Outcome,
}

/// The rules of one game.
///
/// Implementors provide the primitive steps; [`play`](Self::play) strings
/// them together and is what callers use.
pub trait GameRules: Sized + Send + 'static {
    /// The variant this game implements.
    const KIND: GameKind;

    /// Whether a terminal outcome is announced with a separate `gameEnd`
    /// event. Games that report termination inside their own move result
    /// leave this `false`.
    const ANNOUNCES_END: bool = false;

    /// Builds the starting position. Games with secrets draw them from
    /// `rng`.
    fn initial<R: Rng>(rng: &mut R) -> Self;

    /// Validates and applies one move.
    ///
    /// Returns `None` (state untouched) if the move is illegal for this
    /// game, out of turn, or of the wrong kind.
    fn apply_move(&mut self, actor: Actor<'_>, mv: &GameMove) -> Option<MoveResult>;

    /// Inspects the current position.
    fn check_terminal(&self) -> Outcome;

    /// Marks the game finished. Later moves are rejected.
    fn finish(&mut self);

    /// Returns `false` once the game has finished.
    fn is_active(&self) -> bool;

    /// The client-facing view of the game.
    fn snapshot(&self) -> GameSnapshot;

    /// Applies a move and settles the outcome.
    fn play(&mut self, actor: Actor<'_>, mv: &GameMove) -> Option<Applied> {
        if !self.is_active() {
            return None;
        }
        let result = self.apply_move(actor, mv)?;
        let outcome = self.check_terminal();
        if outcome.is_terminal() {
            self.finish();
        }
        Some(Applied { result, outcome })
    }
}

/// The game a room is playing, one case per [`GameKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameState {
    TicTacToe(TicTacToe),
    Rps(RockPaperScissors),
    Connect4(ConnectFour),
    GuessNumber(GuessNumber),
    WordGuess(WordGuess),
    Dots(Dots),
}

impl GameState {
    /// Starts a fresh game of the given kind.
    pub fn new<R: Rng>(kind: GameKind, rng: &mut R) -> Self {
        match kind {
            GameKind::TicTacToe => GameState::TicTacToe(TicTacToe::initial(rng)),
            GameKind::Rps => GameState::Rps(RockPaperScissors::initial(rng)),
            GameKind::Connect4 => GameState::Connect4(ConnectFour::initial(rng)),
            GameKind::GuessNumber => {
                GameState::GuessNumber(GuessNumber::initial(rng))
            }
            GameKind::WordGuess => GameState::WordGuess(WordGuess::initial(rng)),
            GameKind::Dots => GameState::Dots(Dots::initial(rng)),
        }
    }

    pub fn kind(&self) -> GameKind {
        match self {
            GameState::TicTacToe(_) => TicTacToe::KIND,
            GameState::Rps(_) => RockPaperScissors::KIND,
            GameState::Connect4(_) => ConnectFour::KIND,
            GameState::GuessNumber(_) => GuessNumber::KIND,
            GameState::WordGuess(_) => WordGuess::KIND,
            GameState::Dots(_) => Dots::KIND,
        }
    }

    /// See [`GameRules::play`].
    pub fn play(&mut self, actor: Actor<'_>, mv: &GameMove) -> Option<Applied> {
        match self {
            GameState::TicTacToe(g) => g.play(actor, mv),
            GameState::Rps(g) => g.play(actor, mv),
            GameState::Connect4(g) => g.play(actor, mv),
            GameState::GuessNumber(g) => g.play(actor, mv),
            GameState::WordGuess(g) => g.play(actor, mv),
            GameState::Dots(g) => g.play(actor, mv),
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        match self {
            GameState::TicTacToe(g) => g.snapshot(),
            GameState::Rps(g) => g.snapshot(),
            GameState::Connect4(g) => g.snapshot(),
            GameState::GuessNumber(g) => g.snapshot(),
            GameState::WordGuess(g) => g.snapshot(),
            GameState::Dots(g) => g.snapshot(),
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            GameState::TicTacToe(g) => g.is_active(),
            GameState::Rps(g) => g.is_active(),
            GameState::Connect4(g) => g.is_active(),
            GameState::GuessNumber(g) => g.is_active(),
            GameState::WordGuess(g) => g.is_active(),
            GameState::Dots(g) => g.is_active(),
        }
    }

    /// See [`GameRules::ANNOUNCES_END`].
    pub fn announces_end(&self) -> bool {
        match self {
            GameState::TicTacToe(_) => TicTacToe::ANNOUNCES_END,
            GameState::Rps(_) => RockPaperScissors::ANNOUNCES_END,
            GameState::Connect4(_) => ConnectFour::ANNOUNCES_END,
            GameState::GuessNumber(_) => GuessNumber::ANNOUNCES_END,
            GameState::WordGuess(_) => WordGuess::ANNOUNCES_END,
            GameState::Dots(_) => Dots::ANNOUNCES_END,
        }
    }

    /// Throws the current game away and starts over with the same kind.
    pub fn restart<R: Rng>(&mut self, rng: &mut R) {
        *self = GameState::new(self.kind(), rng);
    }
}
