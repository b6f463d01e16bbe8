//! Guess the number: both players race to find a secret between 1 and 100.
//!
//! There are no turns. A correct guess wins on the spot. A player who uses
//! up their guesses without finding it hands the win to the other seat.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use parlor_protocol::{
    GameKind, GameMove, GameSnapshot, GuessHint, MoveResult, NumberGuessResult, Seat,
};
use rand::Rng;

use crate::{Actor, GameRules, Outcome};

pub const SECRET_RANGE: RangeInclusive<u32> = 1..=100;
pub const MAX_GUESSES: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessNumber {
    target: u32,
    guesses: [Vec<u32>; 2],
    winner: Option<Seat>,
    active: bool,
}

impl GuessNumber {
    fn winner_token(&self) -> &'static str {
        self.winner.map_or("", |seat| Self::KIND.token(seat))
    }

    /// The target, once nothing is left to guess.
    fn revealed_target(&self) -> Option<u32> {
        self.winner.map(|_| self.target)
    }
}

impl GameRules for GuessNumber {
    const KIND: GameKind = GameKind::GuessNumber;

    fn initial<R: Rng>(rng: &mut R) -> Self {
        Self {
            target: rng.random_range(SECRET_RANGE),
            guesses: [Vec::new(), Vec::new()],
            winner: None,
            active: true,
        }
    }

    fn apply_move(&mut self, actor: Actor<'_>, mv: &GameMove) -> Option<MoveResult> {
        let GameMove::GuessNumber { number } = *mv else {
            return None;
        };
        let guess = u32::try_from(number)
            .ok()
            .filter(|n| SECRET_RANGE.contains(n))?;
        let mine = &mut self.guesses[actor.seat.index()];
        if mine.len() as u32 >= MAX_GUESSES {
            return None;
        }
        mine.push(guess);
        let used = mine.len() as u32;

        let hint = match guess.cmp(&self.target) {
            std::cmp::Ordering::Less => GuessHint::Higher,
            std::cmp::Ordering::Greater => GuessHint::Lower,
            std::cmp::Ordering::Equal => GuessHint::Correct,
        };
        if hint == GuessHint::Correct {
            self.winner = Some(actor.seat);
        } else if used >= MAX_GUESSES {
            self.winner = Some(actor.seat.other());
        }

        Some(MoveResult::NumberGuess(NumberGuessResult {
            player: Self::KIND.token(actor.seat),
            username: actor.username.to_string(),
            guess,
            result: hint,
            game_active: self.winner.is_none(),
            winner: self.winner_token(),
            target: self.revealed_target(),
        }))
    }

    fn check_terminal(&self) -> Outcome {
        self.winner.map_or(Outcome::InProgress, Outcome::Win)
    }

    fn finish(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn snapshot(&self) -> GameSnapshot {
        let guesses: BTreeMap<&'static str, Vec<u32>> = [Seat::First, Seat::Second]
            .into_iter()
            .map(|seat| (Self::KIND.token(seat), self.guesses[seat.index()].clone()))
            .collect();
        GameSnapshot::GuessNumber {
            guesses,
            max_guesses: MAX_GUESSES,
            game_active: self.active,
            winner: self.winner_token(),
            target: self.revealed_target(),
        }
    }
}
