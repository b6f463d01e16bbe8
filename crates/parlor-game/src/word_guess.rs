//! Cooperative word guessing.
//!
//! Both players share one secret word and take turns guessing letters. The
//! team wins by revealing every letter and loses after too many misses.

use parlor_protocol::{GameKind, GameMove, GameSnapshot, LetterGuessResult, MoveResult, Seat};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::{Actor, GameRules, Outcome};

pub const MAX_WRONG_GUESSES: u32 = 6;

pub const WORDS: &[&str] = &[
    "JAVASCRIPT", "COMPUTER", "PROGRAMMING", "WEBSITE", "INTERNET", "KEYBOARD",
    "MONITOR", "SOFTWARE", "HARDWARE", "DATABASE", "NETWORK", "SECURITY",
    "ALGORITHM", "FUNCTION", "VARIABLE", "OBJECT", "ARRAY", "STRING",
    "BOOLEAN", "INTEGER", "FRAMEWORK", "LIBRARY", "BROWSER", "SERVER",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordGuess {
    word: &'static str,
    guessed: Vec<char>,
    wrong: u32,
    turn: Seat,
    active: bool,
}

impl WordGuess {
    fn with_word(word: &'static str) -> Self {
        Self {
            word,
            guessed: Vec::new(),
            wrong: 0,
            turn: Seat::First,
            active: true,
        }
    }

    fn solved(&self) -> bool {
        self.word.chars().all(|c| self.guessed.contains(&c))
    }

    /// The word with unguessed letters masked as `_`.
    fn masked(&self) -> Vec<String> {
        self.word
            .chars()
            .map(|c| {
                if self.guessed.contains(&c) {
                    c.to_string()
                } else {
                    "_".to_string()
                }
            })
            .collect()
    }

    fn guessed_letters(&self) -> Vec<String> {
        self.guessed.iter().map(char::to_string).collect()
    }

    fn revealed_word(&self) -> Option<String> {
        self.check_terminal()
            .is_terminal()
            .then(|| self.word.to_string())
    }
}

impl GameRules for WordGuess {
    const KIND: GameKind = GameKind::WordGuess;

    fn initial<R: Rng>(rng: &mut R) -> Self {
        // WORDS is a non-empty constant, so `choose` always yields a word.
        let word = WORDS.choose(rng).copied().unwrap_or("PARLOR");
        Self::with_word(word)
    }

    fn apply_move(&mut self, actor: Actor<'_>, mv: &GameMove) -> Option<MoveResult> {
        let GameMove::GuessLetter { letter } = *mv else {
            return None;
        };
        if actor.seat != self.turn || self.guessed.contains(&letter) {
            return None;
        }

        self.guessed.push(letter);
        let found = self.word.contains(letter);
        if !found {
            self.wrong += 1;
        }
        let running = !self.check_terminal().is_terminal();
        if running {
            self.turn = self.turn.other();
        }

        Some(MoveResult::LetterGuess(LetterGuessResult {
            letter: letter.to_string(),
            found,
            guessed_word: self.masked(),
            guessed_letters: self.guessed_letters(),
            wrong_guesses: self.wrong,
            game_active: running,
            current_turn: Self::KIND.token(self.turn),
            word: self.revealed_word(),
        }))
    }

    fn check_terminal(&self) -> Outcome {
        if self.solved() {
            Outcome::Solved
        } else if self.wrong >= MAX_WRONG_GUESSES {
            Outcome::Failed
        } else {
            Outcome::InProgress
        }
    }

    fn finish(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::WordGuess {
            guessed_word: self.masked(),
            guessed_letters: self.guessed_letters(),
            wrong_guesses: self.wrong,
            max_wrong_guesses: MAX_WRONG_GUESSES,
            game_active: self.active,
            current_turn: Self::KIND.token(self.turn),
            word: self.revealed_word(),
        }
    }
}
