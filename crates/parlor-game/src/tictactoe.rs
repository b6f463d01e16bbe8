//! Noughts and crosses.

use parlor_protocol::{GameKind, GameMove, GameSnapshot, MoveResult, PlaceResult, Seat};
use rand::Rng;

use crate::{Actor, GameRules, Outcome};

/// The eight winning lines, as cell indices.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A 3x3 board, cells indexed 0..9 row by row. `X` (the first seat) opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicTacToe {
    board: [Option<Seat>; 9],
    turn: Seat,
    active: bool,
}

impl TicTacToe {
    fn token(seat: Seat) -> &'static str {
        Self::KIND.token(seat)
    }
}

impl GameRules for TicTacToe {
    const KIND: GameKind = GameKind::TicTacToe;
    const ANNOUNCES_END: bool = true;

    fn initial<R: Rng>(_rng: &mut R) -> Self {
        Self {
            board: [None; 9],
            turn: Seat::First,
            active: true,
        }
    }

    fn apply_move(&mut self, actor: Actor<'_>, mv: &GameMove) -> Option<MoveResult> {
        let GameMove::Place { index } = *mv else {
            return None;
        };
        if actor.seat != self.turn {
            return None;
        }
        let index = usize::try_from(index).ok().filter(|i| *i < 9)?;
        if self.board[index].is_some() {
            return None;
        }

        self.board[index] = Some(actor.seat);
        self.turn = self.turn.other();

        Some(MoveResult::Place(PlaceResult {
            index,
            player: Self::token(actor.seat),
            username: actor.username.to_string(),
        }))
    }

    fn check_terminal(&self) -> Outcome {
        for [a, b, c] in LINES {
            if let Some(seat) = self.board[a] {
                if self.board[b] == Some(seat) && self.board[c] == Some(seat) {
                    return Outcome::Win(seat);
                }
            }
        }
        if self.board.iter().all(Option::is_some) {
            Outcome::Draw
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
        GameSnapshot::TicTacToe {
            board: self
                .board
                .iter()
                .map(|cell| cell.map_or("", Self::token))
                .collect(),
            current_turn: Self::token(self.turn),
            game_active: self.active,
        }
    }
}
