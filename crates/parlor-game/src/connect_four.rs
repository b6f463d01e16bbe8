//! Connect four on a 6x7 grid.
//!
//! Row 0 is the top of the board; discs fall towards row 5. Only the cell a
//! disc just landed in can complete a new run, so the win check walks the
//! four line directions out from that cell instead of scanning the board.

use parlor_protocol::{DropResult, GameKind, GameMove, GameSnapshot, MoveResult, Seat};
use rand::Rng;

use crate::{Actor, GameRules, Outcome};

pub const ROWS: usize = 6;
pub const COLUMNS: usize = 7;
const RUN: usize = 4;

/// Horizontal, vertical and both diagonals. Each is walked both ways.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectFour {
    board: [[Option<Seat>; COLUMNS]; ROWS],
    turn: Seat,
    active: bool,
    last: Option<(usize, usize)>,
}

impl ConnectFour {
    fn token(seat: Seat) -> &'static str {
        Self::KIND.token(seat)
    }

    /// Lowest empty row in `column`, if the column isn't full.
    fn landing_row(&self, column: usize) -> Option<usize> {
        (0..ROWS).rev().find(|&row| self.board[row][column].is_none())
    }

    fn cell(&self, row: isize, col: isize) -> Option<Seat> {
        let row = usize::try_from(row).ok().filter(|r| *r < ROWS)?;
        let col = usize::try_from(col).ok().filter(|c| *c < COLUMNS)?;
        self.board[row][col]
    }

    /// Length of the run through `(row, col)` along `(dr, dc)`.
    fn run_length(&self, row: usize, col: usize, (dr, dc): (isize, isize)) -> usize {
        let Some(seat) = self.board[row][col] else {
            return 0;
        };
        let mut count = 1;
        for sign in [1, -1] {
            let (mut r, mut c) = (row as isize + dr * sign, col as isize + dc * sign);
            while self.cell(r, c) == Some(seat) {
                count += 1;
                r += dr * sign;
                c += dc * sign;
            }
        }
        count
    }
}

impl GameRules for ConnectFour {
    const KIND: GameKind = GameKind::Connect4;
    const ANNOUNCES_END: bool = true;

    fn initial<R: Rng>(_rng: &mut R) -> Self {
        Self {
            board: [[None; COLUMNS]; ROWS],
            turn: Seat::First,
            active: true,
            last: None,
        }
    }

    fn apply_move(&mut self, actor: Actor<'_>, mv: &GameMove) -> Option<MoveResult> {
        let GameMove::Drop { column } = *mv else {
            return None;
        };
        if actor.seat != self.turn {
            return None;
        }
        let column = usize::try_from(column).ok().filter(|c| *c < COLUMNS)?;
        let row = self.landing_row(column)?;

        self.board[row][column] = Some(actor.seat);
        self.last = Some((row, column));
        self.turn = self.turn.other();

        Some(MoveResult::Drop(DropResult {
            row,
            column,
            player: Self::token(actor.seat),
            username: actor.username.to_string(),
        }))
    }

    fn check_terminal(&self) -> Outcome {
        if let Some((row, col)) = self.last {
            if let Some(seat) = self.board[row][col] {
                if DIRECTIONS
                    .iter()
                    .any(|dir| self.run_length(row, col, *dir) >= RUN)
                {
                    return Outcome::Win(seat);
                }
            }
        }
        if self.board[0].iter().all(Option::is_some) {
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
        GameSnapshot::Connect4 {
            board: self
                .board
                .iter()
                .map(|row| row.iter().map(|cell| cell.map_or("", Self::token)).collect())
                .collect(),
            current_turn: Self::token(self.turn),
            game_active: self.active,
        }
    }
}
