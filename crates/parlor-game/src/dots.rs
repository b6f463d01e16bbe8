//! Dots and boxes on a 4x4 grid of dots (3x3 boxes).
//!
//! Lines are addressed by orientation plus the dot they start from:
//!
//! ```text
//! horizontal (row, col): from dot (row, col) to (row, col + 1)   row 0..=3, col 0..=2
//! vertical   (row, col): from dot (row, col) to (row + 1, col)   row 0..=2, col 0..=3
//! ```
//!
//! Box `(r, c)` is closed by horizontals `(r, c)` and `(r + 1, c)` and
//! verticals `(r, c)` and `(r, c + 1)`. Closing a box scores it and earns
//! another turn.

use std::collections::BTreeMap;

use parlor_protocol::{
    DrawnLine, GameKind, GameMove, GameSnapshot, LineOrientation, LineResult, MoveResult, Seat,
};
use rand::Rng;

use crate::{Actor, GameRules, Outcome};

/// Boxes per side.
pub const SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dots {
    horizontal: [[Option<Seat>; SIZE]; SIZE + 1],
    vertical: [[Option<Seat>; SIZE + 1]; SIZE],
    boxes: [[Option<Seat>; SIZE]; SIZE],
    scores: [u32; 2],
    turn: Seat,
    active: bool,
}

impl Dots {
    fn token(seat: Seat) -> &'static str {
        Self::KIND.token(seat)
    }

    fn line_slot(
        &mut self,
        orientation: LineOrientation,
        row: usize,
        col: usize,
    ) -> Option<&mut Option<Seat>> {
        match orientation {
            LineOrientation::Horizontal => self.horizontal.get_mut(row)?.get_mut(col),
            LineOrientation::Vertical => self.vertical.get_mut(row)?.get_mut(col),
        }
    }

    /// Boxes that have the given line as one of their sides.
    fn adjacent_boxes(orientation: LineOrientation, row: usize, col: usize) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(2);
        match orientation {
            LineOrientation::Horizontal => {
                if row > 0 {
                    out.push((row - 1, col));
                }
                if row < SIZE {
                    out.push((row, col));
                }
            }
            LineOrientation::Vertical => {
                if col > 0 {
                    out.push((row, col - 1));
                }
                if col < SIZE {
                    out.push((row, col));
                }
            }
        }
        out
    }

    fn box_closed(&self, row: usize, col: usize) -> bool {
        self.horizontal[row][col].is_some()
            && self.horizontal[row + 1][col].is_some()
            && self.vertical[row][col].is_some()
            && self.vertical[row][col + 1].is_some()
    }

    fn all_boxes_taken(&self) -> bool {
        self.boxes.iter().flatten().all(Option::is_some)
    }

    fn score_map(&self) -> BTreeMap<&'static str, u32> {
        [Seat::First, Seat::Second]
            .into_iter()
            .map(|seat| (Self::token(seat), self.scores[seat.index()]))
            .collect()
    }

    fn winner_label(&self) -> &'static str {
        match self.check_terminal() {
            Outcome::Win(seat) => Self::token(seat),
            Outcome::Draw => "draw",
            _ => "",
        }
    }
}

impl GameRules for Dots {
    const KIND: GameKind = GameKind::Dots;

    fn initial<R: Rng>(_rng: &mut R) -> Self {
        Self {
            horizontal: [[None; SIZE]; SIZE + 1],
            vertical: [[None; SIZE + 1]; SIZE],
            boxes: [[None; SIZE]; SIZE],
            scores: [0; 2],
            turn: Seat::First,
            active: true,
        }
    }

    fn apply_move(&mut self, actor: Actor<'_>, mv: &GameMove) -> Option<MoveResult> {
        let GameMove::DrawLine { orientation, row, col } = *mv else {
            return None;
        };
        if actor.seat != self.turn {
            return None;
        }
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        let slot = self.line_slot(orientation, row, col)?;
        if slot.is_some() {
            return None;
        }
        *slot = Some(actor.seat);

        let mut captured = Vec::new();
        for (r, c) in Self::adjacent_boxes(orientation, row, col) {
            if self.boxes[r][c].is_none() && self.box_closed(r, c) {
                self.boxes[r][c] = Some(actor.seat);
                self.scores[actor.seat.index()] += 1;
                captured.push([r, c]);
            }
        }
        if captured.is_empty() {
            self.turn = self.turn.other();
        }

        Some(MoveResult::Line(LineResult {
            orientation,
            row,
            col,
            player: Self::token(actor.seat),
            username: actor.username.to_string(),
            captured,
            scores: self.score_map(),
            current_turn: Self::token(self.turn),
            game_active: !self.all_boxes_taken(),
            winner: self.winner_label(),
        }))
    }

    fn check_terminal(&self) -> Outcome {
        if !self.all_boxes_taken() {
            return Outcome::InProgress;
        }
        let [first, second] = self.scores;
        match first.cmp(&second) {
            std::cmp::Ordering::Greater => Outcome::Win(Seat::First),
            std::cmp::Ordering::Less => Outcome::Win(Seat::Second),
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    fn finish(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn snapshot(&self) -> GameSnapshot {
        let mut lines = Vec::new();
        for (row, cells) in self.horizontal.iter().enumerate() {
            for (col, owner) in cells.iter().enumerate() {
                if let Some(seat) = owner {
                    lines.push(DrawnLine {
                        orientation: LineOrientation::Horizontal,
                        row,
                        col,
                        player: Self::token(*seat),
                    });
                }
            }
        }
        for (row, cells) in self.vertical.iter().enumerate() {
            for (col, owner) in cells.iter().enumerate() {
                if let Some(seat) = owner {
                    lines.push(DrawnLine {
                        orientation: LineOrientation::Vertical,
                        row,
                        col,
                        player: Self::token(*seat),
                    });
                }
            }
        }
        GameSnapshot::Dots {
            lines,
            boxes: self
                .boxes
                .iter()
                .map(|row| row.iter().map(|cell| cell.map_or("", Self::token)).collect())
                .collect(),
            scores: self.score_map(),
            current_turn: Self::token(self.turn),
            game_active: self.active,
        }
    }
}
