//! Rock-paper-scissors, best played forever.
//!
//! Both players choose at the same time, so there is no turn. A round
//! resolves as soon as the second hand is in, and the next round starts
//! right away. The game never ends on its own.

use parlor_protocol::{
    ChoiceMade, GameKind, GameMove, GameSnapshot, Hand, MoveResult, RoundResult, Seat,
};
use rand::Rng;

use crate::{Actor, GameRules, Outcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RockPaperScissors {
    /// Hands locked in this round, indexed by [`Seat::index`].
    choices: [Option<Hand>; 2],
    round: u32,
}

impl GameRules for RockPaperScissors {
    const KIND: GameKind = GameKind::Rps;

    fn initial<R: Rng>(_rng: &mut R) -> Self {
        Self {
            choices: [None; 2],
            round: 1,
        }
    }

    fn apply_move(&mut self, actor: Actor<'_>, mv: &GameMove) -> Option<MoveResult> {
        let GameMove::Throw { hand } = *mv else {
            return None;
        };
        let slot = &mut self.choices[actor.seat.index()];
        if slot.is_some() {
            return None;
        }
        *slot = Some(hand);

        let [Some(p1), Some(p2)] = self.choices else {
            return Some(MoveResult::ChoiceMade(ChoiceMade {
                player: Self::KIND.token(actor.seat),
                username: actor.username.to_string(),
            }));
        };

        let winner = if p1 == p2 {
            "draw"
        } else if p1.beats(p2) {
            Self::KIND.token(Seat::First)
        } else {
            Self::KIND.token(Seat::Second)
        };
        let result = RoundResult {
            p1,
            p2,
            winner,
            round: self.round,
        };
        self.choices = [None; 2];
        self.round += 1;
        Some(MoveResult::Round(result))
    }

    fn check_terminal(&self) -> Outcome {
        Outcome::InProgress
    }

    fn finish(&mut self) {}

    fn is_active(&self) -> bool {
        true
    }

    fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::Rps {
            chosen: [Seat::First, Seat::Second]
                .into_iter()
                .filter(|seat| self.choices[seat.index()].is_some())
                .map(|seat| Self::KIND.token(seat))
                .collect(),
            round: self.round,
        }
    }
}
