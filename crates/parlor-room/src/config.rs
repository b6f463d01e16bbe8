//! Room configuration and lifecycle phase.

use std::time::Duration;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Timing and capacity knobs shared by every room in a registry.
///
/// The defaults are the production values; tests shrink them or run under
/// a paused clock instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    /// How long a disconnected player's seat is held before it is vacated.
    pub reconnect_grace: Duration,

    /// How often the sweeper looks for abandoned rooms.
    pub sweep_interval: Duration,

    /// Minimum age before an empty room is swept.
    pub empty_room_ttl: Duration,

    /// Seats per room.
    pub max_players: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            reconnect_grace: Duration::from_secs(10),
            sweep_interval: Duration::from_secs(60),
            empty_room_ttl: Duration::from_secs(5 * 60),
            max_players: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// ```text
/// Waiting ⇄ Playing → Closed
/// ```
///
/// - **Waiting**: fewer than two seats are filled.
/// - **Playing**: both seats are filled. A player dropping out does not
///   move the room back; only a vacated seat does.
/// - **Closed**: the room has been torn down. It is never mutated again and
///   anyone still holding a reference treats it as not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Waiting,
    Playing,
    Closed,
}

impl RoomPhase {
    /// Returns `true` once the room has been torn down.
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Playing => write!(f, "Playing"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}
