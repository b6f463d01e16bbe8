//! Error types for the room layer.
//!
//! The `Display` text of each variant is exactly what the client sees in an
//! `error` event, so callers forward `err.to_string()` unchanged.

use crate::RoomCode;

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// A join named a code that is not (or no longer) registered.
    #[error("Room {0} not found. The room may have been closed or expired.")]
    NotFound(String),

    /// Any other lookup of a missing or closed room.
    #[error("Room not found")]
    Gone,

    /// Both seats are taken by other players.
    #[error("Room is full")]
    RoomFull,

    /// A host-only action was attempted by the guest.
    #[error("Only the host can restart the game")]
    NotHost,

    /// The connection is not seated in the room it addressed.
    #[error("You are not in this room")]
    NotInRoom,

    /// The connection already holds a seat in a live room.
    #[error("Already in room {0}")]
    AlreadyInRoom(RoomCode),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_error_display_matches_client_text() {
        assert_eq!(
            RoomError::NotFound("ABC234".into()).to_string(),
            "Room ABC234 not found. The room may have been closed or expired."
        );
        assert_eq!(RoomError::Gone.to_string(), "Room not found");
        assert_eq!(RoomError::RoomFull.to_string(), "Room is full");
        assert_eq!(
            RoomError::NotHost.to_string(),
            "Only the host can restart the game"
        );
        assert_eq!(RoomError::NotInRoom.to_string(), "You are not in this room");
    }
}
