//! Room lifecycle management for Parlor.
//!
//! A room is a two-seat table identified by a six-symbol code. Rooms live
//! in a [`RoomRegistry`]; each has its own lock around its seats and game
//! so that rooms never contend with each other.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates rooms, seats and reseats players, runs the
//!   reconnection grace timers and the abandoned-room sweep
//! - [`Room`]: one room's code, variant and lock-protected state
//! - [`RoomCode`]: the shareable code
//! - [`RoomConfig`]: grace, sweep and capacity settings
//! - [`RoomPhase`]: `Waiting`, `Playing` or `Closed`
//! - [`EventSender`]: a member's outbound queue

mod code;
mod config;
mod error;
mod registry;
mod room;

pub use code::{ALPHABET, CODE_LEN, RoomCode};
pub use config::{RoomConfig, RoomPhase};
pub use error::RoomError;
pub use registry::{JoinOutcome, RoomRegistry};
pub use room::{EventSender, PlayerKey, Room};
