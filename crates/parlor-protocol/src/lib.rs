//! Wire protocol for Parlor.
//!
//! This crate defines the "language" that browser clients and the server
//! speak:
//!
//! - **Envelope** ([`Envelope`], [`OutboundFrame`]): the JSON wrapper
//!   every message travels in.
//! - **Commands** ([`Command`], [`GameMove`]): validated client requests.
//! - **Events** ([`ServerEvent`], [`Recipient`]): what the server sends
//!   back, and to whom.
//! - **Game vocabulary** ([`GameKind`], [`Seat`], [`MoveResult`],
//!   [`GameSnapshot`]): shared between the game state machines and rooms.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, bytes out.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope → Command) → Room / Game
//! Room / Game → Protocol (ServerEvent → OutboundFrame) → Transport (bytes)
//! ```

mod codec;
mod command;
mod envelope;
mod error;
mod event;
mod game;

pub use codec::{Codec, JsonCodec};
pub use command::{Command, GameMove, MAX_CHAT_LEN};
pub use envelope::{Envelope, OutboundFrame};
pub use error::ProtocolError;
pub use event::{
    ChatMessage, GameEnd, LobbyPlayer, LobbyUpdate, PlayerLeft, Recipient,
    RoomAssignment, ServerEvent, StartGame,
};
pub use game::{
    ChoiceMade, DrawnLine, DropResult, GameKind, GameSnapshot, GuessHint, Hand,
    LetterGuessResult, LineOrientation, LineResult, MoveResult,
    NumberGuessResult, PlaceResult, RoundResult, Seat,
};
