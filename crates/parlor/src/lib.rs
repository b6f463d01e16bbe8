//! # Parlor
//!
//! A two-player room server for small turn-based web games.
//!
//! Players connect over WebSocket, one of them creates a room and shares
//! its six-symbol code, the other joins with it, and the server referees
//! the game: it validates every move, broadcasts the result, and holds a
//! dropped player's seat for a short grace period so a page reload does
//! not end the match.
//!
//! Six games are built in: tic-tac-toe, connect-four, rock-paper-scissors,
//! guess-the-number, a cooperative word guess, and dots-and-boxes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! # async fn run() -> Result<(), ParlorError> {
//! parlor::telemetry::init();
//! let server = ParlorServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod dispatch;
mod error;
mod handler;
mod server;
pub mod telemetry;

pub use config::ConnectionConfig;
pub use error::ParlorError;
pub use server::{ParlorServer, ParlorServerBuilder};

/// Everything needed to run a server, plus the wire vocabulary for
/// writing clients and tests.
pub mod prelude {
    pub use crate::{ConnectionConfig, ParlorError, ParlorServer, ParlorServerBuilder};
    pub use parlor_game::{GameRules, GameState, Outcome};
    pub use parlor_protocol::{
        Codec, Command, Envelope, GameKind, GameMove, JsonCodec, MAX_CHAT_LEN, OutboundFrame,
        ProtocolError, ServerEvent,
    };
    pub use parlor_room::{RoomCode, RoomConfig, RoomError, RoomPhase, RoomRegistry};
    pub use parlor_transport::{ConnectionId, TransportError};
}
