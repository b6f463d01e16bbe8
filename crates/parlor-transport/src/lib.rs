//! Transport abstraction layer for Parlor.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the duplex channel a player talks to the server through. The rest of the
//! workspace only ever sees opaque byte payloads, liveness [`Frame`]s and a
//! [`ConnectionId`].
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{
    DEFAULT_HANDSHAKE_TIMEOUT, PendingWebSocket, WebSocketConnection, WebSocketTransport,
};

use std::fmt;

/// Opaque identifier for a connection.
///
/// Every accepted connection gets a fresh id, so a player who reconnects
/// shows up under a different `ConnectionId` than before. Rooms key their
/// membership by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One unit of inbound traffic.
///
/// Control traffic (ping/pong) carries no application data but still proves
/// the peer is alive, so it is surfaced as [`Frame::Heartbeat`] instead of
/// being swallowed. Callers use it to push their idle deadline forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// An application message (text or binary).
    Data(Vec<u8>),
    /// A liveness signal from the peer.
    Heartbeat,
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// A peer that is accepted but has not finished its handshake.
    type Pending: PendingConnection<Connection = Self::Connection, Error = Self::Error>;
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next peer.
    ///
    /// Only the raw accept happens here. The protocol handshake is left to
    /// [`PendingConnection::establish`], which callers run on their own
    /// task so a peer that never finishes it cannot hold up the listener.
    async fn accept(&mut self) -> Result<Self::Pending, Self::Error>;
}

/// An accepted peer that still has to complete the protocol handshake.
pub trait PendingConnection: Send + 'static {
    /// The connection produced once the handshake succeeds.
    type Connection: Connection;
    /// The error type for a failed handshake.
    type Error: std::error::Error + Send + Sync;

    /// The id the established connection will carry.
    fn id(&self) -> ConnectionId;

    /// Runs the handshake, bounded by the transport's handshake timeout.
    async fn establish(self) -> Result<Self::Connection, Self::Error>;
}

/// A single duplex connection that can send and receive bytes.
///
/// Sending and receiving must be usable concurrently from different tasks:
/// a connection's reader loop may be parked in [`recv`](Self::recv) while a
/// writer task calls [`send`](Self::send) and a prober calls
/// [`ping`](Self::ping).
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends data to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Frame>, Self::Error>;

    /// Sends a liveness probe to the remote peer.
    async fn ping(&self) -> Result<(), Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
