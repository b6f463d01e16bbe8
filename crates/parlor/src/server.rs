//! `ParlorServer` builder and server loop.
//!
//! This is the entry point for running a Parlor server. It ties together
//! all the layers: transport → protocol → room → game.

use std::net::SocketAddr;
use std::sync::Arc;

use parlor_protocol::{Codec, JsonCodec};
use parlor_room::{RoomConfig, RoomRegistry};
use parlor_transport::{PendingConnection, Transport, WebSocketTransport};

use crate::handler::{AbortOnDrop, handle_connection};
use crate::{ConnectionConfig, ParlorError};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The room
/// registry does its own locking.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Arc<RoomRegistry>,
    pub(crate) codec: C,
    pub(crate) config: ConnectionConfig,
}

/// Builder for configuring and starting a Parlor server.
///
/// # Example
///
/// ```rust,no_run
/// use parlor::prelude::*;
///
/// # async fn run() -> Result<(), ParlorError> {
/// let server = ParlorServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ParlorServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    connection_config: ConnectionConfig,
}

impl ParlorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            connection_config: ConnectionConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets grace, sweep and capacity settings for rooms.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets ping, idle and handshake timing for connections.
    pub fn connection_config(mut self, config: ConnectionConfig) -> Self {
        self.connection_config = config;
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`, which is what browser
    /// clients speak.
    pub async fn build(self) -> Result<ParlorServer<JsonCodec>, ParlorError> {
        let transport = WebSocketTransport::bind(&self.bind_addr)
            .await?
            .with_handshake_timeout(self.connection_config.handshake_timeout);

        let state = Arc::new(ServerState {
            rooms: Arc::new(RoomRegistry::new(self.room_config)),
            codec: JsonCodec,
            config: self.connection_config,
        });

        Ok(ParlorServer { transport, state })
    }
}

impl Default for ParlorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Parlor server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ParlorServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl ParlorServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> ParlorServerBuilder {
        ParlorServerBuilder::new()
    }
}

impl<C: Codec> ParlorServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ParlorError> {
        Ok(self.transport.local_addr()?)
    }

    /// The room registry this server routes players into.
    pub fn rooms(&self) -> Arc<RoomRegistry> {
        Arc::clone(&self.state.rooms)
    }

    /// Runs the server accept loop.
    ///
    /// Starts the abandoned-room sweeper, then accepts incoming
    /// connections and spawns a handler task for each. Runs until the
    /// process is terminated or the future is dropped, which also stops
    /// the sweeper.
    pub async fn run(mut self) -> Result<(), ParlorError> {
        let _sweeper = AbortOnDrop(self.state.rooms.spawn_sweeper());
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Parlor server running");

        loop {
            match self.transport.accept().await {
                Ok(pending) => {
                    let state = Arc::clone(&self.state);
                    // The upgrade runs on the connection's own task so a
                    // peer that never sends it only ties up itself.
                    tokio::spawn(async move {
                        let conn_id = pending.id();
                        let conn = match pending.establish().await {
                            Ok(conn) => conn,
                            Err(e) => {
                                tracing::debug!(%conn_id, error = %e, "handshake failed");
                                return;
                            }
                        };
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
