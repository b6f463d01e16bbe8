//! Per-connection handler: liveness, idle deadline, and the read loop.
//!
//! Each accepted connection gets three tasks:
//!
//! ```text
//! reader (this handler)  recv → decode → dispatch, idle deadline
//! writer                 outbound queue → encode → send, write deadline
//! prober                 ping every `ping_interval`, write deadline
//! ```
//!
//! Rooms never touch the socket. They push events onto the connection's
//! unbounded queue and the writer drains it, so a slow client only ever
//! stalls its own writer. A write or ping that misses its deadline wakes
//! the reader through a shared [`Notify`], so a peer that stops reading is
//! torn down even while it keeps sending. When the reader exits for any
//! reason, the writer and prober are aborted and the player's room is told
//! about the disconnect exactly once.

use std::sync::Arc;

use parlor_protocol::{Codec, Envelope, ServerEvent};
use parlor_room::{EventSender, RoomCode, RoomError};
use parlor_transport::{Connection, ConnectionId, Frame, WebSocketConnection};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;

use crate::ParlorError;
use crate::config::ConnectionConfig;
use crate::dispatch::dispatch;
use crate::server::ServerState;

/// Aborts a background task when dropped.
pub(crate) struct AbortOnDrop(pub(crate) JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// What the server knows about one connection.
///
/// Also the drop guard that reports the disconnect: when the handler
/// exits, cleanly or by panic, the room this connection was seated in is
/// notified. Since `Drop` is synchronous, we spawn a fire-and-forget task
/// for the async part.
pub(crate) struct Session<C: Codec> {
    pub(crate) conn_id: ConnectionId,
    /// The room this connection created or joined most recently.
    pub(crate) room: Option<RoomCode>,
    pub(crate) sender: EventSender,
    pub(crate) state: Arc<ServerState<C>>,
}

impl<C: Codec> Session<C> {
    /// Queues an event for this connection only.
    pub(crate) fn send(&self, event: ServerEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!(conn_id = %self.conn_id, "writer gone, dropping event");
        }
    }

    /// Queues an `error` event carrying the room error's client text.
    pub(crate) fn send_error(&self, err: &RoomError) {
        self.send(ServerEvent::Error(err.to_string()));
    }
}

impl<C: Codec> Drop for Session<C> {
    fn drop(&mut self) {
        let Some(code) = self.room.take() else {
            return;
        };
        let conn_id = self.conn_id;
        let rooms = Arc::clone(&self.state.rooms);
        tokio::spawn(async move {
            rooms.disconnect(code.as_str(), conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ParlorError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let config = state.config.clone();
    tracing::debug!(%conn_id, "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    let dead = Arc::new(Notify::new());
    let writer = AbortOnDrop(tokio::spawn(write_loop(
        Arc::clone(&conn),
        rx,
        Arc::clone(&state),
        Arc::clone(&dead),
    )));
    let prober = AbortOnDrop(tokio::spawn(probe_loop(
        Arc::clone(&conn),
        config.clone(),
        Arc::clone(&dead),
    )));

    let mut session = Session {
        conn_id,
        room: None,
        sender: tx,
        state: Arc::clone(&state),
    };

    loop {
        let received = tokio::select! {
            _ = dead.notified() => {
                tracing::info!(%conn_id, "liveness check failed");
                break;
            }
            received = tokio::time::timeout(config.idle_timeout, conn.recv()) => received,
        };
        let frame = match received {
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%conn_id, idle = ?config.idle_timeout, "connection timed out");
                break;
            }
        };

        let data = match frame {
            Frame::Data(data) => data,
            // Liveness only; the deadline is pushed forward by looping.
            Frame::Heartbeat => continue,
        };

        let envelope: Envelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "failed to decode envelope");
                continue;
            }
        };

        dispatch(&state, &mut session, &envelope).await;
    }

    // Hand off to the room first, then free the sink from any write
    // still parked on it so the close frame can go out.
    drop(session);
    drop(prober);
    drop(writer);
    let _ = tokio::time::timeout(config.ping_timeout, conn.close()).await;
    Ok(())
}

/// Drains the outbound queue onto the socket. A failed or overdue write
/// marks the connection dead.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
    state: Arc<ServerState<C>>,
    dead: Arc<Notify>,
) {
    let conn_id = conn.id();
    let deadline = state.config.ping_timeout;
    while let Some(event) = rx.recv().await {
        let bytes = match state.codec.encode_event(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, kind = event.kind(), error = %e, "failed to encode event");
                continue;
            }
        };
        match tokio::time::timeout(deadline, conn.send(&bytes)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
                break;
            }
            Err(_) => {
                tracing::debug!(%conn_id, ?deadline, "send timed out, stopping writer");
                break;
            }
        }
    }
    dead.notify_one();
}

/// Pings the client on a fixed schedule. A ping that fails or cannot be
/// written in time marks the connection dead.
async fn probe_loop(conn: Arc<WebSocketConnection>, config: ConnectionConfig, dead: Arc<Notify>) {
    let conn_id = conn.id();
    let mut ticker = tokio::time::interval(config.ping_interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match tokio::time::timeout(config.ping_timeout, conn.ping()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "ping failed");
                break;
            }
            Err(_) => {
                tracing::debug!(%conn_id, "ping write timed out");
                break;
            }
        }
    }

    dead.notify_one();
}
