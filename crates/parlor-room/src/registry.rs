//! The room registry: creates rooms, routes players to them, and tears
//! them down.
//!
//! # Locking
//!
//! ```text
//! registry map lock ──► released ──► room lock
//! ```
//!
//! The map lock only guards the `code → Room` map. Every operation looks
//! the room up, clones the `Arc`, drops the map lock and only then locks
//! the room. No path waits for the map lock while holding a room lock. The
//! sweeper is the one place that touches rooms while holding the map lock,
//! and it only ever uses `try_lock`, so the two locks can never form a
//! cycle.
//!
//! A room is unregistered in two steps: first it is marked
//! [`RoomPhase::Closed`] under its own lock, then it is removed from the
//! map if the map still points at that same instance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parlor_game::{Actor, GameState, Outcome};
use parlor_protocol::{
    ChatMessage, GameEnd, GameKind, GameMove, PlayerLeft, Recipient, RoomAssignment, Seat,
    ServerEvent,
};
use parlor_transport::ConnectionId;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::room::{EventSender, Player, PlayerKey, RoomInner};
use crate::{Room, RoomCode, RoomConfig, RoomError, RoomPhase};

/// How a successful join landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A new seat was filled.
    Seated,
    /// An existing seat with the same display name was rebound to the
    /// joining connection.
    Reconnected,
}

/// All live rooms, keyed by code.
///
/// Constructed once at startup and shared as `Arc<RoomRegistry>` between
/// every connection handler, the grace timers and the sweeper.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomCode, Arc<Room>>>,
    config: RoomConfig,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// The timing and capacity settings rooms were created with.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Looks up a live room.
    pub async fn get(&self, code: &str) -> Option<Arc<Room>> {
        self.rooms.lock().await.get(code).cloned()
    }

    /// Number of registered rooms.
    pub async fn len(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Whether no rooms are registered.
    pub async fn is_empty(&self) -> bool {
        self.rooms.lock().await.is_empty()
    }

    /// Whether `conn` currently holds a seat in the live room `code`.
    pub async fn is_seated(&self, code: &str, conn: ConnectionId) -> bool {
        let Some(room) = self.get(code).await else {
            return false;
        };
        let inner = room.lock().await;
        !inner.phase.is_closed() && inner.players.contains_key(&conn)
    }

    // -----------------------------------------------------------------------
    // Create / join
    // -----------------------------------------------------------------------

    /// Opens a new room with the caller seated as host.
    ///
    /// Replies `roomCreated` to the creator, then a lobby snapshot.
    pub async fn create(
        &self,
        kind: GameKind,
        username: String,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Arc<Room> {
        let game = GameState::new(kind, &mut rand::rng());
        let creator = Player::new(username.clone(), Seat::First, conn, sender);
        let role = kind.token(creator.seat);

        let room = {
            let mut rooms = self.rooms.lock().await;
            let code = loop {
                let candidate = RoomCode::generate(&mut rand::rng());
                if !rooms.contains_key(candidate.as_str()) {
                    break candidate;
                }
            };
            let room = Arc::new(Room::new(code.clone(), game, creator));
            rooms.insert(code, Arc::clone(&room));
            room
        };

        tracing::info!(code = %room.code(), %conn, %kind, username = %username, "room created");

        let inner = room.lock().await;
        inner.send_to(
            conn,
            ServerEvent::RoomCreated(RoomAssignment {
                code: room.code().to_string(),
                role,
                game_type: kind,
                is_host: true,
                username,
            }),
        );
        room.broadcast_lobby(&inner);
        drop(inner);
        room
    }

    /// Seats `username` in room `code`, or rebinds their seat if a player
    /// with that display name is already in it. Returns the room so the
    /// caller can remember where the connection is seated.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if no live room has that code.
    /// - [`RoomError::RoomFull`] if both seats belong to other names.
    pub async fn join(
        &self,
        code: &str,
        username: String,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Result<(Arc<Room>, JoinOutcome), RoomError> {
        let room = self
            .get(code)
            .await
            .ok_or_else(|| RoomError::NotFound(code.to_string()))?;
        let mut inner = room.lock().await;
        if inner.phase.is_closed() {
            return Err(RoomError::NotFound(code.to_string()));
        }

        if let Some(old_conn) = inner.find_by_name(&username) {
            Self::rebind(&room, &mut inner, old_conn, conn, sender);
            return Ok((Arc::clone(&room), JoinOutcome::Reconnected));
        }

        let seat = match inner.free_seat() {
            Some(seat) if inner.players.len() < self.config.max_players => seat,
            _ => {
                tracing::debug!(%code, %conn, username = %username, "join rejected, room full");
                return Err(RoomError::RoomFull);
            }
        };

        inner
            .players
            .insert(conn, Player::new(username.clone(), seat, conn, sender));
        if inner.host.is_none() {
            inner.host = Some(conn);
        }
        tracing::info!(
            %code,
            %conn,
            username = %username,
            players = inner.players.len(),
            "player joined"
        );

        let assignment = RoomAssignment {
            code: room.code().to_string(),
            role: room.kind().token(seat),
            game_type: room.kind(),
            is_host: inner.is_host(conn),
            username,
        };
        inner.send_to(conn, ServerEvent::RoomJoined(assignment));
        inner.send_to(conn, ServerEvent::GameState(inner.game.snapshot()));
        room.broadcast_lobby(&inner);

        if inner.players.len() == self.config.max_players {
            inner.phase = RoomPhase::Playing;
            room.broadcast_start(&inner);
        }
        drop(inner);
        Ok((room, JoinOutcome::Seated))
    }

    /// Moves an existing seat from `old_conn` to `new_conn`. The player's
    /// identity key, seat and host status carry over; only the connection
    /// and its outbound queue change.
    fn rebind(
        room: &Room,
        inner: &mut RoomInner,
        old_conn: ConnectionId,
        new_conn: ConnectionId,
        sender: EventSender,
    ) {
        let Some(mut player) = inner.players.remove(&old_conn) else {
            return;
        };
        player.conn = new_conn;
        player.sender = sender;
        let seat = player.seat;
        let username = player.username.clone();
        inner.players.insert(new_conn, player);
        if inner.host == Some(old_conn) {
            inner.host = Some(new_conn);
        }
        tracing::info!(
            code = %room.code(),
            old_conn = %old_conn,
            conn = %new_conn,
            username = %username,
            "player reconnected"
        );

        let assignment = RoomAssignment {
            code: room.code().to_string(),
            role: room.kind().token(seat),
            game_type: room.kind(),
            is_host: inner.is_host(new_conn),
            username,
        };
        inner.send_to(new_conn, ServerEvent::RoomJoined(assignment));
        inner.send_to(new_conn, ServerEvent::GameState(inner.game.snapshot()));
        room.broadcast_lobby(inner);
    }

    // -----------------------------------------------------------------------
    // Departure
    // -----------------------------------------------------------------------

    /// Handles a dropped connection.
    ///
    /// Nothing is removed yet: the others are told `playerLeft` and a grace
    /// timer is started. If the player has not reconnected when it fires,
    /// their seat is vacated.
    pub async fn disconnect(self: &Arc<Self>, code: &str, conn: ConnectionId) {
        let Some(room) = self.get(code).await else {
            return;
        };
        let key = {
            let inner = room.lock().await;
            if inner.phase.is_closed() {
                return;
            }
            let Some(player) = inner.players.get(&conn) else {
                return;
            };
            tracing::info!(
                %code,
                %conn,
                username = %player.username,
                grace = ?self.config.reconnect_grace,
                "player disconnected, holding seat"
            );
            inner.dispatch(Recipient::AllExcept(conn), Self::left_notice(&room, &inner, conn));
            player.key
        };

        let registry = Arc::clone(self);
        let code = room.code().clone();
        let grace = self.config.reconnect_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            registry.expire(&code, conn, key).await;
        });
    }

    /// Grace expiry. A no-op if the room is gone or the seat bound to
    /// `conn` no longer belongs to the player the timer was started for.
    async fn expire(&self, code: &RoomCode, conn: ConnectionId, key: PlayerKey) {
        let Some(room) = self.get(code.as_str()).await else {
            return;
        };
        let closed = {
            let mut inner = room.lock().await;
            if inner.phase.is_closed() {
                return;
            }
            match inner.players.get(&conn) {
                Some(player) if player.key == key => {}
                _ => {
                    tracing::debug!(%code, %conn, "grace expired after reconnect, ignoring");
                    return;
                }
            }
            tracing::info!(%code, %conn, "grace expired, vacating seat");
            Self::vacate(&room, &mut inner, conn)
        };
        if closed {
            self.unregister(&room).await;
        }
    }

    /// Leaves a room immediately, without a grace period.
    ///
    /// # Errors
    /// - [`RoomError::Gone`] if the room is not live.
    /// - [`RoomError::NotInRoom`] if `conn` holds no seat in it.
    pub async fn leave(&self, code: &str, conn: ConnectionId) -> Result<(), RoomError> {
        let room = self.get(code).await.ok_or(RoomError::Gone)?;
        let closed = {
            let mut inner = room.lock().await;
            if inner.phase.is_closed() {
                return Err(RoomError::Gone);
            }
            if !inner.players.contains_key(&conn) {
                return Err(RoomError::NotInRoom);
            }
            inner.dispatch(Recipient::AllExcept(conn), Self::left_notice(&room, &inner, conn));
            tracing::info!(%code, %conn, "player left");
            Self::vacate(&room, &mut inner, conn)
        };
        if closed {
            self.unregister(&room).await;
        }
        Ok(())
    }

    fn left_notice(room: &Room, inner: &RoomInner, conn: ConnectionId) -> ServerEvent {
        let (player, username) = inner
            .players
            .get(&conn)
            .map(|p| (room.kind().token(p.seat), p.username.clone()))
            .unwrap_or_default();
        ServerEvent::PlayerLeft(PlayerLeft {
            player,
            username,
            is_host: inner.is_host(conn),
        })
    }

    /// Frees the seat bound to `conn`. Returns `true` if that closed the
    /// room: a departing host takes the room with them, and so does the
    /// last member.
    fn vacate(room: &Room, inner: &mut RoomInner, conn: ConnectionId) -> bool {
        let Some(player) = inner.players.remove(&conn) else {
            return false;
        };
        if inner.is_host(conn) {
            inner.host = None;
            inner.phase = RoomPhase::Closed;
            inner.dispatch(
                Recipient::All,
                ServerEvent::HostLeft {
                    host: player.username,
                },
            );
            tracing::info!(code = %room.code(), "host left, room closed");
            return true;
        }
        if inner.players.is_empty() {
            inner.phase = RoomPhase::Closed;
            tracing::info!(code = %room.code(), "last player left, room closed");
            return true;
        }
        inner.phase = RoomPhase::Waiting;
        room.broadcast_lobby(inner);
        false
    }

    /// Drops a closed room from the map, unless the code has already been
    /// taken over by a different room.
    async fn unregister(&self, room: &Arc<Room>) {
        let mut rooms = self.rooms.lock().await;
        if rooms
            .get(room.code().as_str())
            .is_some_and(|current| Arc::ptr_eq(current, room))
        {
            rooms.remove(room.code().as_str());
            tracing::info!(code = %room.code(), rooms = rooms.len(), "room destroyed");
        }
    }

    // -----------------------------------------------------------------------
    // In-room actions
    // -----------------------------------------------------------------------

    /// Applies a game move from the player bound to `conn`.
    ///
    /// Returns `Ok(false)` for a move the game rejected (out of turn,
    /// illegal, game over, or the opponent has not arrived yet); the state
    /// is untouched and nothing is sent.
    ///
    /// # Errors
    /// - [`RoomError::Gone`] if the room is not live.
    /// - [`RoomError::NotInRoom`] if `conn` holds no seat in it.
    pub async fn apply_move(
        &self,
        code: &str,
        conn: ConnectionId,
        mv: &GameMove,
    ) -> Result<bool, RoomError> {
        let room = self.get(code).await.ok_or(RoomError::Gone)?;
        let mut inner = room.lock().await;
        if inner.phase.is_closed() {
            return Err(RoomError::Gone);
        }
        let (seat, username) = inner
            .players
            .get(&conn)
            .map(|p| (p.seat, p.username.clone()))
            .ok_or(RoomError::NotInRoom)?;
        if inner.players.len() < self.config.max_players {
            tracing::debug!(%code, %conn, "move before both seats are filled, ignoring");
            return Ok(false);
        }

        let Some(applied) = inner.game.play(Actor::new(seat, &username), mv) else {
            tracing::debug!(%code, %conn, ?mv, "move rejected");
            return Ok(false);
        };
        inner.dispatch(Recipient::All, ServerEvent::Move(applied.result));

        if inner.game.announces_end() {
            let end = match applied.outcome {
                Outcome::Win(winner) => Some(GameEnd {
                    winner: room.kind().token(winner),
                    winner_username: inner.by_seat(winner).map(|p| p.username.clone()),
                }),
                Outcome::Draw => Some(GameEnd::draw()),
                _ => None,
            };
            if let Some(end) = end {
                tracing::info!(%code, winner = end.winner, "game over");
                inner.dispatch(Recipient::All, ServerEvent::GameEnd(end));
            }
        } else if applied.outcome.is_terminal() {
            tracing::info!(%code, outcome = ?applied.outcome, "game over");
        }
        Ok(true)
    }

    /// Starts the room's game over. Host only.
    ///
    /// # Errors
    /// - [`RoomError::Gone`] if the room is not live.
    /// - [`RoomError::NotHost`] if `conn` is not the host.
    pub async fn restart(&self, code: &str, conn: ConnectionId) -> Result<(), RoomError> {
        let room = self.get(code).await.ok_or(RoomError::Gone)?;
        let mut inner = room.lock().await;
        if inner.phase.is_closed() {
            return Err(RoomError::Gone);
        }
        if !inner.is_host(conn) {
            return Err(RoomError::NotHost);
        }
        inner.game.restart(&mut rand::rng());
        tracing::info!(%code, "game restarted");
        inner.dispatch(Recipient::All, ServerEvent::Restart);
        Ok(())
    }

    /// Sends the current game snapshot to the requester.
    ///
    /// # Errors
    /// - [`RoomError::Gone`] if the room is not live.
    /// - [`RoomError::NotInRoom`] if `conn` holds no seat in it.
    pub async fn game_state(&self, code: &str, conn: ConnectionId) -> Result<(), RoomError> {
        let room = self.get(code).await.ok_or(RoomError::Gone)?;
        let inner = room.lock().await;
        if inner.phase.is_closed() {
            return Err(RoomError::Gone);
        }
        if !inner.players.contains_key(&conn) {
            return Err(RoomError::NotInRoom);
        }
        inner.send_to(conn, ServerEvent::GameState(inner.game.snapshot()));
        Ok(())
    }

    /// Broadcasts a chat line from the player bound to `conn`.
    ///
    /// # Errors
    /// - [`RoomError::Gone`] if the room is not live.
    /// - [`RoomError::NotInRoom`] if `conn` holds no seat in it.
    pub async fn chat(
        &self,
        code: &str,
        conn: ConnectionId,
        message: String,
    ) -> Result<(), RoomError> {
        let room = self.get(code).await.ok_or(RoomError::Gone)?;
        let inner = room.lock().await;
        if inner.phase.is_closed() {
            return Err(RoomError::Gone);
        }
        let player = inner.players.get(&conn).ok_or(RoomError::NotInRoom)?;
        let event = ServerEvent::ChatMessage(ChatMessage {
            username: player.username.clone(),
            message,
            timestamp: unix_millis(),
            role: room.kind().token(player.seat),
        });
        inner.dispatch(Recipient::All, event);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Sweep
    // -----------------------------------------------------------------------

    /// Removes every empty room older than the retention window. Rooms
    /// whose lock is held right now are in use and skipped until the next
    /// pass. Returns how many rooms were removed.
    pub async fn sweep(&self) -> usize {
        let ttl = self.config.empty_room_ttl;
        let mut rooms = self.rooms.lock().await;
        let before = rooms.len();
        rooms.retain(|code, room| {
            if room.created_at().elapsed() <= ttl {
                return true;
            }
            let Some(mut inner) = room.try_lock() else {
                return true;
            };
            if !inner.players.is_empty() {
                return true;
            }
            inner.phase = RoomPhase::Closed;
            tracing::info!(%code, "swept abandoned room");
            false
        });
        before - rooms.len()
    }

    /// Runs [`sweep`](Self::sweep) every `sweep_interval` until the task is
    /// aborted.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        let period = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = registry.sweep().await;
                if removed > 0 {
                    tracing::debug!(removed, "sweep pass finished");
                }
            }
        })
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
