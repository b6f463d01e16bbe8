//! A single room: its seats, its game and its fan-out.
//!
//! All mutable room state lives in [`RoomInner`] behind the room's own
//! `Mutex`. The registry hands out `Arc<Room>` and every operation locks
//! the room for its whole read-modify-broadcast step, so moves and
//! membership changes in one room are serialized and every member sees
//! events in the same order.
//!
//! Broadcasting never awaits: each member has an unbounded outbound queue
//! drained by its connection's writer task. Enqueueing under the lock keeps
//! the order; the network I/O happens elsewhere.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parlor_game::GameState;
use parlor_protocol::{
    GameKind, LobbyPlayer, LobbyUpdate, Recipient, Seat, ServerEvent, StartGame,
};
use parlor_transport::ConnectionId;
use tokio::sync::{Mutex, MutexGuard, mpsc};
use tokio::time::Instant;

use crate::{RoomCode, RoomPhase};

/// Channel for delivering outbound events to one connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Counter for player identity keys.
static NEXT_PLAYER_KEY: AtomicU64 = AtomicU64::new(1);

/// Identity of a seated player, stable across reconnection.
///
/// A reconnecting player gets a new [`ConnectionId`] but keeps their key.
/// Grace timers remember the key they were started for, so a timer that
/// fires after the seat was rebound (or vacated and refilled) can tell it
/// is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerKey(u64);

impl PlayerKey {
    pub(crate) fn next() -> Self {
        Self(NEXT_PLAYER_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// A seated player.
#[derive(Debug)]
pub(crate) struct Player {
    pub(crate) key: PlayerKey,
    pub(crate) username: String,
    pub(crate) seat: Seat,
    pub(crate) conn: ConnectionId,
    pub(crate) sender: EventSender,
}

impl Player {
    pub(crate) fn new(
        username: String,
        seat: Seat,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Self {
        Self {
            key: PlayerKey::next(),
            username,
            seat,
            conn,
            sender,
        }
    }
}

/// The lock-protected part of a room.
#[derive(Debug)]
pub(crate) struct RoomInner {
    pub(crate) phase: RoomPhase,
    /// At most two entries, keyed by the connection each seat is bound to.
    pub(crate) players: HashMap<ConnectionId, Player>,
    pub(crate) host: Option<ConnectionId>,
    pub(crate) game: GameState,
}

impl RoomInner {
    /// The connection bound to the seat held by `username`, if any.
    pub(crate) fn find_by_name(&self, username: &str) -> Option<ConnectionId> {
        self.players
            .values()
            .find(|p| p.username == username)
            .map(|p| p.conn)
    }

    /// The lowest seat nobody holds.
    pub(crate) fn free_seat(&self) -> Option<Seat> {
        [Seat::First, Seat::Second]
            .into_iter()
            .find(|seat| self.players.values().all(|p| p.seat != *seat))
    }

    pub(crate) fn is_host(&self, conn: ConnectionId) -> bool {
        self.host == Some(conn)
    }

    /// The member holding `seat`.
    pub(crate) fn by_seat(&self, seat: Seat) -> Option<&Player> {
        self.players.values().find(|p| p.seat == seat)
    }

    /// Members ordered by seat.
    fn ordered(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|p| p.seat);
        players
    }

    /// Delivers one event to the members `recipient` selects.
    pub(crate) fn dispatch(&self, recipient: Recipient, event: ServerEvent) {
        match recipient {
            Recipient::All => {
                for player in self.players.values() {
                    deliver(player, event.clone());
                }
            }
            Recipient::Connection(conn) => self.send_to(conn, event),
            Recipient::AllExcept(excluded) => {
                for player in self.players.values().filter(|p| p.conn != excluded) {
                    deliver(player, event.clone());
                }
            }
        }
    }

    /// Delivers one event to a single member. Silently skipped if `conn`
    /// is not seated.
    pub(crate) fn send_to(&self, conn: ConnectionId, event: ServerEvent) {
        if let Some(player) = self.players.get(&conn) {
            deliver(player, event);
        }
    }
}

/// Enqueues onto a member's outbound queue. A closed queue means that
/// connection is already going away; its own handler deals with it.
fn deliver(player: &Player, event: ServerEvent) {
    if player.sender.send(event).is_err() {
        tracing::debug!(
            conn_id = %player.conn,
            username = %player.username,
            "outbound queue closed, dropping event"
        );
    }
}

/// One room.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    kind: GameKind,
    created_at: Instant,
    inner: Mutex<RoomInner>,
}

impl Room {
    /// Builds a room with its creator seated as host.
    pub(crate) fn new(code: RoomCode, game: GameState, creator: Player) -> Self {
        let host = creator.conn;
        let mut players = HashMap::with_capacity(2);
        players.insert(host, creator);
        Self {
            code,
            kind: game.kind(),
            created_at: Instant::now(),
            inner: Mutex::new(RoomInner {
                phase: RoomPhase::Waiting,
                players,
                host: Some(host),
                game,
            }),
        }
    }

    /// The code players join with.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Which game this room plays. Fixed at creation.
    pub fn kind(&self) -> GameKind {
        self.kind
    }

    /// When the room was registered; the sweep measures age from here.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, RoomInner> {
        self.inner.lock().await
    }

    pub(crate) fn try_lock(&self) -> Option<MutexGuard<'_, RoomInner>> {
        self.inner.try_lock().ok()
    }

    /// Current lifecycle phase.
    pub async fn phase(&self) -> RoomPhase {
        self.inner.lock().await.phase
    }

    /// Seated players in seat order, as the lobby shows them.
    pub async fn players(&self) -> Vec<LobbyPlayer> {
        let inner = self.inner.lock().await;
        self.lobby_players(&inner)
    }

    /// Whether the game is still accepting moves.
    pub async fn game_active(&self) -> bool {
        self.inner.lock().await.game.is_active()
    }

    fn lobby_players(&self, inner: &RoomInner) -> Vec<LobbyPlayer> {
        inner
            .ordered()
            .into_iter()
            .map(|p| LobbyPlayer {
                username: p.username.clone(),
                role: self.kind.token(p.seat),
                is_host: inner.is_host(p.conn),
            })
            .collect()
    }

    /// Sends every member their own copy of the lobby.
    pub(crate) fn broadcast_lobby(&self, inner: &RoomInner) {
        let players = self.lobby_players(inner);
        for player in inner.players.values() {
            deliver(
                player,
                ServerEvent::LobbyUpdate(LobbyUpdate {
                    code: self.code.to_string(),
                    players: players.clone(),
                    game_type: self.kind,
                    is_host: inner.is_host(player.conn),
                    username: player.username.clone(),
                }),
            );
        }
    }

    /// Tells every member the game is on.
    pub(crate) fn broadcast_start(&self, inner: &RoomInner) {
        for player in inner.players.values() {
            deliver(
                player,
                ServerEvent::StartGame(StartGame {
                    code: self.code.to_string(),
                    game_type: self.kind,
                    is_host: inner.is_host(player.conn),
                    username: player.username.clone(),
                }),
            );
        }
    }
}
