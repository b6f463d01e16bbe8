//! Integration tests for the room registry: seating, reconnection grace,
//! departures and in-room actions, driven through the public API with a
//! paused clock.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parlor_protocol::{GameKind, GameMove, Hand, ServerEvent};
use parlor_room::{JoinOutcome, Room, RoomError, RoomPhase, RoomRegistry};
use parlor_transport::ConnectionId;
use tokio::sync::mpsc::{self, UnboundedReceiver};

// =========================================================================
// Helpers
// =========================================================================

const GRACE: Duration = Duration::from_secs(10);

fn conn(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

/// Drains everything queued for one member, in order.
fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn kinds(events: &[ServerEvent]) -> Vec<&'static str> {
    events.iter().map(ServerEvent::kind).collect()
}

struct Member {
    conn: ConnectionId,
    rx: UnboundedReceiver<ServerEvent>,
}

impl Member {
    fn events(&mut self) -> Vec<ServerEvent> {
        drain(&mut self.rx)
    }
}

/// Creates a room hosted by `alice` on conn 1 and seats `bob` on conn 2.
async fn full_room(
    registry: &Arc<RoomRegistry>,
    kind: GameKind,
) -> (Arc<Room>, Member, Member) {
    let (tx, rx) = mpsc::unbounded_channel();
    let room = registry.create(kind, "alice".into(), conn(1), tx).await;
    let mut host = Member { conn: conn(1), rx };

    let (tx, rx) = mpsc::unbounded_channel();
    let (_, outcome) = registry
        .join(room.code().as_str(), "bob".into(), conn(2), tx)
        .await
        .expect("bob should be seated");
    assert_eq!(outcome, JoinOutcome::Seated);
    let mut guest = Member { conn: conn(2), rx };

    host.events();
    guest.events();
    (room, host, guest)
}

fn registry() -> Arc<RoomRegistry> {
    Arc::new(RoomRegistry::default())
}

// =========================================================================
// Create / join
// =========================================================================

#[tokio::test]
async fn test_create_replies_room_created_then_lobby() {
    let registry = registry();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let room = registry
        .create(GameKind::Connect4, "alice".into(), conn(1), tx)
        .await;

    let events = drain(&mut rx);
    assert_eq!(kinds(&events), ["roomCreated", "lobbyUpdate"]);
    let ServerEvent::RoomCreated(assignment) = &events[0] else {
        panic!("expected roomCreated");
    };
    assert_eq!(assignment.code, room.code().as_str());
    assert_eq!(assignment.role, "Red");
    assert!(assignment.is_host);
    assert_eq!(registry.len().await, 1);
    assert_eq!(room.phase().await, RoomPhase::Waiting);
}

#[tokio::test]
async fn test_create_codes_are_unique_among_live_rooms() {
    let registry = registry();
    let mut codes = HashSet::new();
    for id in 0..200 {
        let (tx, _rx) = mpsc::unbounded_channel();
        let room = registry
            .create(GameKind::TicTacToe, format!("p{id}"), conn(id), tx)
            .await;
        assert_eq!(room.code().as_str().len(), 6);
        codes.insert(room.code().clone());
    }
    assert_eq!(codes.len(), 200);
    assert_eq!(registry.len().await, 200);
}

#[tokio::test]
async fn test_join_unknown_code_returns_not_found_text() {
    let registry = registry();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let err = registry
        .join("ZZZZZZ", "bob".into(), conn(2), tx)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Room ZZZZZZ not found. The room may have been closed or expired."
    );
    assert!(drain(&mut rx).is_empty(), "nothing but the error is sent");
}

#[tokio::test]
async fn test_join_second_seat_starts_game_for_both() {
    let registry = registry();
    let (tx, host_rx) = mpsc::unbounded_channel();
    let room = registry
        .create(GameKind::TicTacToe, "alice".into(), conn(1), tx)
        .await;
    let mut host = Member { conn: conn(1), rx: host_rx };
    host.events();

    let (tx, mut guest_rx) = mpsc::unbounded_channel();
    registry
        .join(room.code().as_str(), "bob".into(), conn(2), tx)
        .await
        .unwrap();

    let guest_events = drain(&mut guest_rx);
    assert_eq!(
        kinds(&guest_events),
        ["roomJoined", "gameState", "lobbyUpdate", "startGame"]
    );
    let ServerEvent::RoomJoined(assignment) = &guest_events[0] else {
        panic!("expected roomJoined");
    };
    assert_eq!(assignment.role, "O");
    assert!(!assignment.is_host);

    assert_eq!(kinds(&host.events()), ["lobbyUpdate", "startGame"]);
    assert_eq!(room.phase().await, RoomPhase::Playing);
}

#[tokio::test]
async fn test_join_full_room_is_rejected() {
    let registry = registry();
    let (room, mut host, mut guest) = full_room(&registry, GameKind::Rps).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let err = registry
        .join(room.code().as_str(), "carol".into(), conn(3), tx)
        .await
        .unwrap_err();
    assert_eq!(err, RoomError::RoomFull);
    assert_eq!(err.to_string(), "Room is full");
    assert!(drain(&mut rx).is_empty());
    assert!(host.events().is_empty());
    assert!(guest.events().is_empty());
    assert_eq!(room.players().await.len(), 2);
}

// =========================================================================
// Reconnection
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_reconnect_within_grace_keeps_seat_and_host() {
    let registry = registry();
    let (room, host, mut guest) = full_room(&registry, GameKind::TicTacToe).await;
    let code = room.code().clone();

    // X plays, then drops.
    registry
        .apply_move(code.as_str(), host.conn, &GameMove::Place { index: 4 })
        .await
        .unwrap();
    registry.disconnect(code.as_str(), host.conn).await;
    drop(host);
    let left = guest.events();
    assert_eq!(kinds(&left), ["move", "playerLeft"]);
    let ServerEvent::PlayerLeft(notice) = &left[1] else {
        panic!("expected playerLeft");
    };
    assert_eq!(notice.username, "alice");
    assert!(notice.is_host);

    tokio::time::sleep(Duration::from_secs(5)).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (rejoined, outcome) = registry
        .join(code.as_str(), "alice".into(), conn(3), tx)
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&rejoined, &room));
    assert_eq!(outcome, JoinOutcome::Reconnected);

    let events = drain(&mut rx);
    assert_eq!(kinds(&events), ["roomJoined", "gameState", "lobbyUpdate"]);
    let ServerEvent::RoomJoined(assignment) = &events[0] else {
        panic!("expected roomJoined");
    };
    assert_eq!(assignment.role, "X");
    assert!(assignment.is_host);

    // The old timer fires and must find the seat rebound.
    tokio::time::sleep(GRACE).await;
    assert!(registry.get(code.as_str()).await.is_some());
    let players = room.players().await;
    assert_eq!(players.len(), 2);
    assert_eq!(players[0].username, "alice");
    assert!(players[0].is_host);

    // The restored seat keeps playing from where it was.
    assert!(!registry
        .apply_move(code.as_str(), conn(3), &GameMove::Place { index: 0 })
        .await
        .unwrap(), "still O's turn");
    assert!(registry
        .apply_move(code.as_str(), guest.conn, &GameMove::Place { index: 0 })
        .await
        .unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_never_adds_a_third_seat() {
    let registry = registry();
    let (room, _host, guest) = full_room(&registry, GameKind::Rps).await;

    registry.disconnect(room.code().as_str(), guest.conn).await;
    for id in 10..13 {
        let (tx, _rx) = mpsc::unbounded_channel();
        registry
            .join(room.code().as_str(), "bob".into(), conn(id), tx)
            .await
            .unwrap();
    }
    let players = room.players().await;
    assert_eq!(players.len(), 2);
    assert_eq!(
        players.iter().filter(|p| p.username == "bob").count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_host_grace_expiry_closes_room() {
    let registry = registry();
    let (room, host, mut guest) = full_room(&registry, GameKind::Connect4).await;

    registry.disconnect(room.code().as_str(), host.conn).await;
    tokio::time::sleep(GRACE + Duration::from_secs(1)).await;

    assert!(registry.get(room.code().as_str()).await.is_none());
    assert_eq!(room.phase().await, RoomPhase::Closed);
    let events = guest.events();
    assert_eq!(kinds(&events), ["playerLeft", "hostLeft"]);
    let frame = events[1].to_frame().unwrap();
    assert_eq!(frame.payload, "Host alice has left the game");

    let (tx, _rx) = mpsc::unbounded_channel();
    let err = registry
        .join(room.code().as_str(), "carol".into(), conn(5), tx)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::NotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn test_guest_grace_expiry_keeps_room_for_host() {
    let registry = registry();
    let (room, mut host, guest) = full_room(&registry, GameKind::Connect4).await;

    registry.disconnect(room.code().as_str(), guest.conn).await;
    tokio::time::sleep(GRACE + Duration::from_secs(1)).await;

    assert!(registry.get(room.code().as_str()).await.is_some());
    assert_eq!(room.phase().await, RoomPhase::Waiting);
    assert_eq!(room.players().await.len(), 1);
    assert_eq!(kinds(&host.events()), ["playerLeft", "lobbyUpdate"]);

    // The freed seat can be taken by someone new.
    let (tx, _rx) = mpsc::unbounded_channel();
    let (_, outcome) = registry
        .join(room.code().as_str(), "carol".into(), conn(7), tx)
        .await
        .unwrap();
    assert_eq!(outcome, JoinOutcome::Seated);
    assert_eq!(room.players().await[1].role, "Yellow");
}

#[tokio::test(start_paused = true)]
async fn test_lone_host_grace_expiry_removes_room() {
    let registry = registry();
    let (tx, _rx) = mpsc::unbounded_channel();
    let room = registry
        .create(GameKind::WordGuess, "alice".into(), conn(1), tx)
        .await;

    registry.disconnect(room.code().as_str(), conn(1)).await;
    assert!(registry.get(room.code().as_str()).await.is_some());
    tokio::time::sleep(GRACE + Duration::from_secs(1)).await;
    assert!(registry.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_unseated_connection_is_noop() {
    let registry = registry();
    let (room, mut host, mut guest) = full_room(&registry, GameKind::Rps).await;

    registry.disconnect(room.code().as_str(), conn(99)).await;
    registry.disconnect("NOPE22", host.conn).await;
    tokio::time::sleep(GRACE * 2).await;

    assert!(host.events().is_empty());
    assert!(guest.events().is_empty());
    assert_eq!(room.players().await.len(), 2);
}

// =========================================================================
// Leave
// =========================================================================

#[tokio::test]
async fn test_leave_guest_vacates_immediately() {
    let registry = registry();
    let (room, mut host, guest) = full_room(&registry, GameKind::GuessNumber).await;

    registry.leave(room.code().as_str(), guest.conn).await.unwrap();
    assert_eq!(room.players().await.len(), 1);
    assert_eq!(kinds(&host.events()), ["playerLeft", "lobbyUpdate"]);
    assert!(!registry.is_seated(room.code().as_str(), guest.conn).await);
}

#[tokio::test]
async fn test_leave_host_closes_room() {
    let registry = registry();
    let (room, host, mut guest) = full_room(&registry, GameKind::Dots).await;

    registry.leave(room.code().as_str(), host.conn).await.unwrap();
    assert!(registry.is_empty().await);
    assert_eq!(kinds(&guest.events()), ["playerLeft", "hostLeft"]);
    assert_eq!(
        registry.leave(room.code().as_str(), guest.conn).await,
        Err(RoomError::Gone)
    );
}

// =========================================================================
// Moves
// =========================================================================

#[tokio::test]
async fn test_apply_move_tictactoe_win_sends_one_move_and_one_game_end() {
    let registry = registry();
    let (room, mut host, mut guest) = full_room(&registry, GameKind::TicTacToe).await;
    let code = room.code().as_str();

    for (who, index) in [(host.conn, 0), (guest.conn, 3), (host.conn, 1), (guest.conn, 4)] {
        assert!(registry
            .apply_move(code, who, &GameMove::Place { index })
            .await
            .unwrap());
    }
    host.events();
    guest.events();

    assert!(registry
        .apply_move(code, host.conn, &GameMove::Place { index: 2 })
        .await
        .unwrap());
    let events = guest.events();
    assert_eq!(kinds(&events), ["move", "gameEnd"]);
    let ServerEvent::GameEnd(end) = &events[1] else {
        panic!("expected gameEnd");
    };
    assert_eq!(end.winner, "X");
    assert_eq!(end.winner_username.as_deref(), Some("alice"));
    assert_eq!(kinds(&host.events()), ["move", "gameEnd"]);

    // Finished until the host restarts.
    assert!(!registry
        .apply_move(code, guest.conn, &GameMove::Place { index: 5 })
        .await
        .unwrap());
    assert!(!room.game_active().await);
}

#[tokio::test]
async fn test_apply_move_out_of_turn_sends_nothing() {
    let registry = registry();
    let (room, mut host, mut guest) = full_room(&registry, GameKind::Connect4).await;

    let accepted = registry
        .apply_move(room.code().as_str(), guest.conn, &GameMove::Drop { column: 3 })
        .await
        .unwrap();
    assert!(!accepted);
    assert!(host.events().is_empty());
    assert!(guest.events().is_empty());
}

#[tokio::test]
async fn test_apply_move_waits_for_second_player() {
    let registry = registry();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let room = registry
        .create(GameKind::TicTacToe, "alice".into(), conn(1), tx)
        .await;
    drain(&mut rx);

    let accepted = registry
        .apply_move(room.code().as_str(), conn(1), &GameMove::Place { index: 0 })
        .await
        .unwrap();
    assert!(!accepted);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_apply_move_from_outsider_is_not_in_room() {
    let registry = registry();
    let (room, _host, _guest) = full_room(&registry, GameKind::TicTacToe).await;
    let err = registry
        .apply_move(room.code().as_str(), conn(42), &GameMove::Place { index: 0 })
        .await
        .unwrap_err();
    assert_eq!(err, RoomError::NotInRoom);
}

#[tokio::test]
async fn test_apply_move_rps_ends_round_without_game_end() {
    let registry = registry();
    let (room, mut host, mut guest) = full_room(&registry, GameKind::Rps).await;
    let code = room.code().as_str();

    registry
        .apply_move(code, host.conn, &GameMove::Throw { hand: Hand::Rock })
        .await
        .unwrap();
    registry
        .apply_move(code, guest.conn, &GameMove::Throw { hand: Hand::Scissors })
        .await
        .unwrap();

    assert_eq!(kinds(&host.events()), ["rpsChoiceMade", "rpsResult"]);
    assert_eq!(kinds(&guest.events()), ["rpsChoiceMade", "rpsResult"]);
}

// =========================================================================
// Restart / state / chat
// =========================================================================

#[tokio::test]
async fn test_restart_by_guest_is_refused() {
    let registry = registry();
    let (room, mut host, guest) = full_room(&registry, GameKind::TicTacToe).await;

    let err = registry
        .restart(room.code().as_str(), guest.conn)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Only the host can restart the game");
    assert!(host.events().is_empty());
}

#[tokio::test]
async fn test_restart_by_host_resets_finished_game() {
    let registry = registry();
    let (room, mut host, mut guest) = full_room(&registry, GameKind::TicTacToe).await;
    let code = room.code().as_str();
    for (who, index) in [
        (host.conn, 0),
        (guest.conn, 3),
        (host.conn, 1),
        (guest.conn, 4),
        (host.conn, 2),
    ] {
        registry
            .apply_move(code, who, &GameMove::Place { index })
            .await
            .unwrap();
    }
    assert!(!room.game_active().await);
    host.events();
    guest.events();

    registry.restart(code, host.conn).await.unwrap();
    assert_eq!(kinds(&host.events()), ["restart"]);
    assert_eq!(kinds(&guest.events()), ["restart"]);
    assert!(room.game_active().await);
    assert!(registry
        .apply_move(code, host.conn, &GameMove::Place { index: 8 })
        .await
        .unwrap());
}

#[tokio::test]
async fn test_game_state_errors_and_snapshot() {
    let registry = registry();
    let (room, mut host, _guest) = full_room(&registry, GameKind::WordGuess).await;

    assert_eq!(
        registry.game_state("NOPE22", host.conn).await,
        Err(RoomError::Gone)
    );
    assert_eq!(
        registry
            .game_state(room.code().as_str(), conn(77))
            .await
            .unwrap_err()
            .to_string(),
        "You are not in this room"
    );

    registry
        .game_state(room.code().as_str(), host.conn)
        .await
        .unwrap();
    assert_eq!(kinds(&host.events()), ["gameState"]);
}

#[tokio::test]
async fn test_chat_broadcasts_to_every_member() {
    let registry = registry();
    let (room, mut host, mut guest) = full_room(&registry, GameKind::Dots).await;

    registry
        .chat(room.code().as_str(), guest.conn, "gg".into())
        .await
        .unwrap();
    for events in [host.events(), guest.events()] {
        let [ServerEvent::ChatMessage(chat)] = events.as_slice() else {
            panic!("expected one chatMessage, got {events:?}");
        };
        assert_eq!(chat.username, "bob");
        assert_eq!(chat.message, "gg");
        assert_eq!(chat.role, "P2");
        assert!(chat.timestamp > 0);
    }
}
