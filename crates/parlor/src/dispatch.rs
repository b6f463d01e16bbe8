//! Routes decoded client commands to the room registry.
//!
//! Client-facing failures come back from the registry as a [`RoomError`]
//! whose text is sent verbatim in an `error` event. Which failures are
//! reported and which are only logged depends on the command: lookups on
//! create, join and state requests are answered, a refused restart is
//! answered, and everything about moves, chat and leave is silent.

use parlor_protocol::{Codec, Command, Envelope};
use parlor_room::{JoinOutcome, RoomError};

use crate::handler::Session;
use crate::server::ServerState;

/// Handles one envelope from `session`'s connection.
pub(crate) async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    session: &mut Session<C>,
    envelope: &Envelope,
) {
    let conn_id = session.conn_id;
    let command = match Command::from_envelope(envelope) {
        Ok(Some(command)) => command,
        Ok(None) => {
            tracing::debug!(%conn_id, kind = %envelope.kind, "unknown command, dropping");
            return;
        }
        Err(e) => {
            tracing::warn!(%conn_id, kind = %envelope.kind, error = %e, "malformed payload");
            return;
        }
    };

    match command {
        Command::Create { game, username } => {
            if let Err(e) = ensure_unseated(state, session).await {
                session.send_error(&e);
                return;
            }
            let room = state
                .rooms
                .create(game, username, conn_id, session.sender.clone())
                .await;
            session.room = Some(room.code().clone());
        }

        Command::Join { code, username } => {
            if let Err(e) = ensure_unseated(state, session).await {
                session.send_error(&e);
                return;
            }
            match state
                .rooms
                .join(&code, username, conn_id, session.sender.clone())
                .await
            {
                Ok((room, outcome)) => {
                    if outcome == JoinOutcome::Reconnected {
                        tracing::debug!(%conn_id, %code, "seat reclaimed by name");
                    }
                    session.room = Some(room.code().clone());
                }
                Err(e) => {
                    tracing::debug!(%conn_id, %code, error = %e, "join refused");
                    session.send_error(&e);
                }
            }
        }

        Command::Move(mv) => {
            let Some(code) = session.room.as_ref() else {
                tracing::debug!(%conn_id, "move outside a room, ignoring");
                return;
            };
            if let Err(e) = state.rooms.apply_move(code.as_str(), conn_id, &mv).await {
                tracing::debug!(%conn_id, %code, error = %e, "move ignored");
            }
        }

        Command::Restart => {
            let Some(code) = session.room.as_ref() else {
                return;
            };
            match state.rooms.restart(code.as_str(), conn_id).await {
                Ok(()) => {}
                Err(e @ RoomError::NotHost) => session.send_error(&e),
                Err(e) => tracing::debug!(%conn_id, %code, error = %e, "restart ignored"),
            }
        }

        Command::GetGameState { code } => {
            let code = code.or_else(|| session.room.as_ref().map(|c| c.to_string()));
            let result = match code {
                Some(code) => state.rooms.game_state(&code, conn_id).await,
                None => Err(RoomError::Gone),
            };
            if let Err(e) = result {
                session.send_error(&e);
            }
        }

        Command::Chat { message } => {
            let Some(code) = session.room.as_ref() else {
                return;
            };
            if let Err(e) = state.rooms.chat(code.as_str(), conn_id, message).await {
                tracing::debug!(%conn_id, %code, error = %e, "chat ignored");
            }
        }

        Command::Leave => {
            let Some(code) = session.room.take() else {
                return;
            };
            if let Err(e) = state.rooms.leave(code.as_str(), conn_id).await {
                tracing::debug!(%conn_id, %code, error = %e, "leave ignored");
            }
        }
    }
}

/// Refuses a second create/join while the connection still holds a seat
/// in a live room. A stale binding (room closed, seat vacated) is cleared.
async fn ensure_unseated<C: Codec>(
    state: &ServerState<C>,
    session: &mut Session<C>,
) -> Result<(), RoomError> {
    let Some(code) = session.room.take() else {
        return Ok(());
    };
    if state.rooms.is_seated(code.as_str(), session.conn_id).await {
        session.room = Some(code.clone());
        return Err(RoomError::AlreadyInRoom(code));
    }
    Ok(())
}
