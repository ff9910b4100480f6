//! Player command handlers
//!
//! Replies go back to the calling connection only; state changes are
//! broadcast to the match group.

use super::connection::Connection;
use crate::error::GameError;
use crate::protocol::ServerMessage;
use crate::state::{AppState, Disconnected};
use crate::turn_clock::spawn_turn_clock;
use crate::types::MatchId;
use std::sync::Arc;

pub async fn handle_create_match(
    state: &Arc<AppState>,
    conn: &mut Connection,
    player_name: Option<String>,
) -> Option<ServerMessage> {
    let created = state.create_match(conn.id(), player_name).await;
    conn.enter_group(&created.handle);
    if let Some(gone) = created.left {
        announce_departure(gone);
    }

    Some(ServerMessage::MatchCreated {
        match_id: created.handle.id().clone(),
        player_id: created.player_id,
        game_state: created.snapshot,
    })
}

pub async fn handle_join_match(
    state: &Arc<AppState>,
    conn: &mut Connection,
    match_id: MatchId,
    player_name: Option<String>,
) -> Option<ServerMessage> {
    let joined = match state.join_match(conn.id(), &match_id, player_name).await {
        Ok(joined) => joined,
        Err(e) => {
            tracing::debug!("Join of match {} rejected: {}", match_id, e);
            return Some(e.into());
        }
    };

    conn.enter_group(&joined.handle);
    if let Some(gone) = joined.left {
        announce_departure(gone);
    }
    joined.handle.broadcast_except(
        conn.id(),
        ServerMessage::PlayerJoined {
            player_id: joined.player_id.clone(),
            player_name: joined.player_name.clone(),
            game_state: joined.snapshot.clone(),
        },
    );

    if joined.started_now {
        joined.handle.broadcast(ServerMessage::MatchStarted {
            game_state: joined.snapshot.clone(),
        });
        spawn_turn_clock(state.clone(), match_id.clone());
    }

    Some(ServerMessage::MatchJoined {
        match_id,
        player_id: joined.player_id,
        game_state: joined.snapshot,
    })
}

pub async fn handle_throw_dart(
    state: &Arc<AppState>,
    conn: &Connection,
    match_id: MatchId,
    score: i32,
    multiplier: i32,
) -> Option<ServerMessage> {
    if state.registry.get(&match_id).await.is_none() {
        return Some(GameError::MatchNotFound(match_id).into());
    }
    let player_id = match state.resolve_player(conn.id(), &match_id).await {
        Ok(player_id) => player_id,
        Err(e) => return Some(e.into()),
    };

    match state.throw(&match_id, &player_id, score, multiplier).await {
        Ok(applied) => {
            tracing::info!(
                "Dart thrown in match {}: {}x{} ({:?})",
                match_id,
                score,
                multiplier,
                applied.outcome.throw.outcome
            );
            if applied.outcome.game_over {
                tracing::info!("Match {} won by {}", match_id, player_id);
            }
            applied.handle.broadcast(ServerMessage::DartThrown {
                outcome: applied.outcome,
                game_state: applied.snapshot,
            });
            None
        }
        Err(e) => {
            tracing::debug!("Throw in match {} rejected: {}", match_id, e);
            Some(e.into())
        }
    }
}

pub async fn handle_get_match_state(
    state: &Arc<AppState>,
    match_id: MatchId,
) -> Option<ServerMessage> {
    match state.get_snapshot(&match_id).await {
        Ok(game_state) => Some(ServerMessage::MatchState { game_state }),
        Err(e) => Some(e.into()),
    }
}

/// Mark the connection's player disconnected and tell the rest of the match
pub async fn handle_disconnect(state: &Arc<AppState>, conn: &Connection) {
    if let Some(gone) = state.on_disconnect(conn.id()).await {
        announce_departure(gone);
    }
}

fn announce_departure(gone: Disconnected) {
    gone.handle.broadcast(ServerMessage::PlayerDisconnected {
        player_id: gone.player_id,
        player_name: gone.player_name,
    });
}
