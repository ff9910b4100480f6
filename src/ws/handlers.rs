//! WebSocket message dispatch
//!
//! Main entry point for client messages. Each command is routed to its
//! handler in [`super::player`].

use super::connection::Connection;
use super::player;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use std::sync::Arc;

/// Handle a client message and return the reply for the calling connection
pub async fn handle_message(
    msg: ClientMessage,
    conn: &mut Connection,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::CreateMatch { player_name } => {
            player::handle_create_match(state, conn, player_name).await
        }

        ClientMessage::JoinMatch {
            match_id,
            player_name,
        } => player::handle_join_match(state, conn, match_id, player_name).await,

        ClientMessage::ThrowDart {
            match_id,
            score,
            multiplier,
        } => player::handle_throw_dart(state, conn, match_id, score, multiplier).await,

        ClientMessage::GetMatchState { match_id } => {
            player::handle_get_match_state(state, match_id).await
        }

        ClientMessage::Heartbeat => Some(ServerMessage::HeartbeatAck),
    }
}

/// Clean up after a closed connection
pub async fn handle_disconnect(conn: &Connection, state: &Arc<AppState>) {
    player::handle_disconnect(state, conn).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_heartbeat() {
        let state = Arc::new(AppState::new());
        let mut conn = Connection::new();

        let result = handle_message(ClientMessage::Heartbeat, &mut conn, &state).await;
        assert!(matches!(result, Some(ServerMessage::HeartbeatAck)));
    }

    #[tokio::test]
    async fn test_create_match() {
        let state = Arc::new(AppState::new());
        let mut conn = Connection::new();

        let result = handle_message(
            ClientMessage::CreateMatch {
                player_name: Some("Alice".to_string()),
            },
            &mut conn,
            &state,
        )
        .await;

        if let Some(ServerMessage::MatchCreated {
            match_id,
            player_id,
            game_state,
        }) = result
        {
            assert_eq!(conn.match_id(), Some(&match_id));
            assert_eq!(game_state.players[0].id, player_id);
            assert_eq!(game_state.players[0].name, "Alice");
        } else {
            panic!("Expected MatchCreated message");
        }
    }

    #[tokio::test]
    async fn test_throw_without_binding() {
        let state = Arc::new(AppState::new());
        let mut creator = Connection::new();
        let created = handle_message(
            ClientMessage::CreateMatch { player_name: None },
            &mut creator,
            &state,
        )
        .await;
        let Some(ServerMessage::MatchCreated { match_id, .. }) = created else {
            panic!("Expected MatchCreated message");
        };

        let mut stranger = Connection::new();
        let result = handle_message(
            ClientMessage::ThrowDart {
                match_id,
                score: 20,
                multiplier: 1,
            },
            &mut stranger,
            &state,
        )
        .await;

        if let Some(ServerMessage::Error { code, .. }) = result {
            assert_eq!(code, "PLAYER_NOT_BOUND");
        } else {
            panic!("Expected Error message");
        }
    }

    #[tokio::test]
    async fn test_unknown_match() {
        let state = Arc::new(AppState::new());
        let mut conn = Connection::new();

        for msg in [
            ClientMessage::GetMatchState {
                match_id: "nope".to_string(),
            },
            ClientMessage::JoinMatch {
                match_id: "nope".to_string(),
                player_name: None,
            },
            ClientMessage::ThrowDart {
                match_id: "nope".to_string(),
                score: 1,
                multiplier: 1,
            },
        ] {
            match handle_message(msg, &mut conn, &state).await {
                Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "MATCH_NOT_FOUND"),
                other => panic!("Expected MATCH_NOT_FOUND, got {:?}", other),
            }
        }
        assert!(conn.match_id().is_none());
    }
}
