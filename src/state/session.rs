//! Links transient connections to durable players.
//!
//! A binding only references a match and a player; player state itself
//! lives in the match.

use crate::types::{ConnectionId, MatchId, PlayerId};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBinding {
    pub match_id: MatchId,
    pub player_id: PlayerId,
}

#[derive(Default)]
pub struct SessionBinder {
    bindings: RwLock<HashMap<ConnectionId, SessionBinding>>,
}

impl SessionBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a connection to a player. Returns the binding it replaced.
    pub async fn bind(
        &self,
        connection_id: ConnectionId,
        match_id: MatchId,
        player_id: PlayerId,
    ) -> Option<SessionBinding> {
        self.bindings.write().await.insert(
            connection_id,
            SessionBinding {
                match_id,
                player_id,
            },
        )
    }

    pub async fn resolve(&self, connection_id: &str) -> Option<SessionBinding> {
        self.bindings.read().await.get(connection_id).cloned()
    }

    /// Drop a connection's binding and return what it was bound to.
    /// The player entry in the match is left to the caller.
    pub async fn unbind(&self, connection_id: &str) -> Option<SessionBinding> {
        self.bindings.write().await.remove(connection_id)
    }

    /// Number of live connections bound to `player_id` in `match_id`
    pub async fn connections_for(&self, match_id: &str, player_id: &str) -> usize {
        self.bindings
            .read()
            .await
            .values()
            .filter(|b| b.match_id == match_id && b.player_id == player_id)
            .count()
    }
}
