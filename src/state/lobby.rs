use super::registry::MatchHandle;
use super::session::SessionBinding;
use super::AppState;
use crate::error::{GameError, GameResult};
use crate::types::*;

const DEFAULT_CREATOR_NAME: &str = "Player 1";
const DEFAULT_JOINER_NAME: &str = "Player 2";

/// A connection that now plays in a match
pub struct JoinedMatch {
    pub handle: MatchHandle,
    pub player_id: PlayerId,
    pub player_name: String,
    pub snapshot: MatchSnapshot,
    /// Resumed an existing player instead of adding one
    pub rejoined: bool,
    /// This join completed the lineup and started the match
    pub started_now: bool,
    /// The player this connection played as before, if it just went away
    pub left: Option<Disconnected>,
}

/// A player whose last connection went away
pub struct Disconnected {
    pub handle: MatchHandle,
    pub player_id: PlayerId,
    pub player_name: String,
}

fn display_name(name: Option<String>, default: &str) -> String {
    name.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl AppState {
    /// Create a match with the caller as its first player
    pub async fn create_match(
        &self,
        connection_id: &ConnectionId,
        player_name: Option<String>,
    ) -> JoinedMatch {
        let player_name = display_name(player_name, DEFAULT_CREATOR_NAME);
        let handle = self.registry.create().await;
        let player_id = ulid::Ulid::new().to_string();

        let (snapshot, previous) = {
            let mut game = handle.lock().await;
            let added = game.add_player(player_id.clone(), player_name.clone());
            debug_assert!(added, "fresh match must accept its creator");
            let previous = self
                .sessions
                .bind(connection_id.clone(), handle.id().clone(), player_id.clone())
                .await;
            (game.snapshot(), previous)
        };

        tracing::info!("Match created: {} by {}", handle.id(), player_name);
        let left = match previous {
            Some(binding) => self.release(binding).await,
            None => None,
        };

        JoinedMatch {
            handle,
            player_id,
            player_name,
            snapshot,
            rejoined: false,
            started_now: false,
            left,
        }
    }

    /// Join a match by name.
    ///
    /// A name already present in the match resumes that player (even if the
    /// match is full). A new name takes the free seat, and filling the second
    /// seat starts the match.
    pub async fn join_match(
        &self,
        connection_id: &ConnectionId,
        match_id: &str,
        player_name: Option<String>,
    ) -> GameResult<JoinedMatch> {
        let player_name = display_name(player_name, DEFAULT_JOINER_NAME);
        let handle = self
            .registry
            .get(match_id)
            .await
            .ok_or_else(|| GameError::MatchNotFound(match_id.to_string()))?;

        let mut game = handle.lock().await;
        let existing = game.player_by_name(&player_name).map(|p| p.id.clone());
        let (player_id, rejoined) = match existing {
            Some(player_id) => {
                game.set_connected(&player_id, true);
                (player_id, true)
            }
            None => {
                let player_id = ulid::Ulid::new().to_string();
                if !game.add_player(player_id.clone(), player_name.clone()) {
                    return Err(GameError::MatchFull);
                }
                (player_id, false)
            }
        };
        let started_now = game.start();
        let snapshot = game.snapshot();
        // Bound before the match unlocks, so a racing disconnect of the same
        // player sees this connection
        let previous = self
            .sessions
            .bind(connection_id.clone(), handle.id().clone(), player_id.clone())
            .await;
        drop(game);

        if rejoined {
            tracing::info!("Player rejoined match {}: {}", match_id, player_name);
        } else {
            tracing::info!("Player joined match {}: {}", match_id, player_name);
        }
        if started_now {
            tracing::info!("Match {} started", match_id);
        }

        let left = match previous {
            Some(binding) if binding.match_id != *handle.id() || binding.player_id != player_id => {
                self.release(binding).await
            }
            _ => None,
        };

        Ok(JoinedMatch {
            handle,
            player_id,
            player_name,
            snapshot,
            rejoined,
            started_now,
            left,
        })
    }

    /// Forget a closed connection and mark its player disconnected.
    ///
    /// Returns `None` when the connection was never bound, the match is gone,
    /// or another connection still plays as the same player.
    pub async fn on_disconnect(&self, connection_id: &str) -> Option<Disconnected> {
        let binding = self.sessions.unbind(connection_id).await?;
        self.release(binding).await
    }

    /// Mark the player of a dropped binding disconnected unless another
    /// connection still plays as them. Checked under the match lock, the same
    /// one `join_match` binds under.
    async fn release(&self, binding: SessionBinding) -> Option<Disconnected> {
        let handle = self.registry.get(&binding.match_id).await?;

        let mut game = handle.lock().await;
        if self
            .sessions
            .connections_for(&binding.match_id, &binding.player_id)
            .await
            > 0
        {
            return None;
        }
        if !game.set_connected(&binding.player_id, false) {
            return None;
        }
        let player_name = game.player(&binding.player_id)?.name.clone();
        drop(game);

        tracing::info!(
            "Player {} disconnected from match {}",
            player_name,
            binding.match_id
        );

        Some(Disconnected {
            handle,
            player_id: binding.player_id,
            player_name,
        })
    }
}
