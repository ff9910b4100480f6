use super::registry::MatchHandle;
use super::AppState;
use crate::error::{GameError, GameResult};
use crate::types::*;
use chrono::{DateTime, Utc};

/// An accepted dart together with the state it produced
pub struct ThrowApplied {
    pub handle: MatchHandle,
    pub outcome: ThrowOutcome,
    pub snapshot: MatchSnapshot,
}

/// What a turn clock check found
pub enum ClockStatus {
    /// Turn still running (or match not started yet)
    Running,
    /// The current turn expired and was forfeited
    Expired {
        handle: MatchHandle,
        player_id: PlayerId,
        snapshot: MatchSnapshot,
    },
    /// Match is over or no longer reachable
    Finished,
}

impl AppState {
    async fn match_handle(&self, match_id: &str) -> GameResult<MatchHandle> {
        self.registry
            .get(match_id)
            .await
            .ok_or_else(|| GameError::MatchNotFound(match_id.to_string()))
    }

    /// Player a connection plays as in `match_id`
    pub async fn resolve_player(&self, connection_id: &str, match_id: &str) -> GameResult<PlayerId> {
        match self.sessions.resolve(connection_id).await {
            Some(binding) if binding.match_id == match_id => Ok(binding.player_id),
            _ => Err(GameError::PlayerNotBound),
        }
    }

    /// Apply a dart under the match lock
    pub async fn throw(
        &self,
        match_id: &str,
        player_id: &str,
        score: i32,
        multiplier: i32,
    ) -> GameResult<ThrowApplied> {
        let handle = self.match_handle(match_id).await?;

        let mut game = handle.lock().await;
        let outcome = game.process_throw(player_id, score, multiplier)?;
        let snapshot = game.snapshot();
        drop(game);

        Ok(ThrowApplied {
            handle,
            outcome,
            snapshot,
        })
    }

    pub async fn get_snapshot(&self, match_id: &str) -> GameResult<MatchSnapshot> {
        let handle = self.match_handle(match_id).await?;
        let snapshot = handle.lock().await.snapshot();
        Ok(snapshot)
    }

    /// Forfeit the current turn of `match_id` if its deadline passed at `now`.
    ///
    /// Takes the same lock as [`AppState::throw`], so a last-second dart and
    /// an expiry never interleave.
    pub async fn expire_turn(&self, match_id: &str, now: DateTime<Utc>) -> ClockStatus {
        let Some(handle) = self.registry.get(match_id).await else {
            return ClockStatus::Finished;
        };

        let mut game = handle.lock().await;
        if game.is_over() {
            return ClockStatus::Finished;
        }
        let Some(player_id) = game.current_player().cloned() else {
            return ClockStatus::Running;
        };
        if !game.expire_turn_if_due(now) {
            return ClockStatus::Running;
        }
        let snapshot = game.snapshot();
        drop(game);

        ClockStatus::Expired {
            handle,
            player_id,
            snapshot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn started(state: &AppState) -> (MatchId, PlayerId, PlayerId) {
        let alice = state
            .create_match(&"c1".to_string(), Some("Alice".to_string()))
            .await;
        let match_id = alice.handle.id().clone();
        let bob = state
            .join_match(&"c2".to_string(), &match_id, Some("Bob".to_string()))
            .await
            .unwrap();
        (match_id, alice.player_id, bob.player_id)
    }

    #[tokio::test]
    async fn test_resolve_player() {
        let state = AppState::new();
        let (match_id, alice, _) = started(&state).await;

        assert_eq!(state.resolve_player("c1", &match_id).await, Ok(alice));
        assert_eq!(
            state.resolve_player("c9", &match_id).await,
            Err(GameError::PlayerNotBound)
        );
        assert_eq!(
            state.resolve_player("c1", "other").await,
            Err(GameError::PlayerNotBound)
        );
    }

    #[tokio::test]
    async fn test_throw() {
        let state = AppState::new();
        let (match_id, alice, bob) = started(&state).await;

        let applied = state.throw(&match_id, &alice, 20, 3).await.unwrap();
        assert_eq!(applied.outcome.scores[&alice], 441);
        assert_eq!(applied.snapshot.turn_darts_thrown, 1);

        assert_eq!(
            state.throw(&match_id, &bob, 20, 3).await.err(),
            Some(GameError::NotYourTurn)
        );
        assert_eq!(
            state.throw("missing", &alice, 20, 3).await.err(),
            Some(GameError::MatchNotFound("missing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_expire_turn() {
        let state = AppState::new();
        let (match_id, alice, bob) = started(&state).await;

        assert!(matches!(
            state.expire_turn(&match_id, Utc::now()).await,
            ClockStatus::Running
        ));

        let later = Utc::now() + Duration::seconds(31);
        match state.expire_turn(&match_id, later).await {
            ClockStatus::Expired {
                player_id,
                snapshot,
                ..
            } => {
                assert_eq!(player_id, alice);
                assert_eq!(snapshot.current_player, Some(bob));
                assert_eq!(snapshot.current_turn, 1);
            }
            _ => panic!("Expected expired turn"),
        }
        // Same instant again does not fire twice
        assert!(matches!(
            state.expire_turn(&match_id, later).await,
            ClockStatus::Running
        ));

        assert!(matches!(
            state.expire_turn("missing", later).await,
            ClockStatus::Finished
        ));
    }

    #[tokio::test]
    async fn test_expire_turn_before_start() {
        let state = AppState::new();
        let created = state.create_match(&"c1".to_string(), None).await;
        let later = Utc::now() + Duration::minutes(5);
        assert!(matches!(
            state.expire_turn(created.handle.id(), later).await,
            ClockStatus::Running
        ));
        let snapshot = state.get_snapshot(created.handle.id()).await.unwrap();
        assert!(snapshot.history.is_empty());
    }
}
