use crate::protocol::ServerMessage;
use crate::state::{AppState, ClockStatus};
use crate::types::MatchId;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Spawn the background task that forfeits expired turns of one match.
///
/// The task stops on its own once the match is over or has left the registry.
pub fn spawn_turn_clock(state: Arc<AppState>, match_id: MatchId) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(state.config.clock_tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!("Turn clock started for match {}", match_id);

        loop {
            ticker.tick().await;

            match state.expire_turn(&match_id, chrono::Utc::now()).await {
                ClockStatus::Running => {}
                ClockStatus::Expired {
                    handle,
                    player_id,
                    snapshot,
                } => {
                    handle.broadcast(ServerMessage::TurnTimedOut {
                        player_id,
                        game_state: snapshot,
                    });
                }
                ClockStatus::Finished => break,
            }
        }

        tracing::debug!("Turn clock stopped for match {}", match_id);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::time::Duration;

    fn fast_state() -> Arc<AppState> {
        Arc::new(AppState::with_config(AppConfig {
            clock_tick: Duration::from_millis(5),
            ..AppConfig::default()
        }))
    }

    #[tokio::test]
    async fn test_clock_stops_for_unknown_match() {
        let state = fast_state();
        let task = spawn_turn_clock(state, "missing".to_string());
        assert!(tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_clock_stops_when_match_over() {
        let state = fast_state();
        let alice = state
            .create_match(&"c1".to_string(), Some("Alice".to_string()))
            .await;
        let match_id = alice.handle.id().clone();
        state
            .join_match(&"c2".to_string(), &match_id, Some("Bob".to_string()))
            .await
            .unwrap();

        let task = spawn_turn_clock(state.clone(), match_id.clone());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        // Alice: two maximums, then a 141 checkout
        let bob = state
            .get_snapshot(&match_id)
            .await
            .unwrap()
            .players[1]
            .id
            .clone();
        for _ in 0..2 {
            for _ in 0..3 {
                state.throw(&match_id, &alice.player_id, 20, 3).await.unwrap();
            }
            for _ in 0..3 {
                state.throw(&match_id, &bob, 0, 1).await.unwrap();
            }
        }
        // 501 - 360 = 141: T20, T19, D12
        state.throw(&match_id, &alice.player_id, 20, 3).await.unwrap();
        state.throw(&match_id, &alice.player_id, 19, 3).await.unwrap();
        let last = state.throw(&match_id, &alice.player_id, 12, 2).await.unwrap();
        assert!(last.outcome.game_over);

        assert!(tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_clock_announces_expired_turn_once() {
        let state = fast_state();
        let alice = state
            .create_match(&"c1".to_string(), Some("Alice".to_string()))
            .await;
        let match_id = alice.handle.id().clone();
        state
            .join_match(&"c2".to_string(), &match_id, Some("Bob".to_string()))
            .await
            .unwrap();

        let mut group = alice.handle.subscribe();
        alice
            .handle
            .lock()
            .await
            .backdate_turn(chrono::Duration::seconds(31));

        let task = spawn_turn_clock(state.clone(), match_id.clone());
        let event = tokio::time::timeout(Duration::from_secs(1), group.recv())
            .await
            .expect("clock should announce the expiry")
            .unwrap();
        assert!(event.skip.is_none());
        match event.message {
            ServerMessage::TurnTimedOut {
                player_id,
                game_state,
            } => {
                assert_eq!(player_id, alice.player_id);
                assert_eq!(game_state.current_turn, 1);
                assert_ne!(game_state.current_player, Some(alice.player_id.clone()));
            }
            other => panic!("Expected TurnTimedOut, got {:?}", other),
        }

        // The next deadline is a full turn away
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(
            group.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
        assert!(!task.is_finished());
        task.abort();
    }
}
