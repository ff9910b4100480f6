//! Score and turn state of a single two-player 501 match.
//!
//! Pure logic: no locking and no I/O. Callers serialize access.

use crate::error::{GameError, GameResult};
use crate::types::*;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

const MAX_PLAYERS: usize = 2;

#[derive(Debug, Clone)]
pub struct Match {
    id: MatchId,
    /// Insertion order is turn order
    players: Vec<Player>,
    scores: HashMap<PlayerId, i32>,
    turn: u64,
    turn_darts_thrown: u8,
    turn_started_at: Option<DateTime<Utc>>,
    /// Score of the current player before the first dart of this turn
    turn_start_score: Option<i32>,
    turn_busted: bool,
    started: bool,
    over: bool,
    winner: Option<PlayerId>,
    history: Vec<HistoryEntry>,
    created_at: DateTime<Utc>,
}

impl Match {
    pub fn new(id: MatchId) -> Self {
        Self::with_created_at(id, Utc::now())
    }

    pub(crate) fn with_created_at(id: MatchId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            players: Vec::with_capacity(MAX_PLAYERS),
            scores: HashMap::new(),
            turn: 0,
            turn_darts_thrown: 0,
            turn_started_at: None,
            turn_start_score: None,
            turn_busted: false,
            started: false,
            over: false,
            winner: None,
            history: Vec::new(),
            created_at,
        }
    }

    pub fn id(&self) -> &MatchId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Find a player by display name (used for rejoining)
    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn score(&self, player_id: &str) -> Option<i32> {
        self.scores.get(player_id).copied()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }

    pub fn turn_number(&self) -> u64 {
        self.turn
    }

    pub fn darts_thrown(&self) -> u8 {
        self.turn_darts_thrown
    }

    /// Full, untruncated history
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Update a player's connection flag. Returns false if the player is unknown.
    pub fn set_connected(&mut self, player_id: &str, connected: bool) -> bool {
        match self.players.iter_mut().find(|p| p.id == player_id) {
            Some(player) => {
                player.connected = connected;
                true
            }
            None => false,
        }
    }

    /// Add a player with a fresh score. Rejected when full or already present.
    pub fn add_player(&mut self, player_id: PlayerId, name: String) -> bool {
        if self.players.len() >= MAX_PLAYERS || self.player(&player_id).is_some() {
            return false;
        }

        self.scores.insert(player_id.clone(), STARTING_SCORE);
        self.players.push(Player {
            id: player_id,
            name,
            connected: true,
        });
        true
    }

    /// Start the match once both players are present. Idempotent.
    pub fn start(&mut self) -> bool {
        if self.players.len() != MAX_PLAYERS || self.started {
            return false;
        }
        self.started = true;
        self.turn_started_at = Some(Utc::now());
        true
    }

    pub fn current_player(&self) -> Option<&PlayerId> {
        self.current_player_entry().map(|p| &p.id)
    }

    fn current_player_entry(&self) -> Option<&Player> {
        if self.players.is_empty() {
            return None;
        }
        let index = (self.turn % self.players.len() as u64) as usize;
        self.players.get(index)
    }

    fn validate_throw(&self, player_id: &str, base_score: i32, multiplier: i32) -> GameResult<()> {
        if self.over {
            return Err(GameError::GameOver);
        }
        if self.current_player().map(String::as_str) != Some(player_id) {
            return Err(GameError::NotYourTurn);
        }
        if self.turn_darts_thrown >= DARTS_PER_TURN {
            return Err(GameError::TurnComplete);
        }
        // 25 is the only valid sector above 20
        if base_score < 0 || (base_score > 20 && base_score != BULLSEYE) {
            return Err(GameError::InvalidScore(base_score));
        }
        if !(1..=3).contains(&multiplier) {
            return Err(GameError::InvalidMultiplier(multiplier));
        }
        if base_score == BULLSEYE && multiplier == 3 {
            return Err(GameError::InvalidBullseye);
        }
        Ok(())
    }

    /// Apply one dart from `player_id`.
    ///
    /// A bust does not end the turn: the remaining darts are still thrown and
    /// recorded, but nothing further is committed, and when the turn ends the
    /// player's score goes back to what it was before the turn's first dart.
    pub fn process_throw(
        &mut self,
        player_id: &str,
        base_score: i32,
        multiplier: i32,
    ) -> GameResult<ThrowOutcome> {
        self.validate_throw(player_id, base_score, multiplier)?;

        let (player_id, player_name) = match self.current_player_entry() {
            Some(p) => (p.id.clone(), p.name.clone()),
            None => return Err(GameError::NotYourTurn),
        };
        let current_score = self.scores.get(&player_id).copied().unwrap_or(STARTING_SCORE);

        if self.turn_darts_thrown == 0 {
            self.turn_start_score = Some(current_score);
        }
        let turn_start_score = self.turn_start_score.unwrap_or(current_score);

        self.turn_darts_thrown += 1;
        let value = base_score * multiplier;
        let new_score = current_score - value;

        let bust_message = || format!("Bust! Score returns to {}", turn_start_score);
        let (outcome, committed, result) = if self.turn_busted {
            (ThrowResult::Bust, None, Some(bust_message()))
        } else if new_score < 0 || new_score == 1 {
            self.turn_busted = true;
            (ThrowResult::Bust, None, Some(bust_message()))
        } else if new_score == 0 && multiplier == 2 {
            self.scores.insert(player_id.clone(), 0);
            self.over = true;
            self.winner = Some(player_id.clone());
            (ThrowResult::Checkout, None, Some("Winner!".to_string()))
        } else if new_score == 0 {
            self.turn_busted = true;
            (
                ThrowResult::Bust,
                None,
                Some("Must finish on a double!".to_string()),
            )
        } else {
            self.scores.insert(player_id.clone(), new_score);
            (ThrowResult::Normal, Some(new_score), None)
        };

        let record = ThrowRecord {
            player_id: player_id.clone(),
            player_name,
            score: base_score,
            multiplier,
            value,
            dart_number: self.turn_darts_thrown,
            timestamp: Utc::now(),
            outcome,
            new_score: committed,
            result,
        };
        self.history.push(HistoryEntry::Throw(record.clone()));

        let turn_over = self.turn_darts_thrown >= DARTS_PER_TURN || self.over;
        if turn_over && !self.over {
            if self.turn_busted {
                self.scores.insert(player_id, turn_start_score);
            }
            self.next_turn(Utc::now());
        }

        Ok(ThrowOutcome {
            throw: record,
            scores: self.scores.clone(),
            turn_over,
            game_over: self.over,
            winner: self.winner.clone(),
            current_player: self.current_player().cloned(),
        })
    }

    fn next_turn(&mut self, now: DateTime<Utc>) {
        self.turn += 1;
        self.turn_darts_thrown = 0;
        self.turn_start_score = None;
        self.turn_busted = false;
        self.turn_started_at = Some(now);
    }

    /// Forfeit the rest of the current turn. No-op before start or after the end.
    pub fn handle_timeout(&mut self) -> bool {
        self.handle_timeout_at(Utc::now())
    }

    fn handle_timeout_at(&mut self, now: DateTime<Utc>) -> bool {
        if !self.started || self.over {
            return false;
        }
        let Some(player) = self.current_player_entry() else {
            return false;
        };

        let record = TimeoutRecord {
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            result: "Turn timed out".to_string(),
            timestamp: now,
        };
        tracing::info!(
            "Turn {} of match {} timed out for {}",
            self.turn,
            self.id,
            record.player_name
        );
        self.history.push(HistoryEntry::Timeout(record));
        self.next_turn(now);
        true
    }

    /// Expire the current turn if its deadline has passed at `now`.
    ///
    /// Starting the next turn resets the deadline, so one expiry fires once.
    pub fn expire_turn_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if !self.started || self.over || self.time_remaining_at(now) > 0 {
            return false;
        }
        self.handle_timeout_at(now)
    }

    /// Move the current turn's start into the past
    #[cfg(test)]
    pub(crate) fn backdate_turn(&mut self, by: chrono::Duration) {
        if let Some(started_at) = self.turn_started_at {
            self.turn_started_at = Some(started_at - by);
        }
    }

    /// Whole seconds left in the current turn
    pub fn time_remaining(&self) -> i64 {
        self.time_remaining_at(Utc::now())
    }

    pub fn time_remaining_at(&self, now: DateTime<Utc>) -> i64 {
        match self.turn_started_at {
            None => TURN_SECONDS,
            Some(started_at) => {
                let elapsed = (now - started_at).num_seconds();
                (TURN_SECONDS - elapsed).clamp(0, TURN_SECONDS)
            }
        }
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        let visible_from = self.history.len().saturating_sub(VISIBLE_HISTORY);
        MatchSnapshot {
            match_id: self.id.clone(),
            players: self.players.clone(),
            scores: self.scores.clone(),
            current_turn: self.turn,
            current_player: self.current_player().cloned(),
            time_remaining: self.time_remaining(),
            turn_darts_thrown: self.turn_darts_thrown,
            game_started: self.started,
            game_over: self.over,
            winner: self.winner.clone(),
            history: self.history[visible_from..].to_vec(),
            created_at: self.created_at,
        }
    }
}
