use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque ID types for type safety
pub type MatchId = String;
pub type PlayerId = String;
pub type ConnectionId = String;

/// Points every player starts a leg with
pub const STARTING_SCORE: i32 = 501;
pub const DARTS_PER_TURN: u8 = 3;
pub const TURN_SECONDS: i64 = 30;
/// Number of history entries exposed in a snapshot
pub const VISIBLE_HISTORY: usize = 20;
/// Matches older than this are unreachable and get evicted
pub const RETENTION_HOURS: i64 = 2;

pub const BULLSEYE: i32 = 25;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub connected: bool,
}

/// How a single dart resolved
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ThrowResult {
    Normal,
    Bust,
    Checkout,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThrowRecord {
    pub player_id: PlayerId,
    pub player_name: String,
    /// Sector hit (0-20 or 25)
    pub score: i32,
    pub multiplier: i32,
    pub value: i32,
    /// 1-based position of the dart within its turn
    pub dart_number: u8,
    pub timestamp: DateTime<Utc>,
    pub outcome: ThrowResult,
    /// Committed score after a normal throw
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_score: Option<i32>,
    /// Human-readable result for bust and checkout darts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeoutRecord {
    pub player_id: PlayerId,
    pub player_name: String,
    pub result: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    Throw(ThrowRecord),
    Timeout(TimeoutRecord),
}

impl HistoryEntry {
    pub fn player_id(&self) -> &PlayerId {
        match self {
            HistoryEntry::Throw(t) => &t.player_id,
            HistoryEntry::Timeout(t) => &t.player_id,
        }
    }
}

/// Result of an accepted dart, broadcast to the whole match
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThrowOutcome {
    pub throw: ThrowRecord,
    pub scores: HashMap<PlayerId, i32>,
    pub turn_over: bool,
    pub game_over: bool,
    pub winner: Option<PlayerId>,
    pub current_player: Option<PlayerId>,
}

/// Read-only view of a match as exposed to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    /// Players in turn order
    pub players: Vec<Player>,
    pub scores: HashMap<PlayerId, i32>,
    pub current_turn: u64,
    pub current_player: Option<PlayerId>,
    pub time_remaining: i64,
    pub turn_darts_thrown: u8,
    pub game_started: bool,
    pub game_over: bool,
    pub winner: Option<PlayerId>,
    /// Most recent entries only, oldest first
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
}

impl MatchSnapshot {
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }
}
