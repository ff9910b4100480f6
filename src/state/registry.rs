//! In-memory collection of live matches.
//!
//! The registry lock is only held to insert, evict or look up an entry.
//! Mutating a match goes through that match's own mutex.

use super::game::Match;
use crate::protocol::ServerMessage;
use crate::types::{ConnectionId, MatchId, RETENTION_HOURS};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, MutexGuard, RwLock};

/// URL-safe alphabet for match codes
const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
const CODE_LENGTH: usize = 11;
const GROUP_CAPACITY: usize = 64;

fn generate_match_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Message for every connection subscribed to a match, optionally skipping one
#[derive(Debug, Clone)]
pub struct GroupEvent {
    pub skip: Option<ConnectionId>,
    pub message: ServerMessage,
}

/// Shared handle to one match and its connection group
#[derive(Clone)]
pub struct MatchHandle {
    id: MatchId,
    game: Arc<Mutex<Match>>,
    group: broadcast::Sender<GroupEvent>,
}

impl MatchHandle {
    pub fn id(&self) -> &MatchId {
        &self.id
    }

    /// Acquire this match's exclusion boundary
    pub async fn lock(&self) -> MutexGuard<'_, Match> {
        self.game.lock().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GroupEvent> {
        self.group.subscribe()
    }

    /// Send to every connection in the match
    pub fn broadcast(&self, message: ServerMessage) {
        // No subscribers is fine
        let _ = self.group.send(GroupEvent {
            skip: None,
            message,
        });
    }

    /// Send to every connection in the match except `connection_id`
    pub fn broadcast_except(&self, connection_id: &ConnectionId, message: ServerMessage) {
        let _ = self.group.send(GroupEvent {
            skip: Some(connection_id.clone()),
            message,
        });
    }
}

struct MatchEntry {
    handle: MatchHandle,
    created_at: DateTime<Utc>,
}

pub struct MatchRegistry {
    matches: RwLock<HashMap<MatchId, MatchEntry>>,
    retention: Duration,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self {
            matches: RwLock::new(HashMap::new()),
            retention: Duration::hours(RETENTION_HOURS),
        }
    }

    fn is_expired(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - created_at > self.retention
    }

    /// Create and store an empty match, evicting stale ones first
    pub async fn create(&self) -> MatchHandle {
        let mut matches = self.matches.write().await;

        let now = Utc::now();
        let before = matches.len();
        matches.retain(|_, entry| !self.is_expired(entry.created_at, now));
        let evicted = before - matches.len();
        if evicted > 0 {
            tracing::info!("Evicted {} expired matches", evicted);
        }

        let id = loop {
            let code = generate_match_code();
            if !matches.contains_key(&code) {
                break code;
            }
        };

        let game = Match::new(id.clone());
        let created_at = game.created_at();
        let (group, _rx) = broadcast::channel(GROUP_CAPACITY);
        let handle = MatchHandle {
            id: id.clone(),
            game: Arc::new(Mutex::new(game)),
            group,
        };

        matches.insert(
            id,
            MatchEntry {
                handle: handle.clone(),
                created_at,
            },
        );
        handle
    }

    /// Look up a match. Matches past the retention window are not returned
    /// even if they have not been evicted yet.
    pub async fn get(&self, match_id: &str) -> Option<MatchHandle> {
        let matches = self.matches.read().await;
        let entry = matches.get(match_id)?;
        if self.is_expired(entry.created_at, Utc::now()) {
            return None;
        }
        Some(entry.handle.clone())
    }

    pub async fn len(&self) -> usize {
        self.matches.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.matches.read().await.is_empty()
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}
