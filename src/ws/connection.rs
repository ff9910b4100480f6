//! Per-socket context: identity plus the match group it listens to

use crate::protocol::ServerMessage;
use crate::state::registry::{GroupEvent, MatchHandle};
use crate::types::{ConnectionId, MatchId};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

pub struct Connection {
    id: ConnectionId,
    group: Option<(MatchId, broadcast::Receiver<GroupEvent>)>,
}

impl Connection {
    pub fn new() -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            group: None,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Match whose broadcasts this connection receives
    pub fn match_id(&self) -> Option<&MatchId> {
        self.group.as_ref().map(|(id, _)| id)
    }

    /// Subscribe to a match's broadcasts, leaving any previous group
    pub fn enter_group(&mut self, handle: &MatchHandle) {
        if self.match_id() == Some(handle.id()) {
            return;
        }
        self.group = Some((handle.id().clone(), handle.subscribe()));
    }

    /// Wait for the next broadcast addressed to this connection.
    ///
    /// Pends forever while not in a group.
    pub async fn next_group_message(&mut self) -> Option<ServerMessage> {
        let Some((match_id, rx)) = self.group.as_mut() else {
            return std::future::pending().await;
        };

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if event.skip.as_ref() == Some(&self.id) {
                        continue;
                    }
                    return Some(event.message);
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(
                        "Connection {} missed {} messages from match {}",
                        self.id,
                        missed,
                        match_id
                    );
                }
                Err(RecvError::Closed) => {
                    self.group = None;
                    return None;
                }
            }
        }
    }

    /// Take every broadcast already queued for this connection.
    /// Used by tests that drive handlers without a socket.
    #[doc(hidden)]
    pub fn drain_group(&mut self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        let Some((_, rx)) = self.group.as_mut() else {
            return messages;
        };

        loop {
            match rx.try_recv() {
                Ok(event) => {
                    if event.skip.as_ref() != Some(&self.id) {
                        messages.push(event.message);
                    }
                }
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        messages
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}
