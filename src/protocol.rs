use crate::error::GameError;
use crate::types::*;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateMatch {
        #[serde(default)]
        player_name: Option<String>,
    },
    JoinMatch {
        match_id: MatchId,
        #[serde(default)]
        player_name: Option<String>,
    },
    ThrowDart {
        match_id: MatchId,
        /// Sector hit: 0-20, or 25 for the bull
        score: i32,
        multiplier: i32,
    },
    GetMatchState {
        match_id: MatchId,
    },
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        connection_id: ConnectionId,
        server_now: String,
    },
    /// Sent to the creator
    MatchCreated {
        match_id: MatchId,
        player_id: PlayerId,
        game_state: MatchSnapshot,
    },
    /// Sent to a joining (or rejoining) connection
    MatchJoined {
        match_id: MatchId,
        player_id: PlayerId,
        game_state: MatchSnapshot,
    },
    /// Broadcast to the rest of the match when someone joins
    PlayerJoined {
        player_id: PlayerId,
        player_name: String,
        game_state: MatchSnapshot,
    },
    MatchStarted {
        game_state: MatchSnapshot,
    },
    DartThrown {
        outcome: ThrowOutcome,
        game_state: MatchSnapshot,
    },
    /// Broadcast when the turn clock forfeits a turn
    TurnTimedOut {
        player_id: PlayerId,
        game_state: MatchSnapshot,
    },
    PlayerDisconnected {
        player_id: PlayerId,
        player_name: String,
    },
    MatchState {
        game_state: MatchSnapshot,
    },
    HeartbeatAck,
    Error {
        code: String,
        msg: String,
    },
}

impl From<GameError> for ServerMessage {
    fn from(err: GameError) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            msg: err.to_string(),
        }
    }
}
