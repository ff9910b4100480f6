use crate::types::MatchId;

/// Rejections of a client command.
///
/// None of these mutate state, and each is reported only to the connection
/// that issued the command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),

    #[error("Match is full")]
    MatchFull,

    #[error("Game is over")]
    GameOver,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Turn is over")]
    TurnComplete,

    #[error("Invalid score {0}")]
    InvalidScore(i32),

    #[error("Invalid multiplier {0}")]
    InvalidMultiplier(i32),

    #[error("No triple bullseye")]
    InvalidBullseye,

    #[error("Player not in game")]
    PlayerNotBound,
}

impl GameError {
    /// Stable code sent over the wire alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            GameError::MatchNotFound(_) => "MATCH_NOT_FOUND",
            GameError::MatchFull => "MATCH_FULL",
            GameError::GameOver => "GAME_OVER",
            GameError::NotYourTurn => "NOT_YOUR_TURN",
            GameError::TurnComplete => "TURN_COMPLETE",
            GameError::InvalidScore(_) => "INVALID_SCORE",
            GameError::InvalidMultiplier(_) => "INVALID_MULTIPLIER",
            GameError::InvalidBullseye => "INVALID_BULLSEYE",
            GameError::PlayerNotBound => "PLAYER_NOT_BOUND",
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;
