use thiserror::Error;

use crate::game::VerifyError;
use crate::protocol::ErrorCode;

/// Typed errors returned by the managers and mapped onto the RPC error model
/// by the api layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("invalid solution: {0}")]
    InvalidSolution(#[from] VerifyError),
}

impl ServiceError {
    pub fn room_not_found(room_id: &str) -> Self {
        Self::NotFound(format!("Room `{room_id}` not found"))
    }

    pub fn player_not_found() -> Self {
        Self::NotFound("Player not found".to_string())
    }

    pub fn unknown_player() -> Self {
        Self::InvalidArgument("Unknown player".to_string())
    }

    pub fn no_game_in_progress() -> Self {
        Self::InvalidState("No game in progress".to_string())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::InvalidSolution(_) => ErrorCode::InvalidSolution,
        }
    }
}
