use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for structured error handling on the RPC surface and the push
/// channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown room id, or unknown player id on reconnect.
    NotFound,
    /// Malformed input: empty player name, missing moves, unknown player on a
    /// room operation.
    InvalidArgument,
    /// The operation requires a game in progress but none exists.
    InvalidState,
    /// Solution verification failed; the client recovers by editing moves.
    InvalidSolution,
    /// Unexpected server-side failure.
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidState => "INVALID_STATE",
            Self::InvalidSolution => "INVALID_SOLUTION",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
