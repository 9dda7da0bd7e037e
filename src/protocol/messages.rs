use serde::{Deserialize, Serialize};

use crate::game::Move;

use super::types::{PlayerId, PlayerSolution};

/// Request body for `CreateRoom`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub player_name: String,
}

/// Request body for `JoinRoom`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub player_name: String,
}

/// Request body for `StartGame`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameRequest {
    #[serde(default)]
    pub use_fixed_board: bool,
}

/// Request body for `SubmitSolution`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSolutionRequest {
    pub player_id: PlayerId,
    #[serde(default)]
    pub moves: Vec<Move>,
}

/// Response body for `SubmitSolution`: the stored current best.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSolutionResponse {
    pub solution: PlayerSolution,
}

/// Request body for the player-keyed room operations
/// (`RetractSolution`, `MarkFinishedSolving`, `MarkReadyForNext`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerActionRequest {
    pub player_id: PlayerId,
}

/// Frames sent by clients on the push channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Attach this connection to a room; `player_id` binds the connection to a
    /// player so that closing it starts the disconnect grace period.
    Subscribe {
        room_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_id: Option<PlayerId>,
    },
    /// Cancel a pending disconnect grace timer after a network drop.
    Reconnect {
        room_id: String,
        player_id: PlayerId,
    },
    /// Heartbeat.
    Ping,
}

/// Events pushed to room subscribers. JSON shape:
/// `{"type": <discriminator>, "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
#[serde(rename_all_fields = "camelCase")]
pub enum Event {
    PlayerJoined {
        room_id: String,
        player_id: PlayerId,
        player_name: String,
    },
    PlayerLeft {
        room_id: String,
        player_id: PlayerId,
    },
    GameStarted {
        room_id: String,
    },
    PlayerSolved {
        room_id: String,
        player_id: PlayerId,
        move_count: usize,
    },
    SolutionRetracted {
        room_id: String,
        player_id: PlayerId,
    },
    PlayerFinishedSolving {
        room_id: String,
        player_id: PlayerId,
    },
    PlayerReadyForNext {
        room_id: String,
        player_id: PlayerId,
    },
    GameEnded {
        room_id: String,
        winner_id: Option<PlayerId>,
        winner_name: Option<String>,
        moves: Vec<Move>,
    },
}

impl Event {
    /// The room this event belongs to.
    pub fn room_id(&self) -> &str {
        match self {
            Self::PlayerJoined { room_id, .. }
            | Self::PlayerLeft { room_id, .. }
            | Self::GameStarted { room_id }
            | Self::PlayerSolved { room_id, .. }
            | Self::SolutionRetracted { room_id, .. }
            | Self::PlayerFinishedSolving { room_id, .. }
            | Self::PlayerReadyForNext { room_id, .. }
            | Self::GameEnded { room_id, .. } => room_id,
        }
    }

    /// The wire discriminator, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlayerJoined { .. } => "player_joined",
            Self::PlayerLeft { .. } => "player_left",
            Self::GameStarted { .. } => "game_started",
            Self::PlayerSolved { .. } => "player_solved",
            Self::SolutionRetracted { .. } => "solution_retracted",
            Self::PlayerFinishedSolving { .. } => "player_finished_solving",
            Self::PlayerReadyForNext { .. } => "player_ready_for_next",
            Self::GameEnded { .. } => "game_ended",
        }
    }
}
