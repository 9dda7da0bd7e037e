use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::Move;

/// Opaque per-room player identifier, minted by the server on join.
pub type PlayerId = Uuid;

/// Room ids are 4 human-typeable characters.
pub const ROOM_CODE_LENGTH: usize = 4;

/// Push-channel connection state of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    #[default]
    Connected,
    Disconnected,
}

/// A player in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub status: PlayerStatus,
    /// Set while the player is disconnected; cleared on reconnect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disconnected_at: Option<DateTime<Utc>>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status: PlayerStatus::Connected,
            disconnected_at: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == PlayerStatus::Connected
    }
}

/// A player's current best solution for the running game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSolution {
    pub player_id: PlayerId,
    pub solved_at: DateTime<Utc>,
    pub moves: Vec<Move>,
}

impl PlayerSolution {
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }
}

/// One distinct move count a player has reached this game, with the timestamp
/// at which that count was FIRST achieved. Used to restore a previous best on
/// retraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionAttempt {
    pub move_count: usize,
    pub solved_at: DateTime<Utc>,
    pub moves: Vec<Move>,
}
