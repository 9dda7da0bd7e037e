use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::Game;
use crate::protocol::{Player, PlayerId, PlayerSolution, SolutionAttempt};

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// The authoritative state of one room.
///
/// Rooms are owned by the repository and mutated only while holding the
/// per-room mutex. Game-scoped collections (`solutions`, `solution_history`,
/// `finished_solving`, `ready_for_next`) are reset on every game start.
/// Membership in the per-room sets is tracked by `PlayerId`, never by
/// back-pointers; `scrub_player` clears them in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// 4-character human-typeable code, stored uppercase.
    pub id: String,
    /// Join order is preserved.
    pub players: Vec<Player>,
    pub created_at: DateTime<Utc>,
    /// Backfilled to `created_at` when a pre-existing snapshot carries none.
    #[serde(default = "epoch")]
    pub last_activity_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_game: Option<Game>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_started_at: Option<DateTime<Utc>>,
    /// The current game has been concluded and credited. `current_game` is
    /// kept so clients can replay the ended game until the next start.
    #[serde(default)]
    pub game_ended: bool,
    /// Current best per player.
    #[serde(default)]
    pub solutions: HashMap<PlayerId, PlayerSolution>,
    /// Distinct move counts each player has reached this game.
    #[serde(default)]
    pub solution_history: HashMap<PlayerId, Vec<SolutionAttempt>>,
    #[serde(default)]
    pub wins: HashMap<PlayerId, u32>,
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub finished_solving: Vec<PlayerId>,
    #[serde(default)]
    pub ready_for_next: Vec<PlayerId>,
}

impl Room {
    pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            players: Vec::new(),
            created_at: now,
            last_activity_at: now,
            current_game: None,
            game_started_at: None,
            game_ended: false,
            solutions: HashMap::new(),
            solution_history: HashMap::new(),
            wins: HashMap::new(),
            games_played: 0,
            finished_solving: Vec::new(),
            ready_for_next: Vec::new(),
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn contains_player(&self, player_id: PlayerId) -> bool {
        self.player(player_id).is_some()
    }

    /// A game is in progress between start and end; an ended game stays in
    /// `current_game` but no longer accepts game operations.
    pub fn game_in_progress(&self) -> bool {
        self.current_game.is_some() && !self.game_ended
    }

    pub fn all_players_finished(&self) -> bool {
        !self.players.is_empty()
            && self
                .players
                .iter()
                .all(|p| self.finished_solving.contains(&p.id))
    }

    pub fn all_players_ready(&self) -> bool {
        !self.players.is_empty()
            && self
                .players
                .iter()
                .all(|p| self.ready_for_next.contains(&p.id))
    }

    /// Remove a departing player from every per-room set in one pass.
    pub fn scrub_player(&mut self, player_id: PlayerId) {
        self.finished_solving.retain(|id| *id != player_id);
        self.ready_for_next.retain(|id| *id != player_id);
        self.solutions.remove(&player_id);
    }

    /// Repair fields a pre-existing snapshot may lack.
    pub fn backfill_after_load(&mut self) {
        if self.last_activity_at == epoch() {
            self.last_activity_at = self.created_at;
        }
    }
}
