//! Player manager: pure functions over a locked room.
//!
//! No I/O, no timers, no broadcasts here; every side effect is returned as a
//! [`Signal`] for the facade to interpret.

use chrono::{DateTime, Utc};

use crate::errors::ServiceError;
use crate::protocol::{validation, Event, Player, PlayerId, PlayerStatus};

use super::signal::Signal;
use super::state::Room;

/// Append a new player with a fresh opaque id.
pub fn add_player(
    room: &mut Room,
    name: &str,
    now: DateTime<Utc>,
) -> Result<(Player, Vec<Signal>), ServiceError> {
    validation::validate_player_name(name).map_err(ServiceError::InvalidArgument)?;

    let player = Player::new(name);
    room.players.push(player.clone());
    room.touch(now);

    let signals = vec![Signal::Broadcast(Event::PlayerJoined {
        room_id: room.id.clone(),
        player_id: player.id,
        player_name: player.name.clone(),
    })];
    Ok((player, signals))
}

/// Mark a player disconnected and request the grace timer. Idempotent: an
/// unknown or already-disconnected player yields no signals and no error.
pub fn disconnect_player(room: &mut Room, player_id: PlayerId, now: DateTime<Utc>) -> Vec<Signal> {
    let Some(player) = room.player_mut(player_id) else {
        return Vec::new();
    };
    if !player.is_connected() {
        return Vec::new();
    }

    player.status = PlayerStatus::Disconnected;
    player.disconnected_at = Some(now);
    vec![Signal::StartDisconnectTimer { player_id }]
}

/// Mark a disconnected player connected again and cancel the grace timer.
/// Reconnecting an already-connected player is a no-op with no signals.
pub fn reconnect_player(
    room: &mut Room,
    player_id: PlayerId,
) -> Result<Vec<Signal>, ServiceError> {
    let Some(player) = room.player_mut(player_id) else {
        return Err(ServiceError::player_not_found());
    };
    if player.is_connected() {
        return Ok(Vec::new());
    }

    player.status = PlayerStatus::Connected;
    player.disconnected_at = None;
    Ok(vec![Signal::CancelDisconnectTimer { player_id }])
}

/// Remove a player whose grace period expired. Removes only players that are
/// currently disconnected, scrubs the per-room sets, and — the key correctness
/// case — unblocks the end of the game (or the next game) when the departing
/// player was the last one holding it up.
pub fn remove_player(room: &mut Room, player_id: PlayerId) -> Vec<Signal> {
    let Some(index) = room.players.iter().position(|p| p.id == player_id) else {
        return Vec::new();
    };
    if room.players[index].is_connected() {
        return Vec::new();
    }

    room.players.remove(index);
    room.scrub_player(player_id);

    let mut signals = vec![
        Signal::CancelDisconnectTimer { player_id },
        Signal::Broadcast(Event::PlayerLeft {
            room_id: room.id.clone(),
            player_id,
        }),
    ];

    if room.game_in_progress() {
        if room.all_players_finished() {
            signals.push(Signal::EndGame);
        }
    } else if room.all_players_ready() {
        signals.push(Signal::StartNextGame);
    }

    signals
}
