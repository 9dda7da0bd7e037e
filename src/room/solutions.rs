//! Solution manager: submit with better-replaces semantics, retract with
//! restore from history, winner selection.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::errors::ServiceError;
use crate::game::Move;
use crate::protocol::{Event, PlayerId, PlayerSolution, SolutionAttempt};

use super::signal::Signal;
use super::state::Room;

/// Verify and record a solution.
///
/// The per-player history keeps the FIRST timestamp for every distinct move
/// count. The current best is replaced only by a strictly lower move count;
/// resubmitting an equal or worse count returns the existing best unchanged
/// and broadcasts nothing (leaderboard stability).
pub fn submit_solution(
    room: &mut Room,
    player_id: PlayerId,
    moves: &[Move],
    now: DateTime<Utc>,
) -> Result<(PlayerSolution, Vec<Signal>), ServiceError> {
    if !room.game_in_progress() {
        return Err(ServiceError::no_game_in_progress());
    }
    if !room.contains_player(player_id) {
        return Err(ServiceError::unknown_player());
    }
    if moves.is_empty() {
        return Err(ServiceError::InvalidArgument(
            "Solution contains no moves".to_string(),
        ));
    }
    if let Some(game) = room.current_game.as_ref() {
        game.verify_solution(moves)?;
    }

    room.touch(now);

    let move_count = moves.len();
    let history = room.solution_history.entry(player_id).or_default();
    if !history.iter().any(|attempt| attempt.move_count == move_count) {
        history.push(SolutionAttempt {
            move_count,
            solved_at: now,
            moves: moves.to_vec(),
        });
    }

    if let Some(existing) = room.solutions.get(&player_id) {
        if existing.move_count() <= move_count {
            return Ok((existing.clone(), Vec::new()));
        }
    }

    let solution = PlayerSolution {
        player_id,
        solved_at: now,
        moves: moves.to_vec(),
    };
    room.solutions.insert(player_id, solution.clone());

    let signals = vec![Signal::Broadcast(Event::PlayerSolved {
        room_id: room.id.clone(),
        player_id,
        move_count,
    })];
    Ok((solution, signals))
}

/// Drop the current best and restore the next-best attempt from history, with
/// its original timestamp. With no history left, the player has no solution
/// any more.
pub fn retract_solution(
    room: &mut Room,
    player_id: PlayerId,
    now: DateTime<Utc>,
) -> Result<Vec<Signal>, ServiceError> {
    if !room.game_in_progress() {
        return Err(ServiceError::no_game_in_progress());
    }
    let Some(current) = room.solutions.get(&player_id) else {
        return Err(ServiceError::InvalidState(
            "No solution to retract".to_string(),
        ));
    };
    let retracted_count = current.move_count();

    room.touch(now);

    let history = room.solution_history.entry(player_id).or_default();
    history.retain(|attempt| attempt.move_count != retracted_count);

    let restored = history
        .iter()
        .min_by_key(|attempt| attempt.move_count)
        .cloned();

    match restored {
        Some(attempt) => {
            room.solutions.insert(
                player_id,
                PlayerSolution {
                    player_id,
                    solved_at: attempt.solved_at,
                    moves: attempt.moves.clone(),
                },
            );
            Ok(vec![Signal::Broadcast(Event::PlayerSolved {
                room_id: room.id.clone(),
                player_id,
                move_count: attempt.move_count,
            })])
        }
        None => {
            room.solutions.remove(&player_id);
            Ok(vec![Signal::Broadcast(Event::SolutionRetracted {
                room_id: room.id.clone(),
                player_id,
            })])
        }
    }
}

/// The winning solution: lowest move count, ties broken by earliest
/// `solved_at`. `None` when nobody solved.
pub fn winning_solution(
    solutions: &HashMap<PlayerId, PlayerSolution>,
) -> Option<&PlayerSolution> {
    solutions
        .values()
        .min_by_key(|solution| (solution.move_count(), solution.solved_at))
}
