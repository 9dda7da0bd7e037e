//! Game lifecycle manager: start/next-game, finished/ready votes, end-game.

use chrono::{DateTime, Utc};

use crate::errors::ServiceError;
use crate::game::Game;
use crate::protocol::{Event, PlayerId};

use super::signal::Signal;
use super::solutions::winning_solution;
use super::state::Room;

/// Start a game. A still-running previous game with solutions is concluded
/// implicitly: the winner is credited, `games_played` increments, and the new
/// game continues from the winner's final robot positions. No `game_ended`
/// event is broadcast on this path; clients only see `game_started`.
pub fn start_game(room: &mut Room, use_fixed_board: bool, now: DateTime<Utc>) -> Vec<Signal> {
    let mut winner_final_state = None;

    if let Some(previous) = room.current_game.as_ref() {
        if let Some(winner) = winning_solution(&room.solutions) {
            winner_final_state = previous
                .verify_solution(&winner.moves)
                .ok()
                .map(|end| end.robots);

            // An ended game was already credited by end_game.
            if !room.game_ended {
                let winner_id = winner.player_id;
                *room.wins.entry(winner_id).or_insert(0) += 1;
                room.games_played += 1;
            }
        }
    }

    let next = if use_fixed_board {
        Game::fixed()
    } else if let Some(previous) = room.current_game.as_ref() {
        previous.continuation(winner_final_state.as_ref())
    } else {
        Game::random()
    };

    install_game(room, next, now);
    vec![Signal::Broadcast(Event::GameStarted {
        room_id: room.id.clone(),
    })]
}

/// A player declares they will submit no more solutions this game. Once every
/// player has finished, the facade is asked to end the game.
pub fn mark_finished_solving(
    room: &mut Room,
    player_id: PlayerId,
    _now: DateTime<Utc>,
) -> Result<Vec<Signal>, ServiceError> {
    if !room.game_in_progress() {
        return Err(ServiceError::no_game_in_progress());
    }
    if !room.contains_player(player_id) {
        return Err(ServiceError::unknown_player());
    }
    if room.finished_solving.contains(&player_id) {
        return Ok(Vec::new());
    }

    room.finished_solving.push(player_id);

    let mut signals = vec![Signal::Broadcast(Event::PlayerFinishedSolving {
        room_id: room.id.clone(),
        player_id,
    })];
    if room.all_players_finished() {
        signals.push(Signal::EndGame);
    }
    Ok(signals)
}

/// A player declares readiness for the next game. Legal with no game in
/// progress (this is the normal post-end flow). Once every player is ready,
/// the facade is asked to start the next game.
pub fn mark_ready_for_next(
    room: &mut Room,
    player_id: PlayerId,
    _now: DateTime<Utc>,
) -> Result<Vec<Signal>, ServiceError> {
    if !room.contains_player(player_id) {
        return Err(ServiceError::unknown_player());
    }
    if room.ready_for_next.contains(&player_id) {
        return Ok(Vec::new());
    }

    room.ready_for_next.push(player_id);

    let mut signals = vec![Signal::Broadcast(Event::PlayerReadyForNext {
        room_id: room.id.clone(),
        player_id,
    })];
    if room.all_players_ready() {
        signals.push(Signal::StartNextGame);
    }
    Ok(signals)
}

/// Conclude the current game: credit the winner, count the game, broadcast
/// `game_ended` (with empty winner fields when nobody solved). The game stays
/// in `current_game` so clients can keep replaying it until the next start.
/// A second call for the same game is a no-op, keeping the broadcast
/// exactly-once.
pub fn end_game(room: &mut Room) -> Vec<Signal> {
    if !room.game_in_progress() {
        return Vec::new();
    }

    let winner = winning_solution(&room.solutions).cloned();
    if let Some(solution) = &winner {
        *room.wins.entry(solution.player_id).or_insert(0) += 1;
    }
    room.games_played += 1;
    room.game_ended = true;

    let (winner_id, winner_name, moves) = match &winner {
        Some(solution) => (
            Some(solution.player_id),
            room.player(solution.player_id).map(|p| p.name.clone()),
            solution.moves.clone(),
        ),
        None => (None, None, Vec::new()),
    };

    vec![Signal::Broadcast(Event::GameEnded {
        room_id: room.id.clone(),
        winner_id,
        winner_name,
        moves,
    })]
}

/// Start the continuation game after an `end_game`. Wins were already
/// recorded there, so nothing is credited here.
pub fn start_next_game(room: &mut Room, now: DateTime<Utc>) -> Vec<Signal> {
    let next = match room.current_game.as_ref() {
        Some(previous) => {
            let winner_final_state = winning_solution(&room.solutions)
                .and_then(|winner| previous.verify_solution(&winner.moves).ok())
                .map(|end| end.robots);
            previous.continuation(winner_final_state.as_ref())
        }
        None => Game::random(),
    };

    install_game(room, next, now);
    vec![Signal::Broadcast(Event::GameStarted {
        room_id: room.id.clone(),
    })]
}

/// Reset all game-scoped state and install the new game.
fn install_game(room: &mut Room, game: Game, now: DateTime<Utc>) {
    room.solutions.clear();
    room.solution_history.clear();
    room.finished_solving.clear();
    room.ready_for_next.clear();
    room.game_ended = false;
    room.current_game = Some(game);
    room.game_started_at = Some(now);
    room.touch(now);
}
