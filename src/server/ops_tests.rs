//! Facade-level tests: each public operation end to end, including the
//! cascade and broadcast-ordering cases.

use std::sync::Arc;
use std::time::Duration;

use crate::errors::ServiceError;
use crate::game::fixtures::{five_move_solution, seven_move_solution};
use crate::game::Move;
use crate::protocol::{Event, PlayerId};
use crate::room::Room;

use super::hub::Subscription;
use super::{GameServer, ServerConfig};

const GRACE: Duration = Duration::from_millis(100);

fn test_server() -> Arc<GameServer> {
    GameServer::new(ServerConfig {
        disconnect_grace_period: GRACE,
        ..ServerConfig::default()
    })
}

async fn next_event(subscription: &mut Subscription) -> Event {
    let frame = tokio::time::timeout(Duration::from_secs(2), subscription.receiver.recv())
        .await
        .expect("timed out waiting for event")
        .expect("subscription closed");
    (*frame.event).clone()
}

fn player_id(room: &Room, name: &str) -> PlayerId {
    room.players
        .iter()
        .find(|p| p.name == name)
        .expect("player")
        .id
}

#[tokio::test]
async fn test_scenario_fixed_board_solve() {
    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");
    let mut subscription = server.subscribe(&room.id).await.expect("subscribe");

    server.start_game(&room.id, true).await.expect("start");
    assert_eq!(
        next_event(&mut subscription).await,
        Event::GameStarted {
            room_id: room.id.clone()
        }
    );

    let solution = server
        .submit_solution(&room.id, alice, &seven_move_solution())
        .await
        .expect("submit");
    assert_eq!(solution.move_count(), 7);

    assert_eq!(
        next_event(&mut subscription).await,
        Event::PlayerSolved {
            room_id: room.id.clone(),
            player_id: alice,
            move_count: 7,
        }
    );
}

#[tokio::test]
async fn test_scenario_invalid_solution_changes_nothing() {
    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");
    server.start_game(&room.id, true).await.expect("start");
    let mut subscription = server.subscribe(&room.id).await.expect("subscribe");

    // Robot 0 already rests at (5, 6); this is not a slide.
    let err = server
        .submit_solution(&room.id, alice, &[Move::new(0, 5, 6)])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidSolution(_)));

    let room = server.get_room(&room.id).await.expect("get");
    assert!(room.solutions.is_empty());
    assert!(subscription.receiver.try_recv().is_err(), "no broadcast");
    assert_eq!(server.stats().view().solutions_rejected, 1);
}

#[tokio::test]
async fn test_scenario_better_solution_replaces() {
    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");
    server.start_game(&room.id, true).await.expect("start");
    let mut subscription = server.subscribe(&room.id).await.expect("subscribe");

    server
        .submit_solution(&room.id, alice, &seven_move_solution())
        .await
        .expect("first");
    let improved = server
        .submit_solution(&room.id, alice, &five_move_solution())
        .await
        .expect("second");
    assert_eq!(improved.move_count(), 5);

    match next_event(&mut subscription).await {
        Event::PlayerSolved { move_count, .. } => assert_eq!(move_count, 7),
        other => panic!("unexpected event: {other:?}"),
    }
    match next_event(&mut subscription).await {
        Event::PlayerSolved { move_count, .. } => assert_eq!(move_count, 5),
        other => panic!("unexpected event: {other:?}"),
    }

    let room = server.get_room(&room.id).await.expect("get");
    assert_eq!(room.solutions[&alice].move_count(), 5);
}

#[tokio::test]
async fn test_scenario_retraction_restores_previous_best() {
    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");
    server.start_game(&room.id, true).await.expect("start");

    let original = server
        .submit_solution(&room.id, alice, &seven_move_solution())
        .await
        .expect("first");
    server
        .submit_solution(&room.id, alice, &five_move_solution())
        .await
        .expect("second");

    let mut subscription = server.subscribe(&room.id).await.expect("subscribe");
    server
        .retract_solution(&room.id, alice)
        .await
        .expect("retract");

    assert_eq!(
        next_event(&mut subscription).await,
        Event::PlayerSolved {
            room_id: room.id.clone(),
            player_id: alice,
            move_count: 7,
        }
    );

    let room = server.get_room(&room.id).await.expect("get");
    let restored = &room.solutions[&alice];
    assert_eq!(restored.move_count(), 7);
    assert_eq!(restored.solved_at, original.solved_at, "original timestamp");
    assert_eq!(restored.moves, original.moves);
}

#[tokio::test]
async fn test_retracting_only_solution_clears_it() {
    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");
    server.start_game(&room.id, true).await.expect("start");
    server
        .submit_solution(&room.id, alice, &seven_move_solution())
        .await
        .expect("submit");

    let mut subscription = server.subscribe(&room.id).await.expect("subscribe");
    server
        .retract_solution(&room.id, alice)
        .await
        .expect("retract");

    assert_eq!(
        next_event(&mut subscription).await,
        Event::SolutionRetracted {
            room_id: room.id.clone(),
            player_id: alice,
        }
    );
    let room = server.get_room(&room.id).await.expect("get");
    assert!(room.solutions.is_empty());
}

#[tokio::test]
async fn test_scenario_end_game_by_voting() {
    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");
    let room = server.join_room(&room.id, "Bob").await.expect("join");
    let bob = player_id(&room, "Bob");
    server.start_game(&room.id, true).await.expect("start");

    server
        .submit_solution(&room.id, alice, &seven_move_solution())
        .await
        .expect("alice");
    server
        .submit_solution(&room.id, bob, &five_move_solution())
        .await
        .expect("bob");

    let mut subscription = server.subscribe(&room.id).await.expect("subscribe");
    server
        .mark_finished_solving(&room.id, alice)
        .await
        .expect("alice finished");
    assert_eq!(
        next_event(&mut subscription).await,
        Event::PlayerFinishedSolving {
            room_id: room.id.clone(),
            player_id: alice,
        }
    );

    server
        .mark_finished_solving(&room.id, bob)
        .await
        .expect("bob finished");
    assert_eq!(
        next_event(&mut subscription).await,
        Event::PlayerFinishedSolving {
            room_id: room.id.clone(),
            player_id: bob,
        }
    );

    // Bob's five-move solution wins.
    match next_event(&mut subscription).await {
        Event::GameEnded {
            winner_id,
            winner_name,
            moves,
            ..
        } => {
            assert_eq!(winner_id, Some(bob));
            assert_eq!(winner_name.as_deref(), Some("Bob"));
            assert_eq!(moves, five_move_solution());
        }
        other => panic!("unexpected event: {other:?}"),
    }

    let room = server.get_room(&room.id).await.expect("get");
    assert_eq!(room.wins.get(&bob), Some(&1));
    assert!(!room.wins.contains_key(&alice));
    assert_eq!(room.games_played, 1);
    assert!(room.game_ended);
    assert!(room.current_game.is_some(), "ended game stays visible");

    // Finishing again after the end is rejected, and the game never ends
    // twice.
    let err = server
        .mark_finished_solving(&room.id, alice)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    assert_eq!(server.stats().view().games_ended, 1);
}

#[tokio::test]
async fn test_scenario_disconnect_removes_last_blocker() {
    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");
    let room = server.join_room(&room.id, "Bob").await.expect("join");
    let bob = player_id(&room, "Bob");
    server.start_game(&room.id, true).await.expect("start");

    server
        .submit_solution(&room.id, alice, &seven_move_solution())
        .await
        .expect("alice");
    server
        .mark_finished_solving(&room.id, alice)
        .await
        .expect("alice finished");

    let mut subscription = server.subscribe(&room.id).await.expect("subscribe");

    // Bob's push channel drops and the grace period expires.
    server
        .disconnect_player(&room.id, bob)
        .await
        .expect("disconnect");
    assert!(server.has_disconnect_timer(bob).await);
    tokio::time::sleep(GRACE * 3).await;

    // player_left strictly before game_ended.
    assert_eq!(
        next_event(&mut subscription).await,
        Event::PlayerLeft {
            room_id: room.id.clone(),
            player_id: bob,
        }
    );
    match next_event(&mut subscription).await {
        Event::GameEnded { winner_id, .. } => assert_eq!(winner_id, Some(alice)),
        other => panic!("unexpected event: {other:?}"),
    }

    let room = server.get_room(&room.id).await.expect("get");
    assert_eq!(room.players.len(), 1);
    assert_eq!(room.wins.get(&alice), Some(&1));
    assert!(!server.has_disconnect_timer(bob).await);
}

#[tokio::test]
async fn test_reconnect_within_grace_keeps_player() {
    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");

    server
        .disconnect_player(&room.id, alice)
        .await
        .expect("disconnect");
    assert!(server.has_disconnect_timer(alice).await);

    server
        .reconnect_player(&room.id, alice)
        .await
        .expect("reconnect");
    assert!(!server.has_disconnect_timer(alice).await);

    tokio::time::sleep(GRACE * 3).await;
    let room = server.get_room(&room.id).await.expect("get");
    assert_eq!(room.players.len(), 1);
    assert!(room.players[0].is_connected());
}

#[tokio::test]
async fn test_reconnect_is_idempotent_and_checks_identity() {
    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");
    let mut subscription = server.subscribe(&room.id).await.expect("subscribe");

    // Already connected: no-op, no broadcast.
    server
        .reconnect_player(&room.id, alice)
        .await
        .expect("reconnect");
    assert!(subscription.receiver.try_recv().is_err());

    // Unknown player id: NotFound.
    let err = server
        .reconnect_player(&room.id, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_case_insensitive_room_lookup() {
    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");

    let lower = server
        .get_room(&room.id.to_ascii_lowercase())
        .await
        .expect("lower");
    let upper = server.get_room(&room.id).await.expect("upper");
    assert_eq!(lower.id, upper.id);
}

#[tokio::test]
async fn test_unknown_room_is_not_found() {
    let server = test_server();
    let err = server.get_room("ZZZZ").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = server.join_room("ZZZZ", "Alice").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_all_ready_starts_continuation_game() {
    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");
    let room = server.join_room(&room.id, "Bob").await.expect("join");
    let bob = player_id(&room, "Bob");
    server.start_game(&room.id, true).await.expect("start");

    server
        .submit_solution(&room.id, alice, &five_move_solution())
        .await
        .expect("submit");
    server
        .mark_finished_solving(&room.id, alice)
        .await
        .expect("finish");
    server
        .mark_finished_solving(&room.id, bob)
        .await
        .expect("finish");

    let mut subscription = server.subscribe(&room.id).await.expect("subscribe");
    server
        .mark_ready_for_next(&room.id, alice)
        .await
        .expect("ready");
    server
        .mark_ready_for_next(&room.id, bob)
        .await
        .expect("ready");

    // ready(alice), ready(bob), then the next game starts.
    assert_eq!(
        next_event(&mut subscription).await,
        Event::PlayerReadyForNext {
            room_id: room.id.clone(),
            player_id: alice,
        }
    );
    assert_eq!(
        next_event(&mut subscription).await,
        Event::PlayerReadyForNext {
            room_id: room.id.clone(),
            player_id: bob,
        }
    );
    assert_eq!(
        next_event(&mut subscription).await,
        Event::GameStarted {
            room_id: room.id.clone()
        }
    );

    let room = server.get_room(&room.id).await.expect("get");
    assert!(room.game_in_progress());
    assert!(room.solutions.is_empty());
    assert!(room.finished_solving.is_empty());
    assert!(room.ready_for_next.is_empty());
    // Continuation from the winner's final state: robot 0 on the old target.
    let game = room.current_game.as_ref().expect("game");
    assert_eq!(
        game.robots.get(&0),
        Some(&crate::game::Position::new(5, 13))
    );
}

#[tokio::test]
async fn test_snapshot_round_trip_preserves_room_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rooms.json");

    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");
    server.start_game(&room.id, true).await.expect("start");
    server
        .submit_solution(&room.id, alice, &seven_move_solution())
        .await
        .expect("submit");
    server.save_snapshot(&path).await.expect("save");

    let restored = test_server();
    let loaded = restored.load_snapshot(&path).await.expect("load");
    assert_eq!(loaded, 1);

    let original = server.get_room(&room.id).await.expect("original");
    let recovered = restored.get_room(&room.id).await.expect("recovered");
    assert_eq!(recovered.players, original.players);
    assert_eq!(recovered.solutions, original.solutions);
    assert_eq!(recovered.wins, original.wins);
    assert_eq!(recovered.games_played, original.games_played);
    assert_eq!(recovered.current_game, original.current_game);
}

#[tokio::test]
async fn test_load_rearms_disconnect_timers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rooms.json");

    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");
    let room = server.join_room(&room.id, "Bob").await.expect("join");
    let bob = player_id(&room, "Bob");
    server
        .disconnect_player(&room.id, bob)
        .await
        .expect("disconnect");
    server.save_snapshot(&path).await.expect("save");

    // A fresh process: timers are gone, the snapshot brings them back.
    let restored = test_server();
    restored.load_snapshot(&path).await.expect("load");
    assert!(restored.has_disconnect_timer(bob).await);

    tokio::time::sleep(GRACE * 3).await;
    let recovered = restored.get_room(&room.id).await.expect("room");
    assert_eq!(recovered.players.len(), 1, "Bob was removed after the grace");
    assert_eq!(recovered.players[0].name, "Alice");
}

#[tokio::test]
async fn test_create_room_rejects_invalid_name_without_creating() {
    let server = test_server();
    let err = server.create_room("  ").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
    assert_eq!(server.room_count().await, 0);
}

#[tokio::test]
async fn test_delete_room_closes_subscriptions() {
    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");
    let mut subscription = server.subscribe(&room.id).await.expect("subscribe");

    server.delete_room(&room.id).await;

    assert!(server.get_room(&room.id).await.is_err());
    assert!(subscription.receiver.recv().await.is_none());
}

#[tokio::test]
async fn test_room_ids_are_unique_across_creates() {
    let server = test_server();
    let mut ids = std::collections::HashSet::new();
    for _ in 0..30 {
        let room = server.create_room("Alice").await.expect("create");
        assert!(ids.insert(room.id.clone()), "duplicate id {}", room.id);
    }
}

#[tokio::test]
async fn test_start_game_requires_existing_room() {
    let server = test_server();
    let err = server.start_game("QQQQ", true).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_shutdown_saves_and_drains() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rooms.json");

    let server = test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");
    let mut subscription = server.subscribe(&room.id).await.expect("subscribe");
    server
        .disconnect_player(&room.id, alice)
        .await
        .expect("disconnect");

    server.shutdown(&path).await;

    assert!(path.exists());
    assert!(!server.has_disconnect_timer(alice).await);
    // Pending frames may still be buffered; after draining them the channel
    // is closed.
    while subscription.receiver.try_recv().is_ok() {}
    assert!(subscription.receiver.recv().await.is_none());
}
