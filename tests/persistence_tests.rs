mod test_helpers;

use test_helpers::{
    create_test_server, five_move_solution, next_event, player_id, seven_move_solution, GRACE,
};

use slidebot_server::protocol::Event;

/// Save mid-game, load into a fresh server, and keep playing.
#[tokio::test]
async fn test_session_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rooms.json");

    let server = create_test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");
    let room = server.join_room(&room.id, "Bob").await.expect("join");
    let bob = player_id(&room, "Bob");
    server.start_game(&room.id, true).await.expect("start");
    server
        .submit_solution(&room.id, alice, &seven_move_solution())
        .await
        .expect("submit");
    server.save_snapshot(&path).await.expect("save");

    // "Restart": a fresh server restores the same competitive state.
    let restored = create_test_server();
    assert_eq!(restored.load_snapshot(&path).await.expect("load"), 1);

    let state = restored.get_room(&room.id).await.expect("room");
    assert_eq!(state.players.len(), 2);
    assert!(state.game_in_progress());
    assert_eq!(state.solutions[&alice].move_count(), 7);

    // The game continues where it left off: Bob undercuts Alice, both finish,
    // Bob wins.
    restored
        .submit_solution(&room.id, bob, &five_move_solution())
        .await
        .expect("bob solves");
    restored
        .mark_finished_solving(&room.id, alice)
        .await
        .expect("alice finished");
    restored
        .mark_finished_solving(&room.id, bob)
        .await
        .expect("bob finished");

    let state = restored.get_room(&room.id).await.expect("room");
    assert_eq!(state.wins.get(&bob), Some(&1));
    assert_eq!(state.games_played, 1);
}

/// Disconnected players are persisted as disconnected, and their grace timers
/// come back after a restart.
#[tokio::test]
async fn test_disconnect_grace_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rooms.json");

    let server = create_test_server();
    let room = server.create_room("Alice").await.expect("create");
    let room = server.join_room(&room.id, "Bob").await.expect("join");
    let bob = player_id(&room, "Bob");
    server
        .disconnect_player(&room.id, bob)
        .await
        .expect("disconnect");
    server.save_snapshot(&path).await.expect("save");

    let restored = create_test_server();
    restored.load_snapshot(&path).await.expect("load");
    assert!(restored.has_disconnect_timer(bob).await);

    let mut events = restored.subscribe(&room.id).await.expect("subscribe");
    tokio::time::sleep(GRACE * 3).await;

    assert_eq!(
        next_event(&mut events).await,
        Event::PlayerLeft {
            room_id: room.id.clone(),
            player_id: bob,
        }
    );
    let state = restored.get_room(&room.id).await.expect("room");
    assert_eq!(state.players.len(), 1);
}

/// Reconnecting on the restored server cancels the re-armed timer.
#[tokio::test]
async fn test_reconnect_after_restart_cancels_removal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rooms.json");

    let server = create_test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");
    server
        .disconnect_player(&room.id, alice)
        .await
        .expect("disconnect");
    server.save_snapshot(&path).await.expect("save");

    let restored = create_test_server();
    restored.load_snapshot(&path).await.expect("load");
    restored
        .reconnect_player(&room.id, alice)
        .await
        .expect("reconnect");
    assert!(!restored.has_disconnect_timer(alice).await);

    tokio::time::sleep(GRACE * 3).await;
    let state = restored.get_room(&room.id).await.expect("room");
    assert_eq!(state.players.len(), 1);
    assert!(state.players[0].is_connected());
}

/// An empty data file path simply starts empty.
#[tokio::test]
async fn test_missing_snapshot_starts_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rooms.json");

    let server = create_test_server();
    assert_eq!(server.load_snapshot(&path).await.expect("load"), 0);
    assert_eq!(server.room_count().await, 0);
}

/// Ended games keep their full replay state across restarts.
#[tokio::test]
async fn test_ended_game_is_replayable_after_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rooms.json");

    let server = create_test_server();
    let room = server.create_room("Alice").await.expect("create");
    let alice = player_id(&room, "Alice");
    server.start_game(&room.id, true).await.expect("start");
    server
        .submit_solution(&room.id, alice, &five_move_solution())
        .await
        .expect("submit");
    server
        .mark_finished_solving(&room.id, alice)
        .await
        .expect("finish");
    server.save_snapshot(&path).await.expect("save");

    let restored = create_test_server();
    restored.load_snapshot(&path).await.expect("load");

    let state = restored.get_room(&room.id).await.expect("room");
    assert!(state.game_ended);
    assert!(state.current_game.is_some(), "replayable ended game");
    assert_eq!(state.wins.get(&alice), Some(&1));

    // And the next game can start from the restored winning state.
    restored
        .mark_ready_for_next(&room.id, alice)
        .await
        .expect("ready");
    let state = restored.get_room(&room.id).await.expect("room");
    assert!(state.game_in_progress());
}
