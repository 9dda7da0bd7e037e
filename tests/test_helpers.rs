use std::sync::Arc;
use std::time::Duration;

use slidebot_server::game::Move;
use slidebot_server::protocol::{Event, PlayerId};
use slidebot_server::room::Room;
use slidebot_server::server::hub::Subscription;
use slidebot_server::server::{GameServer, ServerConfig};

/// Short grace period so disconnect-removal paths run quickly in tests.
#[allow(dead_code)]
pub const GRACE: Duration = Duration::from_millis(100);

/// Create a test server with a short disconnect grace period.
#[allow(dead_code)]
pub fn create_test_server() -> Arc<GameServer> {
    GameServer::new(ServerConfig {
        disconnect_grace_period: GRACE,
        ..ServerConfig::default()
    })
}

/// The reference seven-move solution on the fixed board.
#[allow(dead_code)]
pub fn seven_move_solution() -> Vec<Move> {
    vec![
        Move::new(1, 0, 12),
        Move::new(0, 5, 0),
        Move::new(0, 2, 0),
        Move::new(0, 2, 15),
        Move::new(0, 0, 15),
        Move::new(0, 0, 13),
        Move::new(0, 5, 13),
    ]
}

/// A five-move improvement on the same board.
#[allow(dead_code)]
pub fn five_move_solution() -> Vec<Move> {
    vec![
        Move::new(0, 5, 0),
        Move::new(0, 2, 0),
        Move::new(0, 2, 15),
        Move::new(0, 5, 15),
        Move::new(0, 5, 13),
    ]
}

#[allow(dead_code)]
pub fn player_id(room: &Room, name: &str) -> PlayerId {
    room.players
        .iter()
        .find(|p| p.name == name)
        .unwrap_or_else(|| panic!("player {name} not in room"))
        .id
}

/// Receive the next pushed event, with a timeout so a missing broadcast fails
/// the test instead of hanging it.
#[allow(dead_code)]
pub async fn next_event(subscription: &mut Subscription) -> Event {
    let frame = tokio::time::timeout(Duration::from_secs(2), subscription.receiver.recv())
        .await
        .expect("timed out waiting for event")
        .expect("subscription closed");
    (*frame.event).clone()
}
