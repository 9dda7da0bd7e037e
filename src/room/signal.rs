use crate::protocol::{Event, PlayerId};

/// A declarative effect returned by a manager and executed by the facade
/// after the room lock is released.
///
/// Managers never touch timers, the repository, or the hub; cascading
/// lifecycle transitions (`EndGame`, `StartNextGame`) are requested here and
/// interpreted by the facade, which re-acquires the room lock.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Push an event to every subscriber of the room.
    Broadcast(Event),
    /// Schedule removal of a disconnected player after the grace period.
    StartDisconnectTimer { player_id: PlayerId },
    /// Cancel a pending removal, if any.
    CancelDisconnectTimer { player_id: PlayerId },
    /// Conclude the current game.
    EndGame,
    /// Start the continuation game.
    StartNextGame,
}
