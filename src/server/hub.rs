//! Per-room event fan-out.
//!
//! Each push connection holds one subscription with a bounded outbox. Frames
//! are serialized once per broadcast and shared; a subscriber whose outbox is
//! full is closed and removed rather than allowed to stall the room.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use smallvec::SmallVec;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::protocol::Event;
use crate::stats::ServerStats;

/// Broadcasts queued per subscriber before it counts as too slow.
pub const SUBSCRIBER_OUTBOX_SIZE: usize = 64;

/// Subscribers stack-allocated per room for typical room sizes.
const TYPICAL_ROOM_SUBSCRIBERS: usize = 8;

/// A delivery-ready frame: the event plus its JSON encoding, serialized once
/// per broadcast and cheap to clone.
#[derive(Debug, Clone)]
pub struct PushFrame {
    pub event: Arc<Event>,
    pub json: Bytes,
}

/// One push-channel subscription. Dropping the receiver (or being dropped for
/// slowness) ends the subscription.
pub struct Subscription {
    pub id: Uuid,
    pub room_id: String,
    pub receiver: mpsc::Receiver<PushFrame>,
}

struct Subscriber {
    id: Uuid,
    sender: mpsc::Sender<PushFrame>,
}

pub struct EventHub {
    rooms: DashMap<String, SmallVec<[Subscriber; TYPICAL_ROOM_SUBSCRIBERS]>>,
    stats: Arc<ServerStats>,
}

impl EventHub {
    pub fn new(stats: Arc<ServerStats>) -> Self {
        Self {
            rooms: DashMap::new(),
            stats,
        }
    }

    pub fn subscribe(&self, room_id: &str) -> Subscription {
        let room_key = room_id.to_ascii_uppercase();
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_OUTBOX_SIZE);
        let id = Uuid::new_v4();

        self.rooms
            .entry(room_key.clone())
            .or_default()
            .push(Subscriber { id, sender });

        tracing::debug!(room_id = %room_key, subscription_id = %id, "Subscriber attached");
        Subscription {
            id,
            room_id: room_key,
            receiver,
        }
    }

    pub fn unsubscribe(&self, room_id: &str, subscription_id: Uuid) {
        let room_key = room_id.to_ascii_uppercase();
        let emptied = match self.rooms.get_mut(&room_key) {
            Some(mut subscribers) => {
                subscribers.retain(|s| s.id != subscription_id);
                subscribers.is_empty()
            }
            None => return,
        };
        if emptied {
            self.rooms
                .remove_if(&room_key, |_, subscribers| subscribers.is_empty());
        }
    }

    /// Deliver `event` to every subscriber of its room. Best-effort: slow or
    /// broken subscribers are dropped, the broadcast itself never fails.
    pub fn broadcast(&self, event: Event) {
        let room_key = event.room_id().to_ascii_uppercase();
        let json = match serde_json::to_vec(&event) {
            Ok(encoded) => Bytes::from(encoded),
            Err(err) => {
                tracing::error!(room_id = %room_key, error = %err, "Failed to encode event");
                return;
            }
        };
        let frame = PushFrame {
            event: Arc::new(event),
            json,
        };

        let Some(mut subscribers) = self.rooms.get_mut(&room_key) else {
            return;
        };

        let before = subscribers.len();
        subscribers.retain(|subscriber| match subscriber.sender.try_send(frame.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    room_id = %room_key,
                    subscription_id = %subscriber.id,
                    "Dropping slow subscriber"
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        });
        let dropped = before - subscribers.len();
        drop(subscribers);

        self.stats.increment_events_broadcast();
        if dropped > 0 {
            self.stats.add_subscribers_dropped(dropped as u64);
        }
    }

    pub fn subscriber_count(&self, room_id: &str) -> usize {
        self.rooms
            .get(&room_id.to_ascii_uppercase())
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }

    /// Drop every subscriber of a room; their receivers end immediately.
    pub fn close_room(&self, room_id: &str) {
        self.rooms.remove(&room_id.to_ascii_uppercase());
    }

    /// Drop everything. Used on shutdown.
    pub fn close_all(&self) {
        self.rooms.clear();
    }
}
