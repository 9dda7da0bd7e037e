use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::protocol::room_codes;

use super::state::Room;

/// Shared handle to one room. Locking the inner mutex is the `GetWithLock`
/// of the design; dropping the guard is the unlock.
pub type RoomHandle = Arc<Mutex<Room>>;

/// Thread-safe owner of all rooms.
///
/// Two-lock strategy: the registry lock protects the `id -> room` map; every
/// room carries its own mutex for fine-grained mutation. Lock order is
/// registry before room, and the registry lock is never held while a room
/// lock is taken.
#[derive(Default)]
pub struct RoomRepository {
    rooms: RwLock<HashMap<String, RoomHandle>>,
}

impl RoomRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room under a freshly generated id, retrying on the rare code
    /// collision.
    pub async fn create(&self, now: DateTime<Utc>) -> (String, RoomHandle) {
        let mut rooms = self.rooms.write().await;
        loop {
            let id = room_codes::generate_room_code();
            if rooms.contains_key(&id) {
                continue;
            }
            let handle: RoomHandle = Arc::new(Mutex::new(Room::new(id.clone(), now)));
            rooms.insert(id.clone(), handle.clone());
            return (id, handle);
        }
    }

    /// Case-insensitive lookup.
    pub async fn get(&self, room_id: &str) -> Option<RoomHandle> {
        let id = room_id.to_ascii_uppercase();
        self.rooms.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, room_id: &str) -> Option<RoomHandle> {
        let id = room_id.to_ascii_uppercase();
        self.rooms.write().await.remove(&id)
    }

    /// Install a loaded room set, with fresh per-room mutexes, atomically.
    pub async fn replace(&self, rooms: HashMap<String, Room>) {
        let installed = rooms
            .into_iter()
            .map(|(id, room)| {
                let id = id.to_ascii_uppercase();
                (id, Arc::new(Mutex::new(room)) as RoomHandle)
            })
            .collect();
        *self.rooms.write().await = installed;
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    /// Clone every room for snapshotting. Handles are collected under the
    /// registry lock, then each room is locked briefly one at a time.
    pub async fn snapshot(&self) -> HashMap<String, Room> {
        let handles: Vec<(String, RoomHandle)> = {
            let rooms = self.rooms.read().await;
            rooms
                .iter()
                .map(|(id, handle)| (id.clone(), handle.clone()))
                .collect()
        };

        let mut out = HashMap::with_capacity(handles.len());
        for (id, handle) in handles {
            let room = handle.lock().await;
            out.insert(id, room.clone());
        }
        out
    }

    /// Ids of rooms whose last activity is older than `max_age`.
    pub async fn stale_room_ids(&self, max_age: Duration, now: DateTime<Utc>) -> Vec<String> {
        let handles: Vec<(String, RoomHandle)> = {
            let rooms = self.rooms.read().await;
            rooms
                .iter()
                .map(|(id, handle)| (id.clone(), handle.clone()))
                .collect()
        };

        let mut stale = Vec::new();
        for (id, handle) in handles {
            let room = handle.lock().await;
            if now - room.last_activity_at > max_age {
                stale.push(id);
            }
        }
        stale
    }
}
