//! Named timers for disconnect grace periods.
//!
//! One timer per player id; starting a timer replaces any pending one. Fired
//! callbacks run on background tasks and must take locks fresh — the manager
//! never holds its own lock while a callback runs, so callbacks are free to
//! re-enter the facade.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::protocol::PlayerId;

struct TimerEntry {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct TimerManager {
    timers: Arc<Mutex<HashMap<PlayerId, TimerEntry>>>,
    next_generation: std::sync::atomic::AtomicU64,
}

impl TimerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `callback` after `duration`, cancelling any timer already
    /// pending for this player.
    pub async fn start<F>(&self, player_id: PlayerId, duration: Duration, callback: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self
            .next_generation
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        let mut timers = self.timers.lock().await;

        let registry = self.timers.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;

            // Deregister before running the callback so a concurrent cancel
            // cannot abort a callback that already entered the facade. The
            // generation check keeps a newer timer for the same id alive.
            let mut timers = registry.lock().await;
            let is_current = timers
                .get(&player_id)
                .is_some_and(|entry| entry.generation == generation);
            if !is_current {
                return;
            }
            timers.remove(&player_id);
            drop(timers);

            callback.await;
        });

        if let Some(previous) = timers.insert(player_id, TimerEntry { generation, handle }) {
            previous.handle.abort();
        }
    }

    /// Stop and forget the timer for this player, if any.
    pub async fn cancel(&self, player_id: PlayerId) {
        let mut timers = self.timers.lock().await;
        if let Some(entry) = timers.remove(&player_id) {
            entry.handle.abort();
        }
    }

    pub async fn has_timer(&self, player_id: PlayerId) -> bool {
        self.timers.lock().await.contains_key(&player_id)
    }

    pub async fn active_count(&self) -> usize {
        self.timers.lock().await.len()
    }

    /// Drain everything. Used on shutdown.
    pub async fn stop_all(&self) {
        let mut timers = self.timers.lock().await;
        for (_, entry) in timers.drain() {
            entry.handle.abort();
        }
    }
}
