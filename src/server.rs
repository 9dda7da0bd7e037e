use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;

use crate::errors::ServiceError;
use crate::game::Move;
use crate::persistence;
use crate::protocol::{validation, Event, PlayerId, PlayerSolution};
use crate::room::repository::RoomHandle;
use crate::room::{lifecycle, players, solutions, Room, RoomRepository, Signal};
use crate::stats::ServerStats;

pub mod hub;
pub mod maintenance;
pub mod timers;

#[cfg(test)]
mod ops_tests;

use hub::{EventHub, Subscription};
use timers::TimerManager;

fn chrono_duration_from_std(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::seconds(i64::MAX))
}

/// Facade behavior knobs.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// How long a disconnected player may stay before removal.
    pub disconnect_grace_period: Duration,
    /// Rooms idle longer than this are garbage collected.
    pub room_max_age: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            disconnect_grace_period: Duration::from_secs(30),
            room_max_age: Duration::from_secs(86_400),
        }
    }
}

/// The service facade: the only component that combines the repository, the
/// managers, the timer manager, and the event hub.
///
/// Every public operation follows the same shape: look up the room, take its
/// lock, call exactly one manager, release the lock, then interpret the
/// returned signals. Broadcasts happen strictly after the lock is released;
/// cascade transitions (`EndGame`, `StartNextGame`) re-acquire it.
pub struct GameServer {
    repository: RoomRepository,
    hub: EventHub,
    timers: TimerManager,
    stats: Arc<ServerStats>,
    config: ServerConfig,
    /// Handle to ourselves for timer callbacks; weak to avoid a cycle.
    self_ref: Weak<GameServer>,
}

impl GameServer {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let stats = Arc::new(ServerStats::new());
        Arc::new_cyclic(|self_ref| Self {
            repository: RoomRepository::new(),
            hub: EventHub::new(stats.clone()),
            timers: TimerManager::new(),
            stats,
            config,
            self_ref: self_ref.clone(),
        })
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    async fn room(&self, room_id: &str) -> Result<RoomHandle, ServiceError> {
        self.repository
            .get(room_id)
            .await
            .ok_or_else(|| ServiceError::room_not_found(room_id))
    }

    /// `CreateRoom`: a new room with its first player.
    pub async fn create_room(&self, player_name: &str) -> Result<Room, ServiceError> {
        // Validate before minting a room id so a bad name cannot leave an
        // orphaned empty room behind.
        validation::validate_player_name(player_name).map_err(ServiceError::InvalidArgument)?;

        let now = Utc::now();
        let (room_id, handle) = self.repository.create(now).await;
        let (snapshot, signals) = {
            let mut room = handle.lock().await;
            let (_, signals) = players::add_player(&mut room, player_name, now)?;
            (room.clone(), signals)
        };

        self.stats.increment_rooms_created();
        self.stats.increment_players_joined();
        tracing::info!(room_id = %room_id, player_name, "Room created");

        self.process_signals(&room_id, signals).await;
        Ok(snapshot)
    }

    /// `JoinRoom`.
    pub async fn join_room(&self, room_id: &str, player_name: &str) -> Result<Room, ServiceError> {
        let handle = self.room(room_id).await?;
        let now = Utc::now();
        let (snapshot, signals) = {
            let mut room = handle.lock().await;
            let (player, signals) = players::add_player(&mut room, player_name, now)?;
            tracing::info!(room_id = %room.id, player_id = %player.id, player_name, "Player joined");
            (room.clone(), signals)
        };

        self.stats.increment_players_joined();
        self.process_signals(&snapshot.id, signals).await;
        Ok(snapshot)
    }

    /// `GetRoom`: read-only echo of the room state.
    pub async fn get_room(&self, room_id: &str) -> Result<Room, ServiceError> {
        let handle = self.room(room_id).await?;
        let room = handle.lock().await;
        Ok(room.clone())
    }

    /// `StartGame`.
    pub async fn start_game(
        &self,
        room_id: &str,
        use_fixed_board: bool,
    ) -> Result<Room, ServiceError> {
        let handle = self.room(room_id).await?;
        let (snapshot, signals) = {
            let mut room = handle.lock().await;
            let signals = lifecycle::start_game(&mut room, use_fixed_board, Utc::now());
            (room.clone(), signals)
        };

        self.stats.increment_games_started();
        tracing::info!(room_id = %snapshot.id, use_fixed_board, "Game started");

        self.process_signals(&snapshot.id, signals).await;
        Ok(snapshot)
    }

    /// `SubmitSolution`: returns the stored current best.
    pub async fn submit_solution(
        &self,
        room_id: &str,
        player_id: PlayerId,
        moves: &[Move],
    ) -> Result<PlayerSolution, ServiceError> {
        let handle = self.room(room_id).await?;
        let result = {
            let mut room = handle.lock().await;
            solutions::submit_solution(&mut room, player_id, moves, Utc::now())
                .map(|(solution, signals)| (room.id.clone(), solution, signals))
        };

        match result {
            Ok((room_key, solution, signals)) => {
                self.stats.increment_solutions_accepted();
                tracing::info!(
                    room_id = %room_key,
                    player_id = %player_id,
                    move_count = solution.move_count(),
                    "Solution accepted"
                );
                self.process_signals(&room_key, signals).await;
                Ok(solution)
            }
            Err(err) => {
                if matches!(err, ServiceError::InvalidSolution(_)) {
                    self.stats.increment_solutions_rejected();
                }
                Err(err)
            }
        }
    }

    /// `RetractSolution`.
    pub async fn retract_solution(
        &self,
        room_id: &str,
        player_id: PlayerId,
    ) -> Result<(), ServiceError> {
        let handle = self.room(room_id).await?;
        let (room_key, signals) = {
            let mut room = handle.lock().await;
            let signals = solutions::retract_solution(&mut room, player_id, Utc::now())?;
            (room.id.clone(), signals)
        };

        self.stats.increment_solutions_retracted();
        self.process_signals(&room_key, signals).await;
        Ok(())
    }

    /// `MarkFinishedSolving`.
    pub async fn mark_finished_solving(
        &self,
        room_id: &str,
        player_id: PlayerId,
    ) -> Result<(), ServiceError> {
        let handle = self.room(room_id).await?;
        let (room_key, signals) = {
            let mut room = handle.lock().await;
            let signals = lifecycle::mark_finished_solving(&mut room, player_id, Utc::now())?;
            (room.id.clone(), signals)
        };

        self.process_signals(&room_key, signals).await;
        Ok(())
    }

    /// `MarkReadyForNext`.
    pub async fn mark_ready_for_next(
        &self,
        room_id: &str,
        player_id: PlayerId,
    ) -> Result<(), ServiceError> {
        let handle = self.room(room_id).await?;
        let (room_key, signals) = {
            let mut room = handle.lock().await;
            let signals = lifecycle::mark_ready_for_next(&mut room, player_id, Utc::now())?;
            (room.id.clone(), signals)
        };

        self.process_signals(&room_key, signals).await;
        Ok(())
    }

    /// Push-channel reconnect: cancels the pending grace timer. Reconnecting
    /// an already-connected player is a no-op.
    pub async fn reconnect_player(
        &self,
        room_id: &str,
        player_id: PlayerId,
    ) -> Result<(), ServiceError> {
        let handle = self.room(room_id).await?;
        let (room_key, signals) = {
            let mut room = handle.lock().await;
            let signals = players::reconnect_player(&mut room, player_id)?;
            (room.id.clone(), signals)
        };

        if !signals.is_empty() {
            tracing::info!(room_id = %room_key, player_id = %player_id, "Player reconnected");
        }
        self.process_signals(&room_key, signals).await;
        Ok(())
    }

    /// Push-channel close: marks the player disconnected and arms the grace
    /// timer.
    pub async fn disconnect_player(
        &self,
        room_id: &str,
        player_id: PlayerId,
    ) -> Result<(), ServiceError> {
        let handle = self.room(room_id).await?;
        let (room_key, signals) = {
            let mut room = handle.lock().await;
            let signals = players::disconnect_player(&mut room, player_id, Utc::now());
            (room.id.clone(), signals)
        };

        if !signals.is_empty() {
            tracing::info!(room_id = %room_key, player_id = %player_id, "Player disconnected");
        }
        self.process_signals(&room_key, signals).await;
        Ok(())
    }

    /// Grace-timer callback: removes the player if they are still
    /// disconnected. Takes the room lock fresh; safe to run concurrently with
    /// any room operation.
    pub async fn remove_expired_player(&self, room_id: &str, player_id: PlayerId) {
        let Some(handle) = self.repository.get(room_id).await else {
            return;
        };
        let (room_key, signals) = {
            let mut room = handle.lock().await;
            let signals = players::remove_player(&mut room, player_id);
            (room.id.clone(), signals)
        };

        if !signals.is_empty() {
            self.stats.increment_players_removed();
            tracing::info!(
                room_id = %room_key,
                player_id = %player_id,
                "Player removed after disconnect grace period"
            );
        }
        self.process_signals(&room_key, signals).await;
    }

    /// Attach a push-channel subscription to a room.
    pub async fn subscribe(&self, room_id: &str) -> Result<Subscription, ServiceError> {
        let handle = self.room(room_id).await?;
        let room_key = handle.lock().await.id.clone();
        Ok(self.hub.subscribe(&room_key))
    }

    pub fn unsubscribe(&self, room_id: &str, subscription_id: uuid::Uuid) {
        self.hub.unsubscribe(room_id, subscription_id);
    }

    /// Delete a room and end its subscriptions. Used by stale-room cleanup.
    pub async fn delete_room(&self, room_id: &str) {
        if self.repository.remove(room_id).await.is_some() {
            self.hub.close_room(room_id);
            tracing::info!(room_id = %room_id.to_ascii_uppercase(), "Room deleted");
        }
    }

    /// Observability hooks used by tests and `/v1/stats` consumers.
    pub async fn has_disconnect_timer(&self, player_id: PlayerId) -> bool {
        self.timers.has_timer(player_id).await
    }

    pub fn subscriber_count(&self, room_id: &str) -> usize {
        self.hub.subscriber_count(room_id)
    }

    pub async fn room_count(&self) -> usize {
        self.repository.len().await
    }

    /// Persist all rooms. Timers and subscribers are not part of the snapshot.
    pub async fn save_snapshot(&self, path: &Path) -> anyhow::Result<()> {
        let rooms = self.repository.snapshot().await;
        let count = rooms.len();
        persistence::save_snapshot(path, &rooms).await?;
        self.stats.increment_snapshots_saved();
        tracing::debug!(rooms = count, path = %path.display(), "Snapshot saved");
        Ok(())
    }

    /// Load a snapshot, replacing all in-memory rooms, and re-arm the grace
    /// timer of every player that was disconnected when the snapshot was
    /// taken.
    pub async fn load_snapshot(&self, path: &Path) -> anyhow::Result<usize> {
        let Some(rooms) = persistence::load_snapshot(path).await? else {
            return Ok(0);
        };
        let count = rooms.len();
        self.repository.replace(rooms).await;
        self.rearm_disconnect_timers().await;
        tracing::info!(rooms = count, path = %path.display(), "Snapshot loaded");
        Ok(count)
    }

    async fn rearm_disconnect_timers(&self) {
        let now = Utc::now();
        let rooms = self.repository.snapshot().await;
        for (room_id, room) in rooms {
            for player in &room.players {
                if player.is_connected() {
                    continue;
                }
                let Some(disconnected_at) = player.disconnected_at else {
                    continue;
                };
                let elapsed = (now - disconnected_at).to_std().unwrap_or_default();
                let remaining = self
                    .config
                    .disconnect_grace_period
                    .saturating_sub(elapsed);
                self.start_disconnect_timer(&room_id, player.id, remaining).await;
            }
        }
    }

    fn start_disconnect_timer<'a>(
        &'a self,
        room_id: &'a str,
        player_id: PlayerId,
        duration: Duration,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let Some(server) = self.self_ref.upgrade() else {
                return;
            };
            let room_id = room_id.to_string();
            let callback: std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> =
                Box::pin(async move {
                    server.remove_expired_player(&room_id, player_id).await;
                });
            self.timers.start(player_id, duration, callback).await;
        })
    }

    /// Interpret manager signals. Runs strictly after the originating room
    /// lock was released; lifecycle cascades re-acquire the lock and their
    /// signals are queued behind the pending ones, which preserves broadcast
    /// order (`player_left` before `game_ended`, and so on).
    async fn process_signals(&self, room_id: &str, signals: Vec<Signal>) {
        let mut queue: VecDeque<Signal> = signals.into();
        while let Some(signal) = queue.pop_front() {
            match signal {
                Signal::Broadcast(event) => {
                    tracing::debug!(room_id, event = event.kind(), "Broadcasting event");
                    if matches!(event, Event::GameEnded { .. }) {
                        self.stats.increment_games_ended();
                    }
                    self.hub.broadcast(event);
                }
                Signal::StartDisconnectTimer { player_id } => {
                    self.start_disconnect_timer(
                        room_id,
                        player_id,
                        self.config.disconnect_grace_period,
                    )
                    .await;
                }
                Signal::CancelDisconnectTimer { player_id } => {
                    self.timers.cancel(player_id).await;
                }
                Signal::EndGame => {
                    if let Some(handle) = self.repository.get(room_id).await {
                        let more = {
                            let mut room = handle.lock().await;
                            lifecycle::end_game(&mut room)
                        };
                        queue.extend(more);
                    }
                }
                Signal::StartNextGame => {
                    if let Some(handle) = self.repository.get(room_id).await {
                        let more = {
                            let mut room = handle.lock().await;
                            lifecycle::start_next_game(&mut room, Utc::now())
                        };
                        self.stats.increment_games_started();
                        queue.extend(more);
                    }
                }
            }
        }
    }

    /// Shutdown sequence: snapshot, stop timers, close subscribers.
    pub async fn shutdown(&self, data_file: &Path) {
        if let Err(err) = self.save_snapshot(data_file).await {
            self.stats.increment_snapshot_failures();
            tracing::warn!(error = %err, "Final snapshot failed; in-memory state is lost");
        }
        self.timers.stop_all().await;
        self.hub.close_all();
        tracing::info!("Server shut down");
    }
}
