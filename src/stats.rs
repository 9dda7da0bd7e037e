//! Process-lifetime counters, exposed read-only at `/v1/stats`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Cheap always-on counters. Everything is monotonic and relaxed; the view is
/// a point-in-time copy.
#[derive(Debug, Default)]
pub struct ServerStats {
    rooms_created: AtomicU64,
    rooms_cleaned: AtomicU64,
    players_joined: AtomicU64,
    players_removed: AtomicU64,
    games_started: AtomicU64,
    games_ended: AtomicU64,
    solutions_accepted: AtomicU64,
    solutions_rejected: AtomicU64,
    solutions_retracted: AtomicU64,
    events_broadcast: AtomicU64,
    subscribers_dropped: AtomicU64,
    snapshots_saved: AtomicU64,
    snapshot_failures: AtomicU64,
}

/// Serializable snapshot of [`ServerStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub rooms_created: u64,
    pub rooms_cleaned: u64,
    pub players_joined: u64,
    pub players_removed: u64,
    pub games_started: u64,
    pub games_ended: u64,
    pub solutions_accepted: u64,
    pub solutions_rejected: u64,
    pub solutions_retracted: u64,
    pub events_broadcast: u64,
    pub subscribers_dropped: u64,
    pub snapshots_saved: u64,
    pub snapshot_failures: u64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_rooms_created(&self) {
        self.rooms_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_rooms_cleaned(&self, count: u64) {
        self.rooms_cleaned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_players_joined(&self) {
        self.players_joined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_players_removed(&self) {
        self.players_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_games_started(&self) {
        self.games_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_games_ended(&self) {
        self.games_ended.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_solutions_accepted(&self) {
        self.solutions_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_solutions_rejected(&self) {
        self.solutions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_solutions_retracted(&self) {
        self.solutions_retracted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_events_broadcast(&self) {
        self.events_broadcast.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_subscribers_dropped(&self, count: u64) {
        self.subscribers_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_snapshots_saved(&self) {
        self.snapshots_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_snapshot_failures(&self) {
        self.snapshot_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn view(&self) -> StatsView {
        StatsView {
            rooms_created: self.rooms_created.load(Ordering::Relaxed),
            rooms_cleaned: self.rooms_cleaned.load(Ordering::Relaxed),
            players_joined: self.players_joined.load(Ordering::Relaxed),
            players_removed: self.players_removed.load(Ordering::Relaxed),
            games_started: self.games_started.load(Ordering::Relaxed),
            games_ended: self.games_ended.load(Ordering::Relaxed),
            solutions_accepted: self.solutions_accepted.load(Ordering::Relaxed),
            solutions_rejected: self.solutions_rejected.load(Ordering::Relaxed),
            solutions_retracted: self.solutions_retracted.load(Ordering::Relaxed),
            events_broadcast: self.events_broadcast.load(Ordering::Relaxed),
            subscribers_dropped: self.subscribers_dropped.load(Ordering::Relaxed),
            snapshots_saved: self.snapshots_saved.load(Ordering::Relaxed),
            snapshot_failures: self.snapshot_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = ServerStats::new();
        stats.increment_rooms_created();
        stats.increment_rooms_created();
        stats.increment_solutions_accepted();
        stats.add_subscribers_dropped(3);

        let view = stats.view();
        assert_eq!(view.rooms_created, 2);
        assert_eq!(view.solutions_accepted, 1);
        assert_eq!(view.subscribers_dropped, 3);
        assert_eq!(view.games_started, 0);
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let stats = ServerStats::new();
        stats.increment_games_started();
        let json = serde_json::to_value(stats.view()).expect("serialize");
        assert_eq!(json["gamesStarted"], 1);
        assert_eq!(json["snapshotFailures"], 0);
    }
}
