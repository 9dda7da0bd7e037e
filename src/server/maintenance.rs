//! Background maintenance: periodic snapshots and stale-room cleanup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::{chrono_duration_from_std, GameServer};

/// Periodically snapshot all rooms to disk. Save failures are transient by
/// design: they are logged and the next tick retries; memory stays
/// authoritative.
pub async fn autosave_task(
    server: Arc<GameServer>,
    data_file: PathBuf,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = server.save_snapshot(&data_file).await {
                    server.stats().increment_snapshot_failures();
                    tracing::warn!(
                        path = %data_file.display(),
                        error = %err,
                        "Snapshot save failed, will retry on next tick"
                    );
                }
            }
            () = shutdown.cancelled() => break,
        }
    }

    tracing::debug!("Autosave task stopped");
}

/// Periodically delete rooms whose last activity is older than the configured
/// maximum age.
pub async fn cleanup_task(
    server: Arc<GameServer>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let max_age = chrono_duration_from_std(server.config().room_max_age);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let stale = server.repository.stale_room_ids(max_age, Utc::now()).await;
                if stale.is_empty() {
                    continue;
                }

                let count = stale.len();
                for room_id in stale {
                    server.delete_room(&room_id).await;
                }
                server.stats().add_rooms_cleaned(count as u64);
                tracing::info!(count, "Cleaned up stale rooms");
            }
            () = shutdown.cancelled() => break,
        }
    }

    tracing::debug!("Cleanup task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ServerConfig;

    #[tokio::test]
    async fn test_cleanup_removes_only_stale_rooms() {
        let server = GameServer::new(ServerConfig {
            room_max_age: Duration::from_secs(3600),
            ..ServerConfig::default()
        });

        let stale = server.create_room("Alice").await.expect("create");
        let fresh = server.create_room("Bob").await.expect("create");

        // Age the first room beyond the maximum.
        {
            let handle = server.repository.get(&stale.id).await.expect("room");
            let mut room = handle.lock().await;
            room.last_activity_at = Utc::now() - chrono::Duration::hours(2);
        }

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(cleanup_task(
            server.clone(),
            Duration::from_millis(10),
            shutdown.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(60)).await;
        shutdown.cancel();
        task.await.expect("task");

        assert!(server.get_room(&stale.id).await.is_err());
        assert!(server.get_room(&fresh.id).await.is_ok());
        assert_eq!(server.stats().view().rooms_cleaned, 1);
    }

    #[tokio::test]
    async fn test_autosave_writes_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rooms.json");
        let server = GameServer::new(ServerConfig::default());
        server.create_room("Alice").await.expect("create");

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(autosave_task(
            server.clone(),
            path.clone(),
            Duration::from_millis(10),
            shutdown.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(60)).await;
        shutdown.cancel();
        task.await.expect("task");

        assert!(path.exists());
        assert!(server.stats().view().snapshots_saved >= 1);
    }
}
