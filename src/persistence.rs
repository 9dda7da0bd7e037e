//! Snapshot persistence: one JSON document holding every room, written with
//! temp-file + rename so readers never observe a torn file. The in-memory
//! state stays authoritative; a failed save is logged and retried on the next
//! tick.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::room::Room;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    rooms: HashMap<String, Room>,
    saved_at: DateTime<Utc>,
    version: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRef<'a> {
    rooms: &'a HashMap<String, Room>,
    saved_at: DateTime<Utc>,
    version: u32,
}

fn temp_path(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(".tmp");
    PathBuf::from(raw)
}

/// Serialize all rooms to `path` atomically.
pub async fn save_snapshot(path: &Path, rooms: &HashMap<String, Room>) -> anyhow::Result<()> {
    let document = SnapshotRef {
        rooms,
        saved_at: Utc::now(),
        version: SNAPSHOT_VERSION,
    };
    let encoded = serde_json::to_vec_pretty(&document)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let staging = temp_path(path);
    tokio::fs::write(&staging, &encoded).await?;
    tokio::fs::rename(&staging, path).await?;
    Ok(())
}

/// Load a snapshot. `Ok(None)` when no file exists yet (first run). Loaded
/// rooms are backfilled for fields older snapshots may lack.
pub async fn load_snapshot(path: &Path) -> anyhow::Result<Option<HashMap<String, Room>>> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let snapshot: Snapshot = serde_json::from_slice(&raw)?;
    if snapshot.version != SNAPSHOT_VERSION {
        tracing::warn!(
            version = snapshot.version,
            expected = SNAPSHOT_VERSION,
            "Snapshot version mismatch, loading anyway"
        );
    }

    let mut rooms = snapshot.rooms;
    for room in rooms.values_mut() {
        room.backfill_after_load();
    }
    Ok(Some(rooms))
}
