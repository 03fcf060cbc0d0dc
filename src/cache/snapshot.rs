//! Durable snapshots of a schedule cache.
//!
//! A snapshot holds everything a cache needs to serve reads without the
//! remote document: the week, the players, the allowed activities and the
//! remote timestamp the data was read at. The default week used by
//! "reset" is stored beside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScheduleError};
use crate::schedule::{Player, Week};

/// Current on-disk snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Persisted state of one schedule cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub version: u32,
    /// Remote document id.
    pub id: String,
    /// Remote modification time the data corresponds to.
    pub last_modified: DateTime<Utc>,
    pub week: Week,
    pub players: Vec<Player>,
    pub valid_activities: Vec<String>,
}

/// Key/value persistence keyed by document id.
pub trait SnapshotStore: Send + Sync {
    /// The stored snapshot for `id`, or `None` if there is none.
    fn load(&self, id: &str) -> Result<Option<CacheSnapshot>>;

    /// Store `snapshot`, replacing any previous one for its id.
    fn save(&self, snapshot: &CacheSnapshot) -> Result<()>;

    /// The stored default week for `id`, or `None` if there is none.
    fn load_default_week(&self, id: &str) -> Result<Option<Week>>;

    /// Store `week` as the default week for `id`.
    fn save_default_week(&self, id: &str, week: &Week) -> Result<()>;
}

/// Stores snapshots as JSON files in one directory:
/// `<dir>/<id>.json` and `<dir>/<id>.default-week.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(id)))
    }

    fn default_week_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.default-week.json", file_stem(id)))
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self, id: &str) -> Result<Option<CacheSnapshot>> {
        let Some(snapshot) = read_json::<CacheSnapshot>(&self.snapshot_path(id))? else {
            return Ok(None);
        };
        if snapshot.version != SNAPSHOT_VERSION {
            tracing::warn!(
                doc_id = id,
                version = snapshot.version,
                "ignoring snapshot with unknown version"
            );
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &CacheSnapshot) -> Result<()> {
        write_json_atomic(&self.snapshot_path(&snapshot.id), snapshot)
    }

    fn load_default_week(&self, id: &str) -> Result<Option<Week>> {
        read_json(&self.default_week_path(id))
    }

    fn save_default_week(&self, id: &str, week: &Week) -> Result<()> {
        write_json_atomic(&self.default_week_path(id), week)
    }
}

/// Document ids become file names. `[A-Za-z0-9-]` is kept and every other
/// byte is written as `_XX`, so distinct ids never share a file.
fn file_stem(id: &str) -> String {
    let mut stem = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            let _ = write!(stem, "_{byte:02X}");
        }
    }
    stem
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ScheduleError::Persistence(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };
    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        ScheduleError::Persistence(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write to a temporary file and rename it over `path`.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ScheduleError::Persistence(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| ScheduleError::Persistence(format!("failed to serialize snapshot: {e}")))?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json).map_err(|e| {
        ScheduleError::Persistence(format!("failed to write {}: {e}", tmp_path.display()))
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        ScheduleError::Persistence(format!("failed to finalize {}: {e}", path.display()))
    })?;
    Ok(())
}
