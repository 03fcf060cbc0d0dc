//! Shared helpers for integration tests.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thonky::cache::{CacheSnapshot, SnapshotStore};
use thonky::schedule::Week;
use thonky::{ScheduleCache, ScheduleError, ThonkyConfig};
use thonky_sheets::MemoryProvider;
use thonky_sheets::template::sample_document;

/// Document id used by most tests.
pub(crate) const DOC: &str = "team-doc";

/// A remote timestamp safely in the past.
pub(crate) fn an_hour_ago() -> DateTime<Utc> {
    Utc::now() - Duration::hours(1)
}

/// A provider holding the sample document under [`DOC`].
pub(crate) fn sample_provider() -> Arc<MemoryProvider> {
    Arc::new(MemoryProvider::new().with_document(sample_document(DOC, an_hour_ago())))
}

/// An empty cache over `provider` with default config.
pub(crate) fn cache(provider: &Arc<MemoryProvider>) -> ScheduleCache<MemoryProvider> {
    ScheduleCache::new(Arc::clone(provider), DOC, ThonkyConfig::default())
}

/// A cache over `provider` that has completed one update.
pub(crate) async fn loaded_cache(provider: &Arc<MemoryProvider>) -> ScheduleCache<MemoryProvider> {
    let cache = cache(provider);
    cache.update().await.expect("initial update");
    cache
}

/// Split a command line into tokens the way the chat layer does.
pub(crate) fn tokens(line: &str) -> Vec<String> {
    line.split_whitespace().map(String::from).collect()
}

/// A store whose writes always fail.
pub(crate) struct FailingStore;

impl SnapshotStore for FailingStore {
    fn load(&self, _id: &str) -> thonky::Result<Option<CacheSnapshot>> {
        Ok(None)
    }

    fn save(&self, _snapshot: &CacheSnapshot) -> thonky::Result<()> {
        Err(ScheduleError::Persistence("disk full".into()))
    }

    fn load_default_week(&self, _id: &str) -> thonky::Result<Option<Week>> {
        Ok(None)
    }

    fn save_default_week(&self, _id: &str, _week: &Week) -> thonky::Result<()> {
        Err(ScheduleError::Persistence("disk full".into()))
    }
}
