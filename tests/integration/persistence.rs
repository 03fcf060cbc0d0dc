//! Snapshots on disk: adopting them on open and writing them on update.

use std::sync::Arc;

use chrono::Utc;
use thonky::{JsonFileStore, ScheduleCache, ScheduleError, SnapshotStore, ThonkyConfig};

use crate::helpers::{DOC, FailingStore, sample_provider, tokens};

fn store(dir: &tempfile::TempDir) -> Arc<dyn SnapshotStore> {
    Arc::new(JsonFileStore::new(dir.path()))
}

#[tokio::test]
async fn open_without_snapshot_populates_and_persists() {
    let dir = tempfile::tempdir().expect("tempdir");
    let provider = sample_provider();

    let cache = ScheduleCache::open(
        Arc::clone(&provider),
        DOC,
        ThonkyConfig::default(),
        Some(store(&dir)),
    )
    .await
    .expect("open");
    assert!(cache.is_populated().expect("populated"));
    assert!(provider.fetch_count() > 0);
    assert!(dir.path().join(format!("{DOC}.json")).exists());

    let stored = JsonFileStore::new(dir.path())
        .load(DOC)
        .expect("load")
        .expect("snapshot");
    assert_eq!(stored, cache.snapshot().expect("snapshot"));
}

#[tokio::test]
async fn fresh_snapshot_is_adopted_without_fetching() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = sample_provider();
    let seeded = ScheduleCache::open(
        Arc::clone(&first),
        DOC,
        ThonkyConfig::default(),
        Some(store(&dir)),
    )
    .await
    .expect("seed");
    let expected = seeded.snapshot().expect("snapshot");

    // Same remote timestamp, fresh counters.
    let provider = sample_provider();
    provider.set_modified(DOC, expected.last_modified);
    let cache = ScheduleCache::open(
        Arc::clone(&provider),
        DOC,
        ThonkyConfig::default(),
        Some(store(&dir)),
    )
    .await
    .expect("open");

    assert_eq!(provider.fetch_count(), 0);
    assert_eq!(cache.snapshot().expect("snapshot"), expected);
    assert!(!cache.is_stale().await.expect("stale check"));
}

#[tokio::test]
async fn stale_snapshot_triggers_update() {
    let dir = tempfile::tempdir().expect("tempdir");
    let provider = sample_provider();
    ScheduleCache::open(
        Arc::clone(&provider),
        DOC,
        ThonkyConfig::default(),
        Some(store(&dir)),
    )
    .await
    .expect("seed");

    provider
        .external_edit(
            DOC,
            thonky_sheets::template::WEEK_SHEET,
            &[thonky_sheets::CellUpdate::value(2, 2, "Off")],
        )
        .expect("edit");
    let fetched = provider.fetch_count();

    let cache = ScheduleCache::open(
        Arc::clone(&provider),
        DOC,
        ThonkyConfig::default(),
        Some(store(&dir)),
    )
    .await
    .expect("open");
    assert!(provider.fetch_count() > fetched);
    let week = cache.week().expect("week");
    assert_eq!(week.activities_on(0).expect("monday")[0], "Off");
}

#[tokio::test]
async fn failed_persist_leaves_cache_untouched() {
    let provider = sample_provider();
    let cache = ScheduleCache::new(Arc::clone(&provider), DOC, ThonkyConfig::default())
        .with_store(Arc::new(FailingStore));

    let err = cache.update().await.expect_err("persist fails");
    assert!(matches!(err, ScheduleError::Persistence(_)));
    assert!(!cache.is_populated().expect("populated"));
    assert!(!cache.is_updating());
}

#[tokio::test]
async fn failed_persist_after_sync_still_succeeds() {
    let provider = sample_provider();
    let cache = ScheduleCache::new(Arc::clone(&provider), DOC, ThonkyConfig::default());
    cache.update().await.expect("update");
    let cache = cache.with_store(Arc::new(FailingStore));

    let before = Utc::now();
    let outcome = cache
        .set_week("Sunday", &tokens("Scrim"))
        .await
        .expect("edit");
    assert_eq!(outcome.changed, 6);
    assert_eq!(provider.push_count(), 1);
    assert!(cache.last_modified().expect("ts") >= before);
}

#[tokio::test]
async fn edits_are_written_through_to_the_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let provider = sample_provider();
    let cache = ScheduleCache::open(
        Arc::clone(&provider),
        DOC,
        ThonkyConfig::default(),
        Some(store(&dir)),
    )
    .await
    .expect("open");

    cache
        .set_week("Thursday", &tokens("4-5 Practice"))
        .await
        .expect("edit");

    let stored = JsonFileStore::new(dir.path())
        .load(DOC)
        .expect("load")
        .expect("snapshot");
    assert_eq!(stored.last_modified, cache.last_modified().expect("ts"));
    assert_eq!(stored.week.activities_on(3).expect("thursday")[..2], ["Practice", "Practice"]);
}
