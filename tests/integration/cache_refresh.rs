//! Freshness protocol and concurrent population against the in-memory
//! provider.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use thonky::ScheduleError;
use thonky_sheets::CellUpdate;
use thonky_sheets::template::WEEK_SHEET;

use crate::helpers::{cache, loaded_cache, sample_provider};

#[tokio::test]
async fn update_matches_remote_and_clears_staleness() {
    let provider = sample_provider();
    let cache = cache(&provider);
    assert!(cache.is_stale().await.expect("stale check"));

    cache.update().await.expect("update");

    let remote = provider.document(cache.id()).expect("doc").modified;
    assert_eq!(cache.last_modified().expect("ts"), remote);
    assert!(!cache.is_stale().await.expect("stale check"));
    assert!(cache.is_populated().expect("populated"));
}

#[tokio::test]
async fn blank_roster_roles_are_inherited() {
    let provider = sample_provider();
    let cache = loaded_cache(&provider).await;
    let boulder = cache.player("Boulder").expect("player");
    assert_eq!(boulder.role, "Tanks");
    assert_eq!(cache.player("Flick").expect("player").role, "DPS");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_update_fails_fast() {
    let provider = sample_provider();
    provider.set_latency(Duration::from_millis(150));
    let cache = Arc::new(cache(&provider));

    let first = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.update().await }
    });
    while !cache.is_updating() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let started = Instant::now();
    let err = cache.update().await.expect_err("second update must be rejected");
    assert!(matches!(err, ScheduleError::AlreadyUpdating(_)));
    assert!(started.elapsed() < Duration::from_millis(100));

    first.await.expect("join").expect("first update");
    assert!(!cache.is_updating());
    assert_eq!(cache.players().expect("players").len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn player_sheets_are_fetched_concurrently() {
    let provider = sample_provider();
    provider.set_latency(Duration::from_millis(100));
    let cache = cache(&provider);

    let started = Instant::now();
    cache.update().await.expect("update");
    // Roster, week, timestamp and validation calls are sequential; the four
    // player sheets overlap. Fetched one by one it would take 800 ms.
    assert!(
        started.elapsed() < Duration::from_millis(750),
        "update took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn failed_player_fetch_keeps_previous_snapshot() {
    let provider = sample_provider();
    let cache = loaded_cache(&provider).await;
    let before = cache.snapshot().expect("snapshot");

    provider
        .external_edit(cache.id(), WEEK_SHEET, &[CellUpdate::value(2, 2, "Off")])
        .expect("edit");
    provider.fail_sheet("Granite");

    let err = cache.refresh_if_stale().await.expect_err("refresh must fail");
    match err {
        ScheduleError::PartialFetchFailure { failed, .. } => assert_eq!(failed, ["Granite"]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(cache.snapshot().expect("snapshot"), before);
    assert!(cache.is_stale().await.expect("stale check"));

    provider.clear_failures();
    assert!(cache.refresh_if_stale().await.expect("refresh"));
    let week = cache.week().expect("week");
    assert_eq!(week.activities_on(0).expect("monday")[0], "Off");
}

#[tokio::test]
async fn slow_week_sheet_times_out() {
    let provider = sample_provider();
    provider.set_sheet_latency(WEEK_SHEET, Duration::from_secs(3));
    let mut config = thonky::ThonkyConfig::default();
    config.fetch.timeout_seconds = 1;
    let cache = thonky::ScheduleCache::new(Arc::clone(&provider), crate::helpers::DOC, config);

    let err = cache.update().await.expect_err("update must time out");
    assert!(matches!(err, ScheduleError::Timeout(_)));
    assert!(!cache.is_populated().expect("populated"));
    assert!(!cache.is_updating());
}

#[tokio::test]
async fn dropped_update_releases_the_guard() {
    let provider = sample_provider();
    provider.set_latency(Duration::from_millis(200));
    let cache = cache(&provider);

    let timed_out = tokio::time::timeout(Duration::from_millis(50), cache.update()).await;
    assert!(timed_out.is_err());
    assert!(!cache.is_updating());

    provider.set_latency(Duration::ZERO);
    cache.update().await.expect("update after drop");
}

#[tokio::test]
async fn our_own_sync_does_not_look_stale() {
    let provider = sample_provider();
    let cache = loaded_cache(&provider).await;
    let before = Utc::now();
    cache
        .set_week("Monday", &crate::helpers::tokens("Off"))
        .await
        .expect("set");
    assert!(cache.last_modified().expect("ts") >= before);
    assert!(!cache.is_stale().await.expect("stale check"));
    assert!(!cache.refresh_if_stale().await.expect("refresh"));
}
