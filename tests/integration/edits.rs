//! End-to-end edits: resolve, apply locally, push only what changed.

use std::sync::Arc;

use thonky::{JsonFileStore, RangeError, ScheduleCache, ScheduleError, ThonkyConfig};
use thonky_sheets::template::WEEK_SHEET;

use crate::helpers::{DOC, loaded_cache, sample_provider, tokens};

#[tokio::test]
async fn applied_values_are_read_back_until_next_update() {
    let provider = sample_provider();
    let cache = loaded_cache(&provider).await;

    cache
        .set_week("friday", &tokens("4-6 Scrim, Practice, Free"))
        .await
        .expect("set");
    let week = cache.week().expect("week");
    let friday = week.activities_on(4).expect("friday");
    assert_eq!(friday[..3], ["Scrim", "Practice", "Free"]);

    let remote = provider.document(DOC).expect("doc");
    let sheet = remote.sheet_by_title(WEEK_SHEET).expect("week tab");
    assert_eq!(
        [sheet.value(6, 2), sheet.value(6, 3), sheet.value(6, 4)],
        ["Scrim", "Practice", "Free"]
    );
}

#[tokio::test]
async fn identical_edit_issues_no_remote_writes() {
    let provider = sample_provider();
    let cache = loaded_cache(&provider).await;

    let first = cache
        .set_week("Wednesday", &tokens("5-7 scrim"))
        .await
        .expect("first");
    assert_eq!(first.changed, 3);
    assert_eq!(provider.push_count(), 1);
    assert_eq!(provider.pushed_cells(), 3);

    let second = cache
        .set_week("Wednesday", &tokens("5-7 Scrim"))
        .await
        .expect("second");
    assert_eq!(second.changed, 0);
    assert_eq!(provider.push_count(), 1);
}

#[tokio::test]
async fn count_mismatch_is_reported_with_counts() {
    let provider = sample_provider();
    let cache = loaded_cache(&provider).await;

    let err = cache
        .set_player("Tydra", "Monday", &tokens("4-6 Yes, No"))
        .await
        .expect_err("mismatch");
    assert!(matches!(
        err,
        ScheduleError::Range(RangeError::ArgumentCountMismatch { cells: 3, values: 2 })
    ));
    assert_eq!(provider.push_count(), 0);
}

#[tokio::test]
async fn failed_push_keeps_local_edit_but_not_timestamp() {
    let provider = sample_provider();
    let cache = loaded_cache(&provider).await;
    let before = cache.last_modified().expect("ts");

    provider.fail_sheet(WEEK_SHEET);
    let err = cache
        .set_week("Monday", &tokens("Tournament"))
        .await
        .expect_err("push fails");
    assert!(matches!(err, ScheduleError::RemoteUnavailable(_)));

    assert_eq!(cache.last_modified().expect("ts"), before);
    let week = cache.week().expect("week");
    assert_eq!(week.activities_on(0).expect("monday"), ["Tournament"; 6]);
}

#[tokio::test]
async fn default_week_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let provider = sample_provider();
    let cache = ScheduleCache::new(Arc::clone(&provider), DOC, ThonkyConfig::default())
        .with_store(Arc::new(JsonFileStore::new(dir.path())));
    cache.update().await.expect("update");

    let err = cache.reset_to_default().await.expect_err("nothing saved yet");
    assert!(matches!(err, ScheduleError::NoDefaultWeek(_)));

    cache.save_default_week().expect("save default");
    let saved = cache.week().expect("week");

    cache.set_week("Saturday", &tokens("Scrim")).await.expect("set");
    cache.set_week("Sunday", &tokens("4 Scrim")).await.expect("set");
    let pushes = provider.push_count();

    let outcome = cache.reset_to_default().await.expect("reset");
    assert_eq!(outcome.changed, 7);
    assert_eq!(provider.push_count(), pushes + 1);
    assert_eq!(
        cache.week().expect("week").activities_on(5),
        saved.activities_on(5)
    );
}

#[tokio::test]
async fn player_edits_go_to_the_player_sheet() {
    let provider = sample_provider();
    let cache = loaded_cache(&provider).await;

    let outcome = cache
        .set_player("boulder", "tuesday", &tokens("9 yes"))
        .await
        .expect("set");
    assert_eq!(outcome.sheet, "Boulder");
    assert_eq!(outcome.changed, 1);

    let remote = provider.document(DOC).expect("doc");
    assert_eq!(remote.sheet_by_title("Boulder").expect("tab").value(3, 7), "Yes");
    assert_eq!(
        cache.player("Boulder").expect("player").availability_at(1, 9, 4),
        Some("Yes")
    );
}
