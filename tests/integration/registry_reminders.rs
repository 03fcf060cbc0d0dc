//! Guild routing and reminders over shared caches.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use thonky::registry::{GuildConfig, Registry, TeamConfig};
use thonky::reminders::due_announcements;
use thonky::{ScheduleCache, ThonkyConfig};
use thonky_sheets::MemoryProvider;
use thonky_sheets::template::sample_document;

use crate::helpers::{DOC, an_hour_ago, tokens};

const TEAM_DOC: &str = "team-b-doc";

// 2024-10-14 was a Monday; the sample week's first block starts at 04:00.
fn monday_at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 14, hour, minute, 0).unwrap()
}

async fn registry() -> (Arc<MemoryProvider>, Registry<MemoryProvider>) {
    let provider = Arc::new(
        MemoryProvider::new()
            .with_document(sample_document(DOC, an_hour_ago()))
            .with_document(sample_document(TEAM_DOC, an_hour_ago())),
    );

    let registry = Registry::new();
    let mut guild = GuildConfig::new("g1", DOC);
    guild.announce_channel = "announcements".into();
    guild.role_mention = "@Team".into();
    guild.remind_activities = vec!["scrim".into()];
    registry.add_guild(guild).expect("guild");
    registry
        .add_team(
            "g1",
            TeamConfig {
                name: "B".into(),
                channels: vec!["b-chat".into()],
                doc_key: TEAM_DOC.into(),
            },
        )
        .expect("team");
    registry
        .add_guild(GuildConfig::new("quiet", DOC))
        .expect("quiet guild");

    for id in [DOC, TEAM_DOC] {
        let cache = ScheduleCache::new(Arc::clone(&provider), id, ThonkyConfig::default());
        cache.update().await.expect("update");
        registry.attach_schedule(Arc::new(cache)).expect("attach");
    }
    (provider, registry)
}

#[tokio::test]
async fn team_channel_edits_only_the_team_schedule() {
    let (provider, registry) = registry().await;

    let team = registry
        .schedule_for("g1", "b-chat")
        .expect("lookup")
        .expect("team cache");
    team.set_week("Sunday", &tokens("Scrim")).await.expect("edit");

    let guild = registry
        .schedule_for("g1", "general")
        .expect("lookup")
        .expect("guild cache");
    assert_eq!(guild.id(), DOC);
    assert_eq!(guild.week().expect("week").days[6], "Sunday");
    let sunday = guild.week().expect("week");
    assert_eq!(sunday.activities_on(6).expect("sunday"), ["Off"; 6]);

    let remote = provider.document(TEAM_DOC).expect("doc");
    let sheet = remote
        .sheet_by_title(thonky_sheets::template::WEEK_SHEET)
        .expect("week tab");
    assert_eq!(sheet.value(8, 2), "Scrim");
}

#[tokio::test]
async fn reminders_cover_guild_and_team_schedules() {
    let (_provider, registry) = registry().await;

    let due = due_announcements(&registry, monday_at(3, 30), Duration::minutes(60)).expect("due");
    assert_eq!(due.len(), 2);
    assert!(due.iter().all(|a| a.guild_id == "g1"));
    assert!(due.iter().all(|a| a.channel == "announcements" && a.role_mention == "@Team"));
    assert_eq!(due[0].team, None);
    assert_eq!(due[1].team.as_deref(), Some("B"));
    assert_eq!(due[0].reminder.activity, "Scrim");
    assert_eq!(due[0].reminder.block, 0);
    assert_eq!(due[0].reminder.minutes_until, 30);
}

#[tokio::test]
async fn started_activity_is_not_announced() {
    let (_provider, registry) = registry().await;

    let due = due_announcements(&registry, monday_at(4, 30), Duration::minutes(60)).expect("due");
    assert!(due.is_empty());
}

#[tokio::test]
async fn refresh_all_picks_up_external_edits() {
    let (provider, registry) = registry().await;
    provider
        .external_edit(
            TEAM_DOC,
            thonky_sheets::template::WEEK_SHEET,
            &[thonky_sheets::CellUpdate::value(2, 2, "Off")],
        )
        .expect("edit");

    let report = registry.refresh_all().await.expect("refresh");
    assert_eq!(report.refreshed, [TEAM_DOC]);
    assert_eq!(report.fresh, [DOC]);
    assert!(report.failed.is_empty());
}
