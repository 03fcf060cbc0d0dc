//! Reminder evaluation for a periodic caller.
//!
//! Only today's row is considered, and only its first block whose activity
//! is on the reminder list. Times are wall-clock hours of `now`'s date; the
//! schedule carries no timezone.

use chrono::{DateTime, Duration, Utc};
use thonky_sheets::DocumentProvider;
use tracing::debug;

use crate::error::Result;
use crate::registry::Registry;
use crate::schedule::Week;

/// An activity that starts soon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub day: usize,
    pub block: usize,
    /// Activity as written in the schedule.
    pub activity: String,
    /// Whole minutes from `now` to the block's start.
    pub minutes_until: i64,
}

/// A reminder addressed to a guild's announce channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub guild_id: String,
    /// Team whose schedule triggered it, `None` for the guild schedule.
    pub team: Option<String>,
    pub channel: String,
    pub role_mention: String,
    pub reminder: Reminder,
}

/// The reminder due for today's first listed activity, if it starts after
/// `now` and no later than `now + lead`.
pub fn next_reminder(
    week: &Week,
    remind_activities: &[String],
    now: DateTime<Utc>,
    lead: Duration,
) -> Option<Reminder> {
    let day = week.today(now);
    let activities = week.activities_on(day)?;
    let (block, activity) = activities.iter().enumerate().find(|(_, activity)| {
        remind_activities
            .iter()
            .any(|r| r.eq_ignore_ascii_case(activity))
    })?;

    let starts = now
        .date_naive()
        .and_hms_opt(week.hour_of(block), 0, 0)?
        .and_utc();
    let until = starts - now;
    if until <= Duration::zero() || until > lead {
        return None;
    }
    Some(Reminder {
        day,
        block,
        activity: (*activity).to_string(),
        minutes_until: until.num_minutes(),
    })
}

/// Reminders due across every guild with an announce channel.
///
/// Each guild's own schedule and each of its teams' schedules are checked;
/// documents without an attached cache are skipped.
pub fn due_announcements<P: DocumentProvider + 'static>(
    registry: &Registry<P>,
    now: DateTime<Utc>,
    lead: Duration,
) -> Result<Vec<Announcement>> {
    let mut announcements = Vec::new();
    for guild in registry.guilds()? {
        if guild.announce_channel.is_empty() || guild.remind_activities.is_empty() {
            continue;
        }
        let scopes = std::iter::once((None, guild.doc_key.clone())).chain(
            guild
                .teams
                .iter()
                .map(|t| (Some(t.name.clone()), t.doc_key.clone())),
        );
        for (team, doc_key) in scopes {
            let Some(cache) = registry.schedule(&doc_key)? else {
                continue;
            };
            let week = cache.week()?;
            if let Some(reminder) = next_reminder(&week, &guild.remind_activities, now, lead) {
                debug!(guild = %guild.guild_id, doc_id = %doc_key, activity = %reminder.activity, "reminder due");
                announcements.push(Announcement {
                    guild_id: guild.guild_id.clone(),
                    team,
                    channel: guild.announce_channel.clone(),
                    role_mention: guild.role_mention.clone(),
                    reminder,
                });
            }
        }
    }
    Ok(announcements)
}
