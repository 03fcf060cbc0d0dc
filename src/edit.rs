//! Edit operations the command layer calls with pre-split tokens.
//!
//! Each edit resolves its tokens, applies them to the cached grid under the
//! state lock, then pushes the changed cells in one call. Cells that already
//! hold the requested content are neither written nor pushed.

use thonky_sheets::DocumentProvider;
use tracing::info;

use crate::apply::{ApplyMode, PendingEdit, apply};
use crate::cache::{CacheState, ScheduleCache};
use crate::error::{Result, ScheduleError};
use crate::resolve::{Resolution, resolve};
use crate::schedule::{BLOCKS, DAYS, Week};

/// What an edit changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    /// Sheet the edit was written to.
    pub sheet: String,
    /// Number of cells that changed.
    pub changed: usize,
}

fn loaded_week(state: &mut CacheState) -> Result<&mut Week> {
    if !state.week.grid.is_bound() {
        return Err(ScheduleError::Malformed(
            "schedule has not been loaded".into(),
        ));
    }
    Ok(&mut state.week)
}

fn day_of(week: &Week, day: &str) -> Result<usize> {
    week.day_index(day)
        .ok_or_else(|| ScheduleError::UnknownDay(day.to_string()))
}

impl<P: DocumentProvider + 'static> ScheduleCache<P> {
    /// Set activities on one day of the week, e.g. `["4-6", "Scrim,", "Free,", "Off"]`.
    ///
    /// Values are checked against the week's allowed activities.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::UnknownDay`], a [`ScheduleError::Range`]
    /// error for bad tokens, or the push error.
    pub async fn set_week(&self, day: &str, tokens: &[String]) -> Result<EditOutcome> {
        let sheet = self.config().layout.week_sheet.clone();
        let pending = self.write(|state| {
            let valid = state.valid_activities.clone();
            let week = loaded_week(state)?;
            let day = day_of(week, day)?;
            let resolution = resolve(week.start_time, tokens, &valid)?;
            apply(&mut week.grid, &sheet, day, &resolution, ApplyMode::Value)
        })?;
        self.finish(pending).await
    }

    /// Set a player's responses on one day.
    ///
    /// The player is matched ignoring case and values are checked against
    /// the configured responses.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::UnknownPlayer`],
    /// [`ScheduleError::UnknownDay`], a [`ScheduleError::Range`] error, or
    /// the push error.
    pub async fn set_player(&self, name: &str, day: &str, tokens: &[String]) -> Result<EditOutcome> {
        let responses = self.config().responses.player.clone();
        let pending = self.write(|state| {
            let week = loaded_week(state)?;
            let day = day_of(week, day)?;
            let resolution = resolve(week.start_time, tokens, &responses)?;
            let player = state
                .player_mut(name)
                .ok_or_else(|| ScheduleError::UnknownPlayer(name.to_string()))?;
            let sheet = player.name.clone();
            apply(&mut player.grid, &sheet, day, &resolution, ApplyMode::Value)
        })?;
        self.finish(pending).await
    }

    /// Set notes on one day of the week, e.g. `["5", "vs", "Inked"]`.
    ///
    /// Notes are free text; `empty`, `none` or `blank` clears a note.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::UnknownDay`], a [`ScheduleError::Range`]
    /// error for bad tokens, or the push error.
    pub async fn schedule_note(&self, day: &str, tokens: &[String]) -> Result<EditOutcome> {
        let sheet = self.config().layout.week_sheet.clone();
        let pending = self.write(|state| {
            let week = loaded_week(state)?;
            let day = day_of(week, day)?;
            let resolution = resolve(week.start_time, tokens, &[])?;
            apply(&mut week.grid, &sheet, day, &resolution, ApplyMode::Note)
        })?;
        self.finish(pending).await
    }

    /// Overwrite every day of the week with the activities of `template`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Malformed`] before the schedule is loaded,
    /// or the push error.
    pub async fn reset_week(&self, template: &Week) -> Result<EditOutcome> {
        let sheet = self.config().layout.week_sheet.clone();
        let pending = self.write(|state| {
            let week = loaded_week(state)?;
            let mut pending = PendingEdit::new(&sheet);
            for day in 0..DAYS {
                let Some(values) = template.activities_on(day) else {
                    continue;
                };
                let resolution = Resolution {
                    blocks: (0..BLOCKS).collect(),
                    values: values.iter().map(|v| v.to_string()).collect(),
                };
                pending.extend(apply(&mut week.grid, &sheet, day, &resolution, ApplyMode::Value)?);
            }
            Ok(pending)
        })?;
        self.finish(pending).await
    }

    /// Store the current week as this document's default week.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Persistence`] when no snapshot store is
    /// attached or the write fails.
    pub fn save_default_week(&self) -> Result<()> {
        let store = self.store().ok_or_else(|| {
            ScheduleError::Persistence("no snapshot store attached".into())
        })?;
        let week = self.write(|state| loaded_week(state).map(|w| w.clone()))?;
        store.save_default_week(self.id(), &week)?;
        info!(doc_id = %self.id(), "saved default week");
        Ok(())
    }

    /// Reset the week to the stored default week.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::NoDefaultWeek`] when none has been saved,
    /// or any error from [`reset_week`](Self::reset_week).
    pub async fn reset_to_default(&self) -> Result<EditOutcome> {
        let store = self.store().ok_or_else(|| {
            ScheduleError::Persistence("no snapshot store attached".into())
        })?;
        let template = store
            .load_default_week(self.id())?
            .ok_or_else(|| ScheduleError::NoDefaultWeek(self.id().to_string()))?;
        self.reset_week(&template).await
    }

    async fn finish(&self, pending: PendingEdit) -> Result<EditOutcome> {
        let outcome = EditOutcome {
            sheet: pending.sheet.clone(),
            changed: pending.len(),
        };
        self.sync_sheet(pending).await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::config::ThonkyConfig;
    use crate::schedule::Grid;
    use chrono::Utc;
    use std::sync::Arc;
    use thonky_sheets::MemoryProvider;
    use thonky_sheets::template::{self, DAY_NAMES, WEEK_SHEET, sample_document};

    fn tokens(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    async fn loaded() -> (Arc<MemoryProvider>, ScheduleCache<MemoryProvider>) {
        let provider = Arc::new(MemoryProvider::new().with_document(sample_document("doc", Utc::now())));
        let cache = ScheduleCache::new(Arc::clone(&provider), "doc", ThonkyConfig::default());
        cache.update().await.expect("update");
        (provider, cache)
    }

    #[tokio::test]
    async fn set_week_writes_local_and_remote() {
        let (provider, cache) = loaded().await;
        let outcome = cache
            .set_week("tuesday", &tokens("4-5 scrim, Off"))
            .await
            .expect("set");
        assert_eq!(outcome, EditOutcome { sheet: WEEK_SHEET.into(), changed: 2 });

        let week = cache.week().unwrap();
        assert_eq!(week.activities_on(1).unwrap()[..2], ["Scrim", "Off"]);
        let remote = provider.document("doc").unwrap();
        assert_eq!(remote.sheet_by_title(WEEK_SHEET).unwrap().value(3, 3), "Off");
    }

    #[tokio::test]
    async fn repeated_edit_pushes_nothing() {
        let (provider, cache) = loaded().await;
        cache.set_week("Monday", &tokens("Off")).await.expect("first");
        assert_eq!(provider.push_count(), 1);
        let again = cache.set_week("Monday", &tokens("Off")).await.expect("second");
        assert_eq!(again.changed, 0);
        assert_eq!(provider.push_count(), 1);
    }

    #[tokio::test]
    async fn unknown_day_is_recoverable() {
        let (_, cache) = loaded().await;
        let err = cache.set_week("Caturday", &tokens("Off")).await.unwrap_err();
        assert!(matches!(err, ScheduleError::UnknownDay(_)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn invalid_activity_leaves_grid_untouched() {
        let (provider, cache) = loaded().await;
        let before = cache.week().unwrap();
        let err = cache.set_week("Monday", &tokens("4 Nap")).await.unwrap_err();
        assert!(matches!(err, ScheduleError::Range(_)));
        assert_eq!(cache.week().unwrap(), before);
        assert_eq!(provider.push_count(), 0);
    }

    #[tokio::test]
    async fn set_player_writes_player_sheet() {
        let (provider, cache) = loaded().await;
        let outcome = cache
            .set_player("flick", "Sunday", &tokens("yes"))
            .await
            .expect("set");
        assert_eq!(outcome.sheet, "Flick");
        assert_eq!(cache.player("Flick").unwrap().availability_on(6).unwrap(), ["Yes"; 6]);

        let remote = provider.document("doc").unwrap();
        assert_eq!(remote.sheet_by_title("Flick").unwrap().value(8, 7), "Yes");
    }

    #[tokio::test]
    async fn set_player_rejects_unknown_player_and_response() {
        let (_, cache) = loaded().await;
        let err = cache.set_player("Nobody", "Monday", &tokens("Yes")).await.unwrap_err();
        assert!(matches!(err, ScheduleError::UnknownPlayer(_)));
        let err = cache.set_player("Tydra", "Monday", &tokens("Scrim")).await.unwrap_err();
        assert!(matches!(err, ScheduleError::Range(_)));
    }

    #[tokio::test]
    async fn schedule_note_sets_and_clears() {
        let (provider, cache) = loaded().await;
        cache
            .schedule_note("Monday", &tokens("4 vs Inked"))
            .await
            .expect("note");
        assert_eq!(cache.week().unwrap().grid.cell(0, 0).unwrap().note, "vs Inked");
        assert_eq!(
            provider.document("doc").unwrap().sheet_by_title(WEEK_SHEET).unwrap().cell(2, 2).unwrap().note,
            "vs Inked"
        );

        cache.schedule_note("Monday", &tokens("4 none")).await.expect("clear");
        assert_eq!(cache.week().unwrap().grid.cell(0, 0).unwrap().note, "");
    }

    #[tokio::test]
    async fn reset_week_copies_template_in_one_push() {
        let (provider, cache) = loaded().await;
        let mut template = cache.week().unwrap();
        let sheet = template::grid_sheet(WEEK_SHEET, &DAY_NAMES.map(String::from), 4, 1, &[["Off"; 6]; 7]);
        template.grid = Grid::fill(&sheet, 2, 2);
        let outcome = cache.reset_week(&template).await.expect("reset");
        // 42 cells, 11 of them already Off.
        assert_eq!(outcome.changed, 31);
        assert_eq!(provider.push_count(), 1);
        assert!((0..7).all(|d| cache.week().unwrap().activities_on(d).unwrap() == ["Off"; 6]));
    }

    #[tokio::test]
    async fn edits_require_a_loaded_schedule() {
        let provider = Arc::new(MemoryProvider::new().with_document(sample_document("doc", Utc::now())));
        let cache = ScheduleCache::new(provider, "doc", ThonkyConfig::default());
        let err = cache.set_week("Monday", &tokens("Off")).await.unwrap_err();
        assert!(matches!(err, ScheduleError::Malformed(_)));
    }

    #[tokio::test]
    async fn default_week_needs_a_store() {
        let (_, cache) = loaded().await;
        assert!(matches!(
            cache.save_default_week(),
            Err(ScheduleError::Persistence(_))
        ));
    }
}
