//! The team's shared week schedule.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use thonky_sheets::Sheet;

use super::grid::{BLOCKS, DAYS, Grid};
use crate::config::LayoutConfig;
use crate::error::{Result, ScheduleError};

/// One week of activities with the labels and timing read from the sheet
/// header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    pub grid: Grid,
    /// Day names in storage order, e.g. `"Monday"`.
    pub days: [String; DAYS],
    /// Hour at which block 0 starts.
    pub start_time: u32,
    /// Hours per block.
    pub block_length: u32,
    /// Reference date of the first day, e.g. `"10/14"`.
    pub date: String,
}

impl Week {
    /// Parse the header and grid of a week sheet.
    ///
    /// Day labels come from the label column of the grid rows, written as
    /// `"<day>, <date>"` (the date part is optional on all but the first
    /// row). The start hour is read from the first time-block header
    /// (`"4-5"` → 4) and the block length from the difference with the
    /// second one.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Malformed`] when a day label is missing, the
    /// first header has no start hour, or a later header disagrees with
    /// `start_time + block * block_length`.
    pub fn parse(sheet: &Sheet, layout: &LayoutConfig) -> Result<Self> {
        let header_row = layout.header_row();
        let label_column = layout.label_column();

        let mut days: [String; DAYS] = Default::default();
        let mut date = String::new();
        for (day, slot) in days.iter_mut().enumerate() {
            let row = layout.grid_first_row + day as u32;
            let label = sheet.value(row, label_column).trim();
            let (name, label_date) = match label.split_once(", ") {
                Some((name, rest)) => (name.trim(), rest.trim()),
                None => (label, ""),
            };
            if name.is_empty() {
                return Err(ScheduleError::Malformed(format!(
                    "{}: missing day label at row {row}",
                    sheet.title
                )));
            }
            if day == 0 {
                date = label_date.to_string();
            }
            *slot = name.to_string();
        }

        let first = sheet.value(header_row, layout.grid_first_column);
        let start_time = block_start(first).ok_or_else(|| {
            ScheduleError::Malformed(format!(
                "{}: cannot read start time from header {first:?}",
                sheet.title
            ))
        })?;
        let block_length = block_start(sheet.value(header_row, layout.grid_first_column + 1))
            .and_then(|next| next.checked_sub(start_time))
            .filter(|len| *len > 0)
            .unwrap_or(1);
        block_length
            .checked_mul(BLOCKS as u32 - 1)
            .and_then(|offset| offset.checked_add(start_time))
            .ok_or_else(|| {
                ScheduleError::Malformed(format!(
                    "{}: blocks of {block_length}h from {start_time} run past the hour range",
                    sheet.title
                ))
            })?;

        for block in 0..BLOCKS as u32 {
            let header = sheet.value(header_row, layout.grid_first_column + block);
            if let Some(hour) = block_start(header) {
                let expected = start_time + block * block_length;
                if hour != expected {
                    return Err(ScheduleError::Malformed(format!(
                        "{}: header {header:?} for block {block} should start at {expected}",
                        sheet.title
                    )));
                }
            }
        }

        Ok(Self {
            grid: Grid::fill(sheet, layout.grid_first_row, layout.grid_first_column),
            days,
            start_time,
            block_length,
            date,
        })
    }

    /// Index of the day whose name matches `name`, ignoring case.
    pub fn day_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.days.iter().position(|d| d.eq_ignore_ascii_case(name))
    }

    /// Name of the day at `day`.
    pub fn day_name(&self, day: usize) -> Option<&str> {
        self.days.get(day).map(String::as_str)
    }

    /// Index of the current day, Monday first.
    pub fn today(&self, now: DateTime<Utc>) -> usize {
        now.weekday().num_days_from_monday() as usize % DAYS
    }

    /// Storage indices rotated so that `today` comes first.
    pub fn display_order(today: usize) -> [usize; DAYS] {
        std::array::from_fn(|i| (today + i) % DAYS)
    }

    /// The six activities of one day.
    pub fn activities_on(&self, day: usize) -> Option<[&str; BLOCKS]> {
        self.grid.values(day)
    }

    /// Start hour of a block.
    pub fn hour_of(&self, block: usize) -> u32 {
        let offset = (block as u32).saturating_mul(self.block_length);
        self.start_time.saturating_add(offset)
    }

    /// Block that starts at `hour`, if any.
    pub fn block_at(&self, hour: u32) -> Option<usize> {
        let offset = hour.checked_sub(self.start_time)?;
        if self.block_length == 0 || offset % self.block_length != 0 {
            return None;
        }
        let block = (offset / self.block_length) as usize;
        (block < BLOCKS).then_some(block)
    }

    /// Every `(day, block)` planned as `activity` that has no note yet.
    pub fn unscheduled(&self, activity: &str) -> Vec<(usize, usize)> {
        self.grid
            .iter()
            .filter(|(_, _, cell)| {
                cell.value.eq_ignore_ascii_case(activity) && cell.note.is_empty()
            })
            .map(|(day, block, _)| (day, block))
            .collect()
    }
}

/// Start hour of a `"start-end"` header label.
fn block_start(header: &str) -> Option<u32> {
    header.split('-').next()?.trim().parse().ok()
}
