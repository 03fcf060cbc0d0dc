//! Per-player availability and the roster scan.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thonky_sheets::Sheet;

use super::grid::{BLOCKS, Grid};
use crate::config::LayoutConfig;

/// One team member's availability grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub grid: Grid,
    pub name: String,
    pub role: String,
}

impl Player {
    /// Build a player from their availability sheet.
    pub fn from_sheet(entry: RosterEntry, sheet: &Sheet, layout: &LayoutConfig) -> Self {
        Self {
            grid: Grid::fill(sheet, layout.grid_first_row, layout.grid_first_column),
            name: entry.name,
            role: entry.role,
        }
    }

    /// The six responses of one day.
    pub fn availability_on(&self, day: usize) -> Option<[&str; BLOCKS]> {
        self.grid.values(day)
    }

    /// The response for the block starting at `hour` on a grid whose first
    /// block starts at `start_time`.
    pub fn availability_at(&self, day: usize, hour: u32, start_time: u32) -> Option<&str> {
        let block = hour.checked_sub(start_time)? as usize;
        self.grid.cell(day, block).map(|c| c.value.as_str())
    }
}

/// A roster row with a player name and its resolved role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub name: String,
    pub role: String,
}

/// Scan the roster's candidate rows top to bottom.
///
/// Rows without a name are skipped. A blank role cell inherits the last
/// non-blank role above it, even across skipped rows.
pub fn roster_entries(sheet: &Sheet, layout: &LayoutConfig) -> Vec<RosterEntry> {
    let mut role = String::new();
    let mut entries = Vec::new();
    for row in layout.roster_first_row..layout.roster_end_row {
        let role_cell = sheet.value(row, layout.role_column).trim();
        if !role_cell.is_empty() {
            role = role_cell.to_string();
        }
        let name = sheet.value(row, layout.name_column).trim();
        if name.is_empty() {
            continue;
        }
        entries.push(RosterEntry {
            name: name.to_string(),
            role: role.clone(),
        });
    }
    entries
}

/// Per role, how many players answered `"Yes"` for each block of `day`.
pub fn role_availability(players: &[Player], day: usize) -> BTreeMap<String, [usize; BLOCKS]> {
    let mut counts: BTreeMap<String, [usize; BLOCKS]> = BTreeMap::new();
    for player in players {
        let Some(responses) = player.availability_on(day) else {
            continue;
        };
        let slot = counts.entry(player.role.clone()).or_default();
        for (count, response) in slot.iter_mut().zip(responses) {
            if response.eq_ignore_ascii_case("yes") {
                *count += 1;
            }
        }
    }
    counts
}
