//! Conditional writes of resolved values into a grid.
//!
//! Applying mutates the grid in place and records only the cells whose
//! content actually changed, so a repeated edit queues nothing and the
//! following sync makes no remote call.

use thonky_sheets::CellUpdate;

use crate::error::{Result, ScheduleError};
use crate::resolve::Resolution;
use crate::schedule::Grid;

/// Which part of a cell an edit writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// The displayed value.
    Value,
    /// The cell note.
    Note,
}

/// Cell writes queued for one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingEdit {
    /// Title of the sheet the writes belong to.
    pub sheet: String,
    pub updates: Vec<CellUpdate>,
}

impl PendingEdit {
    pub fn new(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            updates: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Append the writes of another edit to the same sheet.
    pub fn extend(&mut self, other: PendingEdit) {
        self.updates.extend(other.updates);
    }
}

/// Note spellings that clear a note.
const CLEAR_NOTE: [&str; 3] = ["empty", "none", "blank"];

fn canonical_note(note: &str) -> &str {
    if CLEAR_NOTE.iter().any(|c| c.eq_ignore_ascii_case(note)) {
        ""
    } else {
        note
    }
}

/// Write `resolution` into row `day` of `grid`.
///
/// # Errors
///
/// Returns [`ScheduleError::Malformed`] when the grid was never filled from
/// a sheet, since its cells have no coordinate to write back to, and
/// [`ScheduleError::UnknownDay`] when `day` is outside the grid.
pub fn apply(
    grid: &mut Grid,
    sheet: &str,
    day: usize,
    resolution: &Resolution,
    mode: ApplyMode,
) -> Result<PendingEdit> {
    if !grid.is_bound() {
        return Err(ScheduleError::Malformed(format!(
            "{sheet}: grid is not bound to a sheet"
        )));
    }
    if grid.row(day).is_none() {
        return Err(ScheduleError::UnknownDay(day.to_string()));
    }

    let mut pending = PendingEdit::new(sheet);
    for (block, value) in resolution.pairs() {
        let Some(cell) = grid.cell_mut(day, block) else {
            continue;
        };
        match mode {
            ApplyMode::Value => {
                if cell.value == value {
                    continue;
                }
                cell.value = value.to_string();
                pending
                    .updates
                    .push(CellUpdate::value(cell.row, cell.column, value));
            }
            ApplyMode::Note => {
                let note = canonical_note(value);
                if cell.note == note {
                    continue;
                }
                cell.note = note.to_string();
                pending
                    .updates
                    .push(CellUpdate::note(cell.row, cell.column, note));
            }
        }
    }
    Ok(pending)
}
