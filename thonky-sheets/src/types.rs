//! Core types for spreadsheet documents, sheets, and cell writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SheetError;

/// A single spreadsheet cell with its position in the source sheet.
///
/// Coordinates are 0-based and always refer to the sheet the cell was read
/// from, so a cell copied into a schedule grid can be written back later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Displayed cell value.
    pub value: String,
    /// Cell note (comment), empty when unset.
    #[serde(default)]
    pub note: String,
    /// 0-based row in the source sheet.
    pub row: u32,
    /// 0-based column in the source sheet.
    pub column: u32,
}

impl Cell {
    /// An empty cell at the given coordinate.
    pub fn empty(row: u32, column: u32) -> Self {
        Self {
            value: String::new(),
            note: String::new(),
            row,
            column,
        }
    }
}

/// One tab of a spreadsheet document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    /// Tab title, unique within a document.
    pub title: String,
    /// Row-major cells. Rows may be ragged; missing cells read as empty.
    #[serde(default)]
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Create an empty sheet.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    /// Build a sheet from plain values, assigning coordinates row by row.
    pub fn from_values<R, S>(title: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(r, row)| {
                row.into_iter()
                    .enumerate()
                    .map(|(c, value)| Cell {
                        value: value.into(),
                        note: String::new(),
                        row: r as u32,
                        column: c as u32,
                    })
                    .collect()
            })
            .collect();
        Self {
            title: title.into(),
            rows,
        }
    }

    /// The cell at `(row, column)`, if the sheet extends that far.
    pub fn cell(&self, row: u32, column: u32) -> Option<&Cell> {
        self.rows.get(row as usize)?.get(column as usize)
    }

    /// The value at `(row, column)`, or `""` outside the populated area.
    pub fn value(&self, row: u32, column: u32) -> &str {
        self.cell(row, column).map_or("", |c| c.value.as_str())
    }

    /// A copy of the cell at `(row, column)`, or an empty cell carrying that
    /// coordinate when the sheet is shorter.
    pub fn cell_or_empty(&self, row: u32, column: u32) -> Cell {
        self.cell(row, column)
            .cloned()
            .unwrap_or_else(|| Cell::empty(row, column))
    }

    /// Mutable access to a cell, growing the sheet as needed.
    pub fn cell_mut(&mut self, row: u32, column: u32) -> &mut Cell {
        let r = row as usize;
        if self.rows.len() <= r {
            let start = self.rows.len();
            self.rows.extend((start..=r).map(|_| Vec::new()));
        }
        let cells = &mut self.rows[r];
        let c = column as usize;
        if cells.len() <= c {
            let start = cells.len();
            cells.extend((start..=c).map(|i| Cell::empty(row, i as u32)));
        }
        &mut cells[c]
    }

    /// Apply a single write to this sheet.
    pub fn apply(&mut self, update: &CellUpdate) {
        let cell = self.cell_mut(update.row, update.column);
        match &update.change {
            CellChange::Value(value) => cell.value = value.clone(),
            CellChange::Note(note) => cell.note = note.clone(),
        }
    }

    /// Number of rows, including ragged ones.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A whole spreadsheet document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Provider-assigned document id.
    pub id: String,
    /// Last modification time as reported by the provider.
    pub modified: DateTime<Utc>,
    /// Tabs in display order.
    #[serde(default)]
    pub sheets: Vec<Sheet>,
    /// Validation values per sheet title (the allowed dropdown entries).
    #[serde(default)]
    pub validations: BTreeMap<String, Vec<String>>,
}

impl Document {
    /// Create an empty document.
    pub fn new(id: impl Into<String>, modified: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            modified,
            sheets: Vec::new(),
            validations: BTreeMap::new(),
        }
    }

    /// Look up a sheet by exact title.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::SheetNotFound`] if no tab has that title.
    pub fn sheet_by_title(&self, title: &str) -> Result<&Sheet, SheetError> {
        self.sheets
            .iter()
            .find(|s| s.title == title)
            .ok_or_else(|| SheetError::SheetNotFound(title.to_string()))
    }

    /// Mutable variant of [`sheet_by_title`](Self::sheet_by_title).
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::SheetNotFound`] if no tab has that title.
    pub fn sheet_by_title_mut(&mut self, title: &str) -> Result<&mut Sheet, SheetError> {
        self.sheets
            .iter_mut()
            .find(|s| s.title == title)
            .ok_or_else(|| SheetError::SheetNotFound(title.to_string()))
    }

    /// Titles of every tab, in order.
    pub fn sheet_titles(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.title.clone()).collect()
    }

    /// Add a tab, replacing any existing tab with the same title.
    pub fn upsert_sheet(&mut self, sheet: Sheet) {
        match self.sheets.iter_mut().find(|s| s.title == sheet.title) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
    }
}

/// What a write changes in a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum CellChange {
    /// Replace the displayed value.
    Value(String),
    /// Replace the note.
    Note(String),
}

/// A queued write to one cell of one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellUpdate {
    /// 0-based row.
    pub row: u32,
    /// 0-based column.
    pub column: u32,
    /// The new content.
    pub change: CellChange,
}

impl CellUpdate {
    /// A value write.
    pub fn value(row: u32, column: u32, value: impl Into<String>) -> Self {
        Self {
            row,
            column,
            change: CellChange::Value(value.into()),
        }
    }

    /// A note write.
    pub fn note(row: u32, column: u32, note: impl Into<String>) -> Self {
        Self {
            row,
            column,
            change: CellChange::Note(note.into()),
        }
    }
}
