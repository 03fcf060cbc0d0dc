//! Fixed-shape day × block grid of spreadsheet cells.

use serde::{Deserialize, Serialize};
use thonky_sheets::{Cell, Sheet};

/// Days in a week grid.
pub const DAYS: usize = 7;

/// Time blocks per day.
pub const BLOCKS: usize = 6;

/// 7 × 6 cells indexed by `(day, block)`.
///
/// A grid filled from a sheet is *bound*: each cell remembers the sheet
/// coordinate it was read from, so edits can be written back in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cells: [[Cell; BLOCKS]; DAYS],
    bound: bool,
}

impl Grid {
    /// An empty, unbound grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the 7 × 6 rectangle whose top-left cell is
    /// `(first_row, first_column)`.
    ///
    /// Cells past the end of a short sheet read as empty but keep their
    /// coordinate.
    pub fn fill(sheet: &Sheet, first_row: u32, first_column: u32) -> Self {
        let cells = std::array::from_fn(|day| {
            std::array::from_fn(|block| {
                sheet.cell_or_empty(first_row + day as u32, first_column + block as u32)
            })
        });
        Self { cells, bound: true }
    }

    /// Whether the grid was filled from a sheet.
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn cell(&self, day: usize, block: usize) -> Option<&Cell> {
        self.cells.get(day)?.get(block)
    }

    pub(crate) fn cell_mut(&mut self, day: usize, block: usize) -> Option<&mut Cell> {
        self.cells.get_mut(day)?.get_mut(block)
    }

    /// The six cells of one day.
    pub fn row(&self, day: usize) -> Option<&[Cell; BLOCKS]> {
        self.cells.get(day)
    }

    /// The six values of one day.
    pub fn values(&self, day: usize) -> Option<[&str; BLOCKS]> {
        let row = self.row(day)?;
        Some(std::array::from_fn(|block| row[block].value.as_str()))
    }

    /// Every cell in storage order, with its `(day, block)` index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Cell)> {
        self.cells.iter().enumerate().flat_map(|(day, row)| {
            row.iter()
                .enumerate()
                .map(move |(block, cell)| (day, block, cell))
        })
    }
}
