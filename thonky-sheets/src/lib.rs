//! # thonky-sheets
//!
//! The remote spreadsheet capability used by the thonky schedule cache.
//!
//! ## Design
//!
//! - [`DocumentProvider`] is the only seam between the cache and a
//!   spreadsheet service: fetch a document or one sheet, read the last
//!   modification time and validation values, and push batched cell writes
//! - [`Cell`] values keep the (row, column) they were read from so edits can
//!   be written back without a lookup
//! - [`MemoryProvider`] is a complete in-process backend with failure,
//!   outage and latency injection
//! - [`template`] builds documents in the team availability layout
//!
//! Authentication against a hosted spreadsheet service is the concern of a
//! concrete provider and is not modelled here.

pub mod error;
pub mod memory;
pub mod provider;
pub mod template;
pub mod types;

pub use error::{Result, SheetError};
pub use memory::MemoryProvider;
pub use provider::DocumentProvider;
pub use types::{Cell, CellChange, CellUpdate, Document, Sheet};
