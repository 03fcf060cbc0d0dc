//! Trait definition for remote spreadsheet backends.
//!
//! The schedule cache only ever talks to a spreadsheet through
//! [`DocumentProvider`], so tests and the CLI can swap in
//! [`MemoryProvider`](crate::memory::MemoryProvider) for a real client.

use chrono::{DateTime, Utc};
use std::future::Future;

use crate::error::SheetError;
use crate::types::{CellUpdate, Document, Sheet};

/// A remote, slow, rate-limited spreadsheet service.
///
/// Every method is one round trip. Implementations own their own transport
/// concerns (auth, retries, quotas); callers bound latency with timeouts.
///
/// All implementations must be `Send + Sync` and return `Send` futures so a
/// provider can be shared across concurrently spawned fetch tasks.
pub trait DocumentProvider: Send + Sync {
    /// Fetch a whole document, every sheet included.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::DocumentNotFound`] for an unknown id or
    /// [`SheetError::Unavailable`] on transport failure.
    fn fetch_document(
        &self,
        doc_id: &str,
    ) -> impl Future<Output = Result<Document, SheetError>> + Send;

    /// Fetch a single sheet by title.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::SheetNotFound`] if the document has no such tab.
    fn fetch_sheet(
        &self,
        doc_id: &str,
        title: &str,
    ) -> impl Future<Output = Result<Sheet, SheetError>> + Send;

    /// List sheet titles in display order.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError`] on transport failure or unknown document.
    fn list_sheets(
        &self,
        doc_id: &str,
    ) -> impl Future<Output = Result<Vec<String>, SheetError>> + Send;

    /// The document's last modification time.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError`] on transport failure or unknown document.
    fn last_modified(
        &self,
        doc_id: &str,
    ) -> impl Future<Output = Result<DateTime<Utc>, SheetError>> + Send;

    /// The values allowed by the validation rules of one sheet.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError`] on transport failure or unknown document.
    fn validation_values(
        &self,
        doc_id: &str,
        sheet_title: &str,
    ) -> impl Future<Output = Result<Vec<String>, SheetError>> + Send;

    /// Push a batch of value/note writes to one sheet.
    ///
    /// The batch is applied as a unit: on error none of it is visible.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::SheetNotFound`] if the sheet is missing or
    /// [`SheetError::Unavailable`] on transport failure.
    fn push_updates(
        &self,
        doc_id: &str,
        sheet_title: &str,
        updates: &[CellUpdate],
    ) -> impl Future<Output = Result<(), SheetError>> + Send;
}
