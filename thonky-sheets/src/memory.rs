//! In-memory [`DocumentProvider`] backend.
//!
//! Holds documents in process memory and behaves like a remote service:
//! every push bumps the document's modification time, and failures,
//! outages and latency can be injected per sheet. Used by tests and by the
//! CLI, which persists documents as JSON files between runs.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::SheetError;
use crate::provider::DocumentProvider;
use crate::types::{CellUpdate, Document, Sheet};

/// A spreadsheet service backed by a `HashMap` of documents.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    documents: Mutex<HashMap<String, Document>>,
    failing_sheets: Mutex<HashSet<String>>,
    sheet_latency: Mutex<HashMap<String, Duration>>,
    latency: Mutex<Duration>,
    unavailable: AtomicBool,
    fetches: AtomicUsize,
    pushes: AtomicUsize,
    pushed_cells: AtomicUsize,
}

impl MemoryProvider {
    /// Create a provider with no documents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with_document(self, doc: Document) -> Self {
        self.insert(doc);
        self
    }

    /// Add or replace a document.
    pub fn insert(&self, doc: Document) {
        if let Ok(mut docs) = self.documents.lock() {
            docs.insert(doc.id.clone(), doc);
        }
    }

    /// Load a single document from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::Io`] if the file cannot be read or
    /// [`SheetError::Parse`] if it is not a valid document.
    pub fn from_json_file(path: &Path) -> Result<Self, SheetError> {
        let bytes = std::fs::read(path)?;
        let doc: Document = serde_json::from_slice(&bytes).map_err(|e| {
            SheetError::Parse(format!("cannot parse document '{}': {e}", path.display()))
        })?;
        tracing::debug!(doc_id = %doc.id, path = %path.display(), "loaded document");
        Ok(Self::new().with_document(doc))
    }

    /// Write one document to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::DocumentNotFound`] for an unknown id, or
    /// [`SheetError::Io`] / [`SheetError::Parse`] if writing fails.
    pub fn save_json_file(&self, doc_id: &str, path: &Path) -> Result<(), SheetError> {
        let doc = self
            .document(doc_id)
            .ok_or_else(|| SheetError::DocumentNotFound(doc_id.to_string()))?;
        let json = serde_json::to_string_pretty(&doc)
            .map_err(|e| SheetError::Parse(format!("cannot serialize document: {e}")))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Ids of every held document, sorted.
    pub fn document_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .documents
            .lock()
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// A copy of the current state of a document.
    pub fn document(&self, doc_id: &str) -> Option<Document> {
        self.documents.lock().ok()?.get(doc_id).cloned()
    }

    /// Simulate a full outage: every call fails with
    /// [`SheetError::Unavailable`] while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make every fetch of and push to `title` fail.
    pub fn fail_sheet(&self, title: impl Into<String>) {
        if let Ok(mut failing) = self.failing_sheets.lock() {
            failing.insert(title.into());
        }
    }

    /// Remove all injected sheet failures.
    pub fn clear_failures(&self) {
        if let Ok(mut failing) = self.failing_sheets.lock() {
            failing.clear();
        }
    }

    /// Delay applied to every call.
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut l) = self.latency.lock() {
            *l = latency;
        }
    }

    /// Extra delay applied to fetches of one sheet.
    pub fn set_sheet_latency(&self, title: impl Into<String>, latency: Duration) {
        if let Ok(mut map) = self.sheet_latency.lock() {
            map.insert(title.into(), latency);
        }
    }

    /// Overwrite a document's modification time.
    pub fn set_modified(&self, doc_id: &str, modified: DateTime<Utc>) {
        if let Ok(mut docs) = self.documents.lock() {
            if let Some(doc) = docs.get_mut(doc_id) {
                doc.modified = modified;
            }
        }
    }

    /// Simulate someone editing the spreadsheet directly: apply writes
    /// without counting them as pushes and bump the modification time.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError`] if the document or sheet does not exist.
    pub fn external_edit(
        &self,
        doc_id: &str,
        sheet_title: &str,
        updates: &[CellUpdate],
    ) -> Result<(), SheetError> {
        self.with_doc_mut(doc_id, |doc| {
            let sheet = doc.sheet_by_title_mut(sheet_title)?;
            for update in updates {
                sheet.apply(update);
            }
            doc.modified = Utc::now();
            Ok(())
        })
    }

    /// Number of fetch-style calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of successful push batches.
    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    /// Total number of cell writes received across all pushes.
    pub fn pushed_cells(&self) -> usize {
        self.pushed_cells.load(Ordering::SeqCst)
    }

    async fn simulate_call(&self, sheet_title: Option<&str>) -> Result<(), SheetError> {
        let mut delay = self.latency.lock().map(|l| *l).unwrap_or_default();
        if let Some(title) = sheet_title {
            if let Some(extra) = self
                .sheet_latency
                .lock()
                .ok()
                .and_then(|m| m.get(title).copied())
            {
                delay += extra;
            }
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SheetError::Unavailable("provider offline".into()));
        }
        if let Some(title) = sheet_title {
            let failing = self
                .failing_sheets
                .lock()
                .map_err(|_| SheetError::Unavailable("provider state poisoned".into()))?;
            if failing.contains(title) {
                return Err(SheetError::Unavailable(format!(
                    "injected failure for sheet {title}"
                )));
            }
        }
        Ok(())
    }

    fn with_doc<T>(
        &self,
        doc_id: &str,
        f: impl FnOnce(&Document) -> Result<T, SheetError>,
    ) -> Result<T, SheetError> {
        let docs = self
            .documents
            .lock()
            .map_err(|_| SheetError::Unavailable("provider state poisoned".into()))?;
        let doc = docs
            .get(doc_id)
            .ok_or_else(|| SheetError::DocumentNotFound(doc_id.to_string()))?;
        f(doc)
    }

    fn with_doc_mut<T>(
        &self,
        doc_id: &str,
        f: impl FnOnce(&mut Document) -> Result<T, SheetError>,
    ) -> Result<T, SheetError> {
        let mut docs = self
            .documents
            .lock()
            .map_err(|_| SheetError::Unavailable("provider state poisoned".into()))?;
        let doc = docs
            .get_mut(doc_id)
            .ok_or_else(|| SheetError::DocumentNotFound(doc_id.to_string()))?;
        f(doc)
    }
}

impl DocumentProvider for MemoryProvider {
    async fn fetch_document(&self, doc_id: &str) -> Result<Document, SheetError> {
        self.simulate_call(None).await?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.with_doc(doc_id, |doc| Ok(doc.clone()))
    }

    async fn fetch_sheet(&self, doc_id: &str, title: &str) -> Result<Sheet, SheetError> {
        self.simulate_call(Some(title)).await?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(doc_id, sheet = title, "memory fetch_sheet");
        self.with_doc(doc_id, |doc| doc.sheet_by_title(title).cloned())
    }

    async fn list_sheets(&self, doc_id: &str) -> Result<Vec<String>, SheetError> {
        self.simulate_call(None).await?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.with_doc(doc_id, |doc| Ok(doc.sheet_titles()))
    }

    async fn last_modified(&self, doc_id: &str) -> Result<DateTime<Utc>, SheetError> {
        self.simulate_call(None).await?;
        self.with_doc(doc_id, |doc| Ok(doc.modified))
    }

    async fn validation_values(
        &self,
        doc_id: &str,
        sheet_title: &str,
    ) -> Result<Vec<String>, SheetError> {
        self.simulate_call(None).await?;
        self.with_doc(doc_id, |doc| {
            Ok(doc.validations.get(sheet_title).cloned().unwrap_or_default())
        })
    }

    async fn push_updates(
        &self,
        doc_id: &str,
        sheet_title: &str,
        updates: &[CellUpdate],
    ) -> Result<(), SheetError> {
        self.simulate_call(Some(sheet_title)).await?;
        self.with_doc_mut(doc_id, |doc| {
            let sheet = doc.sheet_by_title_mut(sheet_title)?;
            for update in updates {
                sheet.apply(update);
            }
            doc.modified = Utc::now();
            Ok(())
        })?;
        self.pushes.fetch_add(1, Ordering::SeqCst);
        self.pushed_cells.fetch_add(updates.len(), Ordering::SeqCst);
        tracing::debug!(doc_id, sheet = sheet_title, cells = updates.len(), "memory push");
        Ok(())
    }
}
