//! Error types for the thonky-sheets crate.
//!
//! Messages name documents and sheets but never cell contents, so they are
//! safe to log and to surface to chat users.

/// Errors that can occur while talking to a remote spreadsheet.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    /// The provider could not be reached or returned a transport error.
    #[error("document provider unavailable: {0}")]
    Unavailable(String),

    /// No document exists with the requested id.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// The document has no sheet with the requested title.
    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    /// A request did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// A document could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Local I/O failure while loading or saving a document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for thonky-sheets results.
pub type Result<T> = std::result::Result<T, SheetError>;
