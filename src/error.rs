//! Error types for the schedule cache.

use thonky_sheets::SheetError;

/// Validation failures from turning command tokens into a cell span.
///
/// Every variant carries the offending token or count so callers can echo
/// it back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// A time earlier than the first block.
    #[error("invalid start time: {time} is before the first block at {start}")]
    InvalidStartTime { time: u32, start: u32 },

    /// A range whose first time is after its second.
    #[error("invalid time range {token}: first time is after second time")]
    InvertedRange { token: String },

    /// A time past the last block of the day.
    #[error("invalid time: {time} is after the last block at {last}")]
    TimeOutOfRange { time: u32, last: u32 },

    /// The number of values fits neither broadcast nor one-to-one.
    #[error("invalid amount of values for this range: {cells} cells, {values} values")]
    ArgumentCountMismatch { cells: usize, values: usize },

    /// A value not in the list of allowed values.
    #[error("invalid activity: {0:?}")]
    InvalidActivity(String),
}

/// Top-level error type for schedule cache operations.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// The document provider could not be reached.
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// A named sheet is missing from the document.
    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    /// Another update of the same document is in flight.
    #[error("already updating schedule {0}")]
    AlreadyUpdating(String),

    /// Command tokens did not resolve to a valid edit.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// One or more player sheets could not be fetched.
    #[error("failed to fetch {} player sheet(s) ({}): {reason}", .failed.len(), .failed.join(", "))]
    PartialFetchFailure { failed: Vec<String>, reason: String },

    /// A remote call exceeded its deadline.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The document does not have the expected layout, or local state is
    /// unusable.
    #[error("malformed schedule: {0}")]
    Malformed(String),

    /// No day label matches the token.
    #[error("invalid day {0:?}")]
    UnknownDay(String),

    /// No player name matches the token.
    #[error("invalid player {0:?}")]
    UnknownPlayer(String),

    /// No default week has been saved for this document.
    #[error("no default week schedule for {0}")]
    NoDefaultWeek(String),

    /// A team already owns the channel.
    #[error("channel {channel} already occupied by {team:?}")]
    ChannelOccupied { channel: String, team: String },

    /// Snapshot store failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScheduleError {
    /// Whether the caller can recover by fixing its input, as opposed to an
    /// I/O or remote failure that aborted the operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Range(_) | Self::UnknownDay(_) | Self::UnknownPlayer(_)
        )
    }
}

impl From<SheetError> for ScheduleError {
    fn from(err: SheetError) -> Self {
        match err {
            SheetError::SheetNotFound(title) => Self::SheetNotFound(title),
            SheetError::Timeout(msg) => Self::Timeout(msg),
            SheetError::Parse(msg) => Self::Malformed(msg),
            SheetError::Io(e) => Self::Io(e),
            other @ (SheetError::Unavailable(_) | SheetError::DocumentNotFound(_)) => {
                Self::RemoteUnavailable(other.to_string())
            }
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ScheduleError>;
