//! Thonky: a local schedule cache and grid-update engine for team
//! availability spreadsheets.
//!
//! The remote spreadsheet is slow and rate limited, so reads are served from
//! a cached copy that is only refreshed when the remote has changed, and
//! edits are written locally first and pushed as one batch of changed cells.
//!
//! # Architecture
//!
//! - **Schedule model** ([`schedule`]): a fixed 7-day × 6-block [`Grid`]
//!   shared by the team [`Week`] and each [`Player`]'s availability
//! - **Cache** ([`cache`]): one [`ScheduleCache`] per document, with the
//!   staleness check, the concurrent per-player population, and snapshot
//!   persistence
//! - **Resolver** ([`resolve`]): command tokens such as `4-6 Scrim, Free` to
//!   a span of blocks and validated values
//! - **Apply/Sync** ([`apply`], [`edit`]): conditional cell writes and the
//!   batched push back to the remote
//! - **Registry** ([`registry`]): guild and team configuration pointing at
//!   shared caches
//! - **Reminders** ([`reminders`]): upcoming activities for a periodic caller
//!
//! The remote document itself is reached through
//! [`thonky_sheets::DocumentProvider`].

pub mod apply;
pub mod cache;
pub mod config;
pub mod edit;
pub mod error;
pub mod registry;
pub mod reminders;
pub mod resolve;
pub mod schedule;

pub use apply::{ApplyMode, PendingEdit};
pub use cache::{CacheSnapshot, JsonFileStore, ScheduleCache, SnapshotStore};
pub use config::ThonkyConfig;
pub use edit::EditOutcome;
pub use error::{RangeError, Result, ScheduleError};
pub use registry::{ChannelScope, GuildConfig, RefreshReport, Registry, TeamConfig};
pub use reminders::{Announcement, Reminder, next_reminder};
pub use resolve::{Resolution, resolve};
pub use schedule::{Grid, Player, Week};
