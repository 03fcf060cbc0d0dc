//! Schedule cache: a local, freshness-checked copy of one remote document.
//!
//! # Freshness protocol
//!
//! - [`ScheduleCache::is_stale`] reads the remote modification time and
//!   remembers it as the *observed* timestamp
//! - [`ScheduleCache::update`] repopulates players, then the week, then
//!   reconciles the timestamp (adopting the observed one when it is newer,
//!   otherwise asking the remote) and finally refreshes the allowed
//!   activities
//! - [`ScheduleCache::sync_sheet`] pushes queued cell writes and, on
//!   success, moves `last_modified` to now so our own write does not make
//!   the cache look stale
//!
//! State lives behind a `std::sync::RwLock` that is never held across an
//! `.await`. An update builds the new state in locals, persists it, and only
//! then swaps it in, so a failed update leaves the previous data untouched.

pub mod populate;
pub mod snapshot;

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use thonky_sheets::DocumentProvider;
use tracing::{debug, info, warn};

use crate::apply::PendingEdit;
use crate::config::ThonkyConfig;
use crate::error::{Result, ScheduleError};
use crate::schedule::{Player, Week};
use populate::{fetch_players, timed};
pub use snapshot::{CacheSnapshot, JsonFileStore, SNAPSHOT_VERSION, SnapshotStore};

/// Everything an update replaces at once.
#[derive(Debug, Clone)]
pub(crate) struct CacheState {
    pub(crate) week: Week,
    pub(crate) players: Vec<Player>,
    pub(crate) valid_activities: Vec<String>,
    pub(crate) last_modified: DateTime<Utc>,
    /// Remote timestamp seen by the last staleness check.
    pub(crate) observed: Option<DateTime<Utc>>,
}

impl CacheState {
    fn empty() -> Self {
        Self {
            week: Week::default(),
            players: Vec::new(),
            valid_activities: Vec::new(),
            last_modified: DateTime::<Utc>::MIN_UTC,
            observed: None,
        }
    }

    fn from_snapshot(snapshot: CacheSnapshot) -> Self {
        Self {
            week: snapshot.week,
            players: snapshot.players,
            valid_activities: snapshot.valid_activities,
            last_modified: snapshot.last_modified,
            observed: None,
        }
    }

    fn to_snapshot(&self, id: &str) -> CacheSnapshot {
        CacheSnapshot {
            version: SNAPSHOT_VERSION,
            id: id.to_string(),
            last_modified: self.last_modified,
            week: self.week.clone(),
            players: self.players.clone(),
            valid_activities: self.valid_activities.clone(),
        }
    }

    pub(crate) fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        let name = name.trim();
        self.players
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// Clears the in-flight flag when an update ends, however it ends.
struct UpdateGuard<'a>(&'a AtomicBool);

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Cached schedule of one remote document.
pub struct ScheduleCache<P> {
    id: String,
    provider: Arc<P>,
    config: ThonkyConfig,
    store: Option<Arc<dyn SnapshotStore>>,
    state: RwLock<CacheState>,
    updating: AtomicBool,
}

impl<P> std::fmt::Debug for ScheduleCache<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleCache")
            .field("id", &self.id)
            .field("updating", &self.updating.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<P: DocumentProvider + 'static> ScheduleCache<P> {
    /// An empty cache. Nothing is fetched until [`update`](Self::update).
    pub fn new(provider: Arc<P>, id: impl Into<String>, config: ThonkyConfig) -> Self {
        Self {
            id: id.into(),
            provider,
            config,
            store: None,
            state: RwLock::new(CacheState::empty()),
            updating: AtomicBool::new(false),
        }
    }

    /// Persist every successful update through `store`.
    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Open a cache, preferring a stored snapshot over a full population.
    ///
    /// The snapshot is adopted when the remote document has not been
    /// modified since it was taken; otherwise the cache is populated from
    /// the remote.
    ///
    /// # Errors
    ///
    /// Returns any error from reading the store, checking the remote
    /// timestamp, or the fallback [`update`](Self::update).
    pub async fn open(
        provider: Arc<P>,
        id: impl Into<String>,
        config: ThonkyConfig,
        store: Option<Arc<dyn SnapshotStore>>,
    ) -> Result<Self> {
        let mut cache = Self::new(provider, id, config);
        let snapshot = match &store {
            Some(store) => store.load(&cache.id)?,
            None => None,
        };
        cache.store = store;

        let Some(snapshot) = snapshot else {
            cache.update().await?;
            return Ok(cache);
        };

        let remote = timed(
            cache.config.fetch.timeout(),
            "last modified",
            cache.provider.last_modified(&cache.id),
        )
        .await?;
        if remote > snapshot.last_modified {
            debug!(doc_id = %cache.id, %remote, stored = %snapshot.last_modified, "snapshot is stale");
            cache.update().await?;
        } else {
            info!(doc_id = %cache.id, players = snapshot.players.len(), "adopted stored snapshot");
            let mut state = CacheState::from_snapshot(snapshot);
            state.observed = Some(remote);
            cache.state = RwLock::new(state);
        }
        Ok(cache)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &ThonkyConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub(crate) fn store(&self) -> Option<&Arc<dyn SnapshotStore>> {
        self.store.as_ref()
    }

    /// Whether an update is in flight.
    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::Acquire)
    }

    /// Whether the remote document changed after the cached data.
    ///
    /// Records the remote timestamp so a following [`update`](Self::update)
    /// can adopt it without asking again.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::RemoteUnavailable`] or
    /// [`ScheduleError::Timeout`] when the remote cannot be asked.
    pub async fn is_stale(&self) -> Result<bool> {
        let remote = timed(
            self.config.fetch.timeout(),
            "last modified",
            self.provider.last_modified(&self.id),
        )
        .await?;
        self.write(|state| {
            state.observed = Some(remote);
            let stale = remote > state.last_modified;
            debug!(doc_id = %self.id, %remote, cached = %state.last_modified, stale, "staleness check");
            Ok(stale)
        })
    }

    /// Repopulate the whole cache from the remote document.
    ///
    /// # Errors
    ///
    /// - [`ScheduleError::AlreadyUpdating`] when another update of this
    ///   cache is in flight; that update is not affected
    /// - [`ScheduleError::PartialFetchFailure`] when a player sheet fails
    /// - any error from the week sheet, the timestamp, the validation
    ///   values, or persisting the snapshot
    ///
    /// On error no cached field changes.
    pub async fn update(&self) -> Result<()> {
        let _guard = self.begin_update()?;
        let started = Instant::now();
        let layout = &self.config.layout;
        let timeout = self.config.fetch.timeout();

        let players = fetch_players(&self.provider, &self.id, &self.config).await?;

        let week_sheet = timed(
            timeout,
            "week sheet",
            self.provider.fetch_sheet(&self.id, &layout.week_sheet),
        )
        .await?;
        let week = Week::parse(&week_sheet, layout)?;

        let (stored, observed) = self.read(|state| Ok((state.last_modified, state.observed)))?;
        let last_modified = match observed {
            Some(observed) if observed > stored => observed,
            _ => {
                timed(
                    timeout,
                    "last modified",
                    self.provider.last_modified(&self.id),
                )
                .await?
            }
        };

        let valid_activities = timed(
            timeout,
            "validation values",
            self.provider
                .validation_values(&self.id, &layout.week_sheet),
        )
        .await?;

        let next = CacheState {
            week,
            players,
            valid_activities,
            last_modified,
            observed: Some(last_modified),
        };
        if let Some(store) = &self.store {
            store.save(&next.to_snapshot(&self.id))?;
        }

        let player_count = next.players.len();
        self.write(|state| {
            *state = next;
            Ok(())
        })?;
        info!(
            doc_id = %self.id,
            players = player_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "schedule updated"
        );
        Ok(())
    }

    /// Run [`update`](Self::update) only when the remote is newer.
    ///
    /// Returns whether an update ran.
    ///
    /// # Errors
    ///
    /// Returns any error from the staleness check or the update.
    pub async fn refresh_if_stale(&self) -> Result<bool> {
        if !self.is_stale().await? {
            debug!(doc_id = %self.id, "schedule is fresh");
            return Ok(false);
        }
        self.update().await?;
        Ok(true)
    }

    /// Push queued writes to the remote in one call.
    ///
    /// An empty edit makes no remote call. A failed push leaves the local
    /// values as they are but does not advance `last_modified`.
    ///
    /// # Errors
    ///
    /// Returns the provider error when the push fails.
    pub async fn sync_sheet(&self, pending: PendingEdit) -> Result<()> {
        if pending.is_empty() {
            debug!(doc_id = %self.id, sheet = %pending.sheet, "nothing to sync");
            return Ok(());
        }
        timed(
            self.config.fetch.timeout(),
            "push",
            self.provider
                .push_updates(&self.id, &pending.sheet, &pending.updates),
        )
        .await?;

        let snapshot = self.write(|state| {
            state.last_modified = Utc::now();
            Ok(state.to_snapshot(&self.id))
        })?;
        info!(doc_id = %self.id, sheet = %pending.sheet, changed = pending.len(), "synced edits");

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&snapshot) {
                warn!(doc_id = %self.id, error = %e, "failed to persist snapshot after sync");
            }
        }
        Ok(())
    }

    /// A copy of the cached week.
    pub fn week(&self) -> Result<Week> {
        self.read(|state| Ok(state.week.clone()))
    }

    /// A copy of the cached players, in population order.
    pub fn players(&self) -> Result<Vec<Player>> {
        self.read(|state| Ok(state.players.clone()))
    }

    /// A copy of one player, matched ignoring case.
    pub fn player(&self, name: &str) -> Result<Player> {
        self.read(|state| {
            state
                .players
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
                .cloned()
                .ok_or_else(|| ScheduleError::UnknownPlayer(name.to_string()))
        })
    }

    /// Activities allowed in week cells.
    pub fn valid_activities(&self) -> Result<Vec<String>> {
        self.read(|state| Ok(state.valid_activities.clone()))
    }

    /// Remote timestamp the cached data corresponds to.
    pub fn last_modified(&self) -> Result<DateTime<Utc>> {
        self.read(|state| Ok(state.last_modified))
    }

    /// Whether the cache holds a week read from the remote or a snapshot.
    pub fn is_populated(&self) -> Result<bool> {
        self.read(|state| Ok(state.week.grid.is_bound()))
    }

    /// The current state in its persisted form.
    pub fn snapshot(&self) -> Result<CacheSnapshot> {
        self.read(|state| Ok(state.to_snapshot(&self.id)))
    }

    fn begin_update(&self) -> Result<UpdateGuard<'_>> {
        if self
            .updating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(doc_id = %self.id, "update rejected, another is in flight");
            return Err(ScheduleError::AlreadyUpdating(self.id.clone()));
        }
        Ok(UpdateGuard(&self.updating))
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&CacheState) -> Result<T>) -> Result<T> {
        let state = self
            .state
            .read()
            .map_err(|_| ScheduleError::Malformed("schedule state lock poisoned".into()))?;
        f(&state)
    }

    pub(crate) fn write<T>(&self, f: impl FnOnce(&mut CacheState) -> Result<T>) -> Result<T> {
        let mut state = self
            .state
            .write()
            .map_err(|_| ScheduleError::Malformed("schedule state lock poisoned".into()))?;
        f(&mut state)
    }
}
