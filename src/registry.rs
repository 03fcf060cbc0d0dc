//! Guild and team configuration with one shared schedule cache per document.
//!
//! A guild has a document of its own and may split into teams, each owning
//! a set of channels and usually its own document. A command issued in a
//! team channel addresses that team's schedule; anywhere else it addresses
//! the guild's.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};

use thonky_sheets::DocumentProvider;
use tracing::{info, warn};

use crate::cache::ScheduleCache;
use crate::error::{Result, ScheduleError};

/// A team inside a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    /// Channel ids owned by this team.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Document holding this team's schedule.
    pub doc_key: String,
}

/// Per-guild configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildConfig {
    pub guild_id: String,
    /// Document holding the guild-wide schedule.
    pub doc_key: String,
    /// Channel that receives reminders.
    #[serde(default)]
    pub announce_channel: String,
    /// Role mentioned in reminders.
    #[serde(default)]
    pub role_mention: String,
    /// Activities that trigger a reminder.
    #[serde(default)]
    pub remind_activities: Vec<String>,
    #[serde(default)]
    pub teams: Vec<TeamConfig>,
}

impl GuildConfig {
    pub fn new(guild_id: impl Into<String>, doc_key: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            doc_key: doc_key.into(),
            announce_channel: String::new(),
            role_mention: String::new(),
            remind_activities: Vec::new(),
            teams: Vec::new(),
        }
    }

    /// The team owning `channel`, if any.
    pub fn team_for(&self, channel: &str) -> Option<&TeamConfig> {
        self.teams
            .iter()
            .find(|t| t.channels.iter().any(|c| c == channel))
    }
}

/// Which schedule a channel addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelScope {
    pub guild_id: String,
    /// Team name, or `None` for the guild-wide schedule.
    pub team: Option<String>,
    pub doc_key: String,
}

/// Outcome of [`Registry::refresh_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Documents that were stale and got updated.
    pub refreshed: Vec<String>,
    /// Documents that were already fresh.
    pub fresh: Vec<String>,
    /// Documents whose refresh failed, with the error message.
    pub failed: Vec<(String, String)>,
}

/// Guild configurations and the schedule caches they point at.
pub struct Registry<P> {
    guilds: RwLock<BTreeMap<String, GuildConfig>>,
    schedules: RwLock<HashMap<String, Arc<ScheduleCache<P>>>>,
}

impl<P> Default for Registry<P> {
    fn default() -> Self {
        Self {
            guilds: RwLock::new(BTreeMap::new()),
            schedules: RwLock::new(HashMap::new()),
        }
    }
}

fn poisoned<T>(_: T) -> ScheduleError {
    ScheduleError::Malformed("registry lock poisoned".into())
}

impl<P: DocumentProvider + 'static> Registry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a guild.
    pub fn add_guild(&self, config: GuildConfig) -> Result<()> {
        let mut guilds = self.guilds.write().map_err(poisoned)?;
        info!(guild = %config.guild_id, doc_key = %config.doc_key, "guild registered");
        guilds.insert(config.guild_id.clone(), config);
        Ok(())
    }

    /// Remove a guild, returning its configuration.
    pub fn remove_guild(&self, guild_id: &str) -> Result<Option<GuildConfig>> {
        let mut guilds = self.guilds.write().map_err(poisoned)?;
        Ok(guilds.remove(guild_id))
    }

    pub fn guild(&self, guild_id: &str) -> Result<Option<GuildConfig>> {
        let guilds = self.guilds.read().map_err(poisoned)?;
        Ok(guilds.get(guild_id).cloned())
    }

    /// All guilds, ordered by id.
    pub fn guilds(&self) -> Result<Vec<GuildConfig>> {
        let guilds = self.guilds.read().map_err(poisoned)?;
        Ok(guilds.values().cloned().collect())
    }

    /// Add a team to a guild.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::ChannelOccupied`] if another team of the
    /// guild already owns one of the team's channels, and
    /// [`ScheduleError::Config`] for an unknown guild.
    pub fn add_team(&self, guild_id: &str, team: TeamConfig) -> Result<()> {
        let mut guilds = self.guilds.write().map_err(poisoned)?;
        let guild = guilds
            .get_mut(guild_id)
            .ok_or_else(|| ScheduleError::Config(format!("unknown guild {guild_id}")))?;
        for channel in &team.channels {
            if let Some(owner) = guild.team_for(channel) {
                return Err(ScheduleError::ChannelOccupied {
                    channel: channel.clone(),
                    team: owner.name.clone(),
                });
            }
        }
        info!(guild = guild_id, team = %team.name, "team registered");
        guild.teams.push(team);
        Ok(())
    }

    /// Resolve which schedule `channel` addresses: its team's when a team
    /// owns the channel, otherwise the guild's.
    pub fn find(&self, guild_id: &str, channel: &str) -> Result<Option<ChannelScope>> {
        let guilds = self.guilds.read().map_err(poisoned)?;
        let Some(guild) = guilds.get(guild_id) else {
            return Ok(None);
        };
        let scope = match guild.team_for(channel) {
            Some(team) => ChannelScope {
                guild_id: guild.guild_id.clone(),
                team: Some(team.name.clone()),
                doc_key: team.doc_key.clone(),
            },
            None => ChannelScope {
                guild_id: guild.guild_id.clone(),
                team: None,
                doc_key: guild.doc_key.clone(),
            },
        };
        Ok(Some(scope))
    }

    /// Share `cache` with every guild or team whose document it holds.
    pub fn attach_schedule(&self, cache: Arc<ScheduleCache<P>>) -> Result<()> {
        let mut schedules = self.schedules.write().map_err(poisoned)?;
        schedules.insert(cache.id().to_string(), cache);
        Ok(())
    }

    pub fn schedule(&self, doc_key: &str) -> Result<Option<Arc<ScheduleCache<P>>>> {
        let schedules = self.schedules.read().map_err(poisoned)?;
        Ok(schedules.get(doc_key).cloned())
    }

    /// The cache of the schedule `channel` addresses.
    pub fn schedule_for(
        &self,
        guild_id: &str,
        channel: &str,
    ) -> Result<Option<Arc<ScheduleCache<P>>>> {
        match self.find(guild_id, channel)? {
            Some(scope) => self.schedule(&scope.doc_key),
            None => Ok(None),
        }
    }

    /// Refresh every attached cache concurrently.
    ///
    /// A failure is logged and reported for its document only; the other
    /// refreshes carry on.
    pub async fn refresh_all(&self) -> Result<RefreshReport> {
        let caches: Vec<Arc<ScheduleCache<P>>> = {
            let schedules = self.schedules.read().map_err(poisoned)?;
            schedules.values().cloned().collect()
        };

        let outcomes = join_all(caches.iter().map(|cache| async move {
            (cache.id().to_string(), cache.refresh_if_stale().await)
        }))
        .await;

        let mut report = RefreshReport::default();
        for (doc_id, outcome) in outcomes {
            match outcome {
                Ok(true) => report.refreshed.push(doc_id),
                Ok(false) => report.fresh.push(doc_id),
                Err(e) => {
                    warn!(doc_id = %doc_id, error = %e, "schedule refresh failed");
                    report.failed.push((doc_id, e.to_string()));
                }
            }
        }
        report.refreshed.sort();
        report.fresh.sort();
        report.failed.sort();
        Ok(report)
    }

    /// Load guild configurations from a JSON file, replacing the current
    /// ones. A missing file leaves the registry empty.
    pub fn load(&self, path: &Path) -> Result<()> {
        let configs: Vec<GuildConfig> = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ScheduleError::Config(format!("failed to parse {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        let mut guilds = self.guilds.write().map_err(poisoned)?;
        *guilds = configs
            .into_iter()
            .map(|g| (g.guild_id.clone(), g))
            .collect();
        info!(path = %path.display(), guilds = guilds.len(), "loaded guild configs");
        Ok(())
    }

    /// Save guild configurations to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let configs = self.guilds()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(&configs)
            .map_err(|e| ScheduleError::Config(format!("failed to serialize guilds: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
