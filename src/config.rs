//! Configuration types for the schedule cache.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, ScheduleError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThonkyConfig {
    /// Where things live in the spreadsheet.
    pub layout: LayoutConfig,
    /// Remote fetch behaviour.
    pub fetch: FetchConfig,
    /// Allowed player responses.
    pub responses: ResponseConfig,
    /// Local snapshot cache.
    pub cache: CacheConfig,
    /// Reminder evaluation.
    pub reminders: ReminderConfig,
}

/// Sheet titles and cell offsets of the team availability template.
///
/// All rows and columns are 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Title of the shared week schedule sheet.
    pub week_sheet: String,
    /// Title of the roster sheet.
    pub roster_sheet: String,
    /// First roster row that may hold a player.
    pub roster_first_row: u32,
    /// Roster row one past the last candidate.
    pub roster_end_row: u32,
    /// Roster column holding the role group label.
    pub role_column: u32,
    /// Roster column holding the player name.
    pub name_column: u32,
    /// Sheet row of day 0 in week and player grids.
    pub grid_first_row: u32,
    /// Sheet column of block 0 in week and player grids.
    pub grid_first_column: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            week_sheet: "Weekly Schedule".into(),
            roster_sheet: "Team Availability".into(),
            roster_first_row: 3,
            roster_end_row: 15,
            role_column: 1,
            name_column: 2,
            grid_first_row: 2,
            grid_first_column: 2,
        }
    }
}

impl LayoutConfig {
    /// Number of candidate roster rows, the most players a roster can hold.
    pub fn roster_capacity(&self) -> usize {
        self.roster_end_row.saturating_sub(self.roster_first_row) as usize
    }

    /// Row holding the time-block header labels.
    pub fn header_row(&self) -> u32 {
        self.grid_first_row.saturating_sub(1)
    }

    /// Column holding the day labels.
    pub fn label_column(&self) -> u32 {
        self.grid_first_column.saturating_sub(1)
    }
}

/// Remote fetch behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Deadline for each remote call made during a refresh.
    pub timeout_seconds: u64,
    /// Capacity of the player results channel; rosters with more names are
    /// rejected.
    pub max_players: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 5,
            max_players: 12,
        }
    }
}

impl FetchConfig {
    /// Per-call deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Responses a player may give for a time block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Canonical spellings, matched case-insensitively.
    pub player: Vec<String>,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            player: vec!["Yes".into(), "Maybe".into(), "No".into()],
        }
    }
}

/// Local snapshot cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one snapshot file per document.
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

/// Reminder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// How far ahead of a block's start a reminder is due.
    pub lead_minutes: u32,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self { lead_minutes: 60 }
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("thonky")
        .join("cache")
}

impl ThonkyConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            ScheduleError::Config(format!("failed to parse '{}': {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ScheduleError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/thonky/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("thonky")
            .join("config.toml")
    }

    /// Validates this configuration.
    ///
    /// Checks:
    /// - `fetch.timeout_seconds` must be greater than 0
    /// - `fetch.max_players` must be greater than 0
    /// - the roster range must not be empty
    /// - at least one player response must be configured
    pub fn validate(&self) -> Result<()> {
        if self.fetch.timeout_seconds == 0 {
            return Err(ScheduleError::Config(
                "fetch.timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.fetch.max_players == 0 {
            return Err(ScheduleError::Config(
                "fetch.max_players must be greater than 0".into(),
            ));
        }
        if self.layout.roster_capacity() == 0 {
            return Err(ScheduleError::Config(
                "layout.roster_end_row must be after layout.roster_first_row".into(),
            ));
        }
        if self.responses.player.is_empty() {
            return Err(ScheduleError::Config(
                "responses.player must list at least one response".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ThonkyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layout.roster_capacity(), 12);
        assert_eq!(config.fetch.max_players, 12);
        assert_eq!(config.fetch.timeout(), Duration::from_secs(5));
        assert_eq!(config.layout.header_row(), 1);
        assert_eq!(config.layout.label_column(), 1);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ThonkyConfig::default();
        config.fetch.timeout_seconds = 9;
        config.layout.week_sheet = "Week".into();
        config.cache.dir = dir.path().join("cache");
        config.save_to_file(&path).expect("save");

        let loaded = ThonkyConfig::from_file(&path).expect("load");
        assert_eq!(loaded.fetch.timeout_seconds, 9);
        assert_eq!(loaded.layout.week_sheet, "Week");
        assert_eq!(loaded.cache.dir, dir.path().join("cache"));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: ThonkyConfig = toml::from_str(
            r#"
            [fetch]
            max_players = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.fetch.max_players, 20);
        assert_eq!(config.fetch.timeout_seconds, 5);
        assert_eq!(config.layout, LayoutConfig::default());
        assert_eq!(config.responses.player.len(), 3);
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = ThonkyConfig::default();
        config.fetch.timeout_seconds = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn empty_roster_range_rejected() {
        let mut config = ThonkyConfig::default();
        config.layout.roster_end_row = config.layout.roster_first_row;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("roster_end_row"));
    }

    #[test]
    fn empty_responses_rejected() {
        let mut config = ThonkyConfig::default();
        config.responses.player.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_file_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "fetch = 3").expect("write");
        let err = ThonkyConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ScheduleError::Config(_)));
    }
}
