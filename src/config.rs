//! Application configuration constants.
//!
//! Values that may be overridden live in `config.toml`; everything else is a
//! constant here so the numbers are not scattered through the codebase.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, SrsError};
use crate::paths;

// ==================== Database Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
    database: Option<DatabaseConfig>,
    study: Option<StudyConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

pub const CONFIG_FILE: &str = "config.toml";

fn read_config(file: &Path) -> Result<AppConfig> {
    if !file.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(file)?;
    toml::from_str(&contents).map_err(|e| SrsError::Config(format!("{}: {}", file.display(), e)))
}

/// Load database path with priority: config.toml > .env > default
pub fn load_database_path() -> PathBuf {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Priority 1: config.toml
    match read_config(Path::new(CONFIG_FILE)) {
        Ok(config) => {
            if let Some(path) = config.database.and_then(|db| db.path) {
                tracing::info!("Using database from config.toml: {}", path);
                return PathBuf::from(path);
            }
        }
        Err(e) => tracing::warn!("Ignoring unreadable {}: {}", CONFIG_FILE, e),
    }

    // Priority 2: .env DATABASE_PATH
    if let Ok(path) = std::env::var("DATABASE_PATH") {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        return PathBuf::from(path);
    }

    // Default
    let default = PathBuf::from(paths::db_path());
    tracing::info!("Using default database path: {}", default.display());
    default
}

// ==================== Study Configuration ====================

/// Default number of problems returned by a queue fetch
pub const DEFAULT_QUEUE_LIMIT: usize = 3;

/// Daily goal for users without a profile row
pub const DEFAULT_DAILY_GOAL: i64 = 3;

/// Accepted range for a user-chosen daily goal
pub const MIN_DAILY_GOAL: i64 = 1;
pub const MAX_DAILY_GOAL: i64 = 20;

/// Curriculum shown to visitors without an account
pub const DEFAULT_GUEST_SET: &str = "NeetCode 150";

/// Recorded time spent per review is capped at one hour
pub const MAX_TIME_SPENT_MINUTES: i64 = 60;

/// How far back the activity heatmap looks
pub const ACTIVITY_WINDOW_DAYS: i64 = 365;

/// `[study]` table of config.toml
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub queue_limit: usize,
    pub daily_goal: i64,
    pub guest_set: String,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            queue_limit: DEFAULT_QUEUE_LIMIT,
            daily_goal: DEFAULT_DAILY_GOAL,
            guest_set: DEFAULT_GUEST_SET.to_string(),
        }
    }
}

impl StudyConfig {
    /// Load the `[study]` table from a config file, falling back to defaults
    pub fn load_from(file: &Path) -> Result<Self> {
        Ok(read_config(file)?.study.unwrap_or_default())
    }

    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_FILE)).unwrap_or_else(|e| {
            tracing::warn!("Using default study config: {}", e);
            Self::default()
        })
    }
}

// ==================== Session Configuration ====================

/// Skip lists expire after this many hours without access
pub const SESSION_EXPIRY_HOURS: i64 = 1;

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_study_config_defaults_when_missing() {
        let temp = TempDir::new().unwrap();
        let config = StudyConfig::load_from(&temp.path().join("missing.toml")).unwrap();
        assert_eq!(config, StudyConfig::default());
        assert_eq!(config.queue_limit, 3);
        assert_eq!(config.daily_goal, 3);
        assert_eq!(config.guest_set, "NeetCode 150");
    }

    #[test]
    fn test_study_config_partial_override() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("config.toml");
        std::fs::write(&file, "[study]\nqueue_limit = 10\nguest_set = \"Blind 75\"\n").unwrap();

        let config = StudyConfig::load_from(&file).unwrap();
        assert_eq!(config.queue_limit, 10);
        assert_eq!(config.daily_goal, DEFAULT_DAILY_GOAL);
        assert_eq!(config.guest_set, "Blind 75");
    }

    #[test]
    fn test_study_config_rejects_bad_toml() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("config.toml");
        std::fs::write(&file, "[study\nqueue_limit = ").unwrap();

        let err = StudyConfig::load_from(&file).unwrap_err();
        assert!(matches!(err, SrsError::Config(_)));
    }
}
