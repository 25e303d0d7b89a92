pub mod problems;
pub mod profiles;
pub mod progress;
pub mod reviews;
pub mod schema;
pub mod seed;
pub mod sets;
pub mod stats;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::SrsError;

// Re-export all public items from submodules
pub use problems::*;
pub use profiles::*;
pub use progress::*;
pub use reviews::*;
pub use schema::run_migrations;
pub use seed::*;
pub use sets::*;
pub use stats::*;

pub type DbPool = Arc<Mutex<Connection>>;

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }
}

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, SrsError> {
  pool.lock().map_err(|_| {
    tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
    SrsError::DatabaseUnavailable
  })
}

pub fn init_db(path: &Path) -> Result<DbPool> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).ok();
  }

  // Create backup before migrations if database exists
  if path.exists() {
    let backup_path = path.with_extension("db.backup");
    if let Err(e) = std::fs::copy(path, &backup_path) {
      tracing::warn!("Could not create database backup: {}", e);
    }
  }

  let conn = Connection::open(path)?;
  conn.pragma_update(None, "foreign_keys", true)?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

/// Fixed-width UTC timestamp so stored values sort lexically
pub fn to_db_time(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn from_db_time(idx: usize, value: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(value)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn from_db_time_opt(idx: usize, value: Option<String>) -> Result<Option<DateTime<Utc>>> {
  value.map(|v| from_db_time(idx, &v)).transpose()
}

/// "?, ?, ?" for an IN clause of `n` values
pub(crate) fn placeholders(n: usize) -> String {
  vec!["?"; n].join(", ")
}
