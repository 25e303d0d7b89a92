//! Error types for the scheduler and its storage adapter.

use thiserror::Error;

/// All errors surfaced by the crate.
///
/// The scheduling and ranking functions themselves are total; only parsing a
/// rating from caller input and talking to storage can fail.
#[derive(Debug, Error)]
pub enum SrsError {
  /// Rating text outside again/hard/medium/easy
  #[error("Invalid rating: {0:?} (expected again, hard, medium or easy)")]
  InvalidRating(String),

  /// Problem id not present in the catalogue
  #[error("Unknown problem: {0}")]
  UnknownProblem(i64),

  /// Daily goal outside the accepted range
  #[error("Daily goal must be between {min} and {max}, got {0}", min = crate::config::MIN_DAILY_GOAL, max = crate::config::MAX_DAILY_GOAL)]
  InvalidDailyGoal(i64),

  /// Problem set id not present in the catalogue
  #[error("Unknown problem set: {0}")]
  UnknownSet(i64),

  #[error("Database error: {0}")]
  Database(#[from] rusqlite::Error),

  /// Connection mutex was poisoned by a panicking writer
  #[error("Database unavailable")]
  DatabaseUnavailable,

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SrsError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_invalid_rating_message() {
    let err = SrsError::InvalidRating("good".to_string());
    assert_eq!(
      err.to_string(),
      "Invalid rating: \"good\" (expected again, hard, medium or easy)"
    );
  }

  #[test]
  fn test_invalid_daily_goal_message() {
    let err = SrsError::InvalidDailyGoal(25);
    assert_eq!(err.to_string(), "Daily goal must be between 1 and 20, got 25");
  }

  #[test]
  fn test_database_error_converts() {
    let err: SrsError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, SrsError::Database(_)));
  }
}
