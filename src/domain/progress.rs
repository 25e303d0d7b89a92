use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SrsError;

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const MAX_EASE_FACTOR: f64 = 3.0;

/// Self-rated recall after attempting a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
  Again,  // Could not solve it
  Hard,   // Solved with difficulty
  Medium, // Solved normally
  Easy,   // Solved effortlessly
}

impl Rating {
  pub const ALL: [Rating; 4] = [Self::Again, Self::Hard, Self::Medium, Self::Easy];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Again => "again",
      Self::Hard => "hard",
      Self::Medium => "medium",
      Self::Easy => "easy",
    }
  }
}

impl FromStr for Rating {
  type Err = SrsError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "again" => Ok(Self::Again),
      "hard" => Ok(Self::Hard),
      "medium" => Ok(Self::Medium),
      "easy" => Ok(Self::Easy),
      other => Err(SrsError::InvalidRating(other.to_string())),
    }
  }
}

impl fmt::Display for Rating {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Mastery label derived from the current interval.
///
/// Variants are ordered from least to most advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  New,
  Learning,
  Review,
  Mastered,
}

impl Status {
  /// Decode a stored status; unknown text is treated as `New`
  pub fn from_str(s: &str) -> Self {
    match s {
      "learning" => Self::Learning,
      "review" => Self::Review,
      "mastered" => Self::Mastered,
      _ => Self::New,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::New => "new",
      Self::Learning => "learning",
      Self::Review => "review",
      Self::Mastered => "mastered",
    }
  }
}

/// Per user and problem scheduling record.
///
/// No record at all means the problem was never attempted; `Default` is the
/// state a first rating starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingState {
  pub ease_factor: f64,
  /// Days until the next review; 0 only before the first rating
  pub interval: i64,
  /// Consecutive ratings since the last "again"
  pub repetitions: i64,
  pub status: Status,
  /// Due date, truncated to midnight UTC
  pub next_review: Option<DateTime<Utc>>,
  /// Informational only, never used in scheduling math
  pub last_reviewed: Option<DateTime<Utc>>,
}

impl Default for SchedulingState {
  fn default() -> Self {
    Self {
      ease_factor: DEFAULT_EASE_FACTOR,
      interval: 0,
      repetitions: 0,
      status: Status::New,
      next_review: None,
      last_reviewed: None,
    }
  }
}

impl SchedulingState {
  /// True when the problem has a due date at or before `now`
  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    self.next_review.is_some_and(|due| due <= now)
  }
}
