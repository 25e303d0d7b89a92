use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProblemId, Rating, UserId};
use crate::config::MAX_TIME_SPENT_MINUTES;

/// Append-only record of one rating. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEvent {
  pub id: i64,
  pub user_id: UserId,
  pub problem_id: ProblemId,
  pub rating: Rating,
  /// Minutes spent, clamped to 0..=60
  pub time_spent: Option<i64>,
  pub notes: Option<String>,
  pub reviewed_at: DateTime<Utc>,
}

impl ReviewEvent {
  pub fn new(
    user_id: UserId,
    problem_id: ProblemId,
    rating: Rating,
    time_spent: Option<i64>,
    notes: Option<String>,
    reviewed_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id: 0,
      user_id,
      problem_id,
      rating,
      time_spent: time_spent.map(|m| m.clamp(0, MAX_TIME_SPENT_MINUTES)),
      notes: notes.filter(|n| !n.trim().is_empty()),
      reviewed_at,
    }
  }
}
