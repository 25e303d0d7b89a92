//! Four-button SM-2 variant with day-granularity scheduling.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::progress::{MAX_EASE_FACTOR, MIN_EASE_FACTOR};
use crate::domain::{Rating, SchedulingState, Status};

const AGAIN_EASE_PENALTY: f64 = 0.2;
const HARD_EASE_PENALTY: f64 = 0.15;
const EASY_EASE_BONUS: f64 = 0.15;
const HARD_INTERVAL_MULTIPLIER: f64 = 1.2;
const EASY_INTERVAL_MULTIPLIER: f64 = 1.3;

/// First interval for a never-advanced problem rated medium / easy
const MEDIUM_LAUNCH_INTERVAL: i64 = 1;
const EASY_LAUNCH_INTERVAL: i64 = 4;
/// Interval after a second successful rating
const SECOND_INTERVAL: i64 = 6;

pub const REVIEW_THRESHOLD_DAYS: i64 = 21;
pub const MASTERED_THRESHOLD_DAYS: i64 = 30;

pub struct Sm2Result {
  pub state: SchedulingState,
  pub next_review: DateTime<Utc>,
}

/// Hypothetical interval in days for each rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalPreview {
  pub again: i64,
  pub hard: i64,
  pub medium: i64,
  pub easy: i64,
}

impl IntervalPreview {
  pub fn for_rating(&self, rating: Rating) -> i64 {
    match rating {
      Rating::Again => self.again,
      Rating::Hard => self.hard,
      Rating::Medium => self.medium,
      Rating::Easy => self.easy,
    }
  }
}

/// Status label for an interval. A reset always lands in learning.
pub fn status_for(interval: i64, was_reset: bool) -> Status {
  if was_reset {
    Status::Learning
  } else if interval >= MASTERED_THRESHOLD_DAYS {
    Status::Mastered
  } else if interval >= REVIEW_THRESHOLD_DAYS {
    Status::Review
  } else {
    Status::Learning
  }
}

/// Apply one rating to the scheduling numbers, leaving dates untouched
fn transition(rating: Rating, prior: &SchedulingState) -> SchedulingState {
  let mut ease = prior.ease_factor;
  let mut interval = prior.interval;
  let mut repetitions = prior.repetitions;

  let status = match rating {
    Rating::Again => {
      repetitions = 0;
      interval = 1;
      ease -= AGAIN_EASE_PENALTY;
      status_for(interval, true)
    }
    Rating::Hard => {
      repetitions += 1;
      interval = ((interval as f64) * HARD_INTERVAL_MULTIPLIER).round() as i64;
      ease -= HARD_EASE_PENALTY;
      // Hard never promotes to mastered
      status_for(interval.max(1), false).min(Status::Review)
    }
    Rating::Medium => {
      repetitions += 1;
      interval = match interval {
        0 => MEDIUM_LAUNCH_INTERVAL,
        1 => SECOND_INTERVAL,
        _ => ((interval as f64) * ease).round() as i64,
      };
      status_for(interval, false)
    }
    Rating::Easy => {
      repetitions += 1;
      interval = match interval {
        0 => EASY_LAUNCH_INTERVAL,
        1 => SECOND_INTERVAL,
        _ => ((interval as f64) * ease * EASY_INTERVAL_MULTIPLIER).round() as i64,
      };
      ease += EASY_EASE_BONUS;
      status_for(interval, false)
    }
  };

  SchedulingState {
    ease_factor: ease.clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR),
    interval: interval.max(1),
    repetitions,
    status,
    next_review: prior.next_review,
    last_reviewed: prior.last_reviewed,
  }
}

/// Midnight UTC, `days` after the calendar day of `now`
pub fn due_date(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
  let day = now
    .date_naive()
    .checked_add_days(Days::new(days.max(0) as u64))
    .unwrap_or(NaiveDate::MAX);
  day.and_time(NaiveTime::MIN).and_utc()
}

/// Compute the state that follows a rating.
///
/// `prior` is `None` for a first-ever rating. `now` is the only external input;
/// it sets `last_reviewed` and anchors the due date.
pub fn advance(rating: Rating, prior: Option<&SchedulingState>, now: DateTime<Utc>) -> Sm2Result {
  let default = SchedulingState::default();
  let mut state = transition(rating, prior.unwrap_or(&default));

  let next_review = due_date(now, state.interval);
  state.next_review = Some(next_review);
  state.last_reviewed = Some(now);

  Sm2Result { state, next_review }
}

/// Intervals each rating would produce, without touching `prior`
pub fn preview_intervals(prior: Option<&SchedulingState>) -> IntervalPreview {
  let default = SchedulingState::default();
  let state = prior.unwrap_or(&default);
  IntervalPreview {
    again: transition(Rating::Again, state).interval,
    hard: transition(Rating::Hard, state).interval,
    medium: transition(Rating::Medium, state).interval,
    easy: transition(Rating::Easy, state).interval,
  }
}

/// Short label for an interval: "6d", "3w", "2mo"
pub fn format_interval(days: i64) -> String {
  if days < 7 {
    format!("{}d", days)
  } else if days < 30 {
    format!("{}w", ((days as f64) / 7.0).round() as i64)
  } else {
    format!("{}mo", ((days as f64) / 30.0).round() as i64)
  }
}
