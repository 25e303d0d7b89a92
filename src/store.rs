//! Storage seam for the study workflows.
//!
//! `study` talks to this trait rather than to SQL so the orchestration can be
//! driven by any record store. The SQLite implementation delegates to the
//! free functions in `db`.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;

use crate::db::{self, StatusCounts};
use crate::domain::{Problem, ProblemId, ProblemSet, ReviewEvent, SchedulingState, SetMembership, UserId};
use crate::srs::QueueCandidate;
use crate::Result;

pub trait StudyStore {
  /// Problems of the user's active sets with their minimum sort order
  fn active_pool(&self, user_id: UserId) -> Result<Vec<QueueCandidate>>;
  fn progress_map(
    &self,
    user_id: UserId,
    problem_ids: &[ProblemId],
  ) -> Result<HashMap<ProblemId, SchedulingState>>;
  fn progress(&self, user_id: UserId, problem_id: ProblemId) -> Result<Option<SchedulingState>>;
  fn save_progress(&self, user_id: UserId, problem_id: ProblemId, state: &SchedulingState) -> Result<()>;
  fn clear_progress(&self, user_id: UserId, problem_ids: &[ProblemId]) -> Result<usize>;
  fn append_review(&self, event: &ReviewEvent) -> Result<i64>;
  fn reviews_since(&self, user_id: UserId, since: DateTime<Utc>) -> Result<i64>;
  fn attempt_counts(&self, user_id: UserId, problem_ids: &[ProblemId]) -> Result<HashMap<ProblemId, i64>>;
  fn problems_by_ids(&self, problem_ids: &[ProblemId]) -> Result<Vec<Problem>>;
  fn set_members(&self, problem_set_id: i64) -> Result<Vec<SetMembership>>;
  fn find_set(&self, name: &str) -> Result<Option<ProblemSet>>;
  fn set_by_id(&self, problem_set_id: i64) -> Result<Option<ProblemSet>>;
  fn toggle_set(&self, user_id: UserId, problem_set_id: i64, now: DateTime<Utc>) -> Result<bool>;
  /// Preset sets with their member counts
  fn preset_sets(&self) -> Result<Vec<(ProblemSet, i64)>>;
  fn active_set_ids(&self, user_id: UserId) -> Result<HashSet<i64>>;
  /// `None` when the user never set a goal
  fn daily_goal(&self, user_id: UserId) -> Result<Option<i64>>;
  fn save_daily_goal(&self, user_id: UserId, goal: i64, now: DateTime<Utc>) -> Result<()>;
  fn status_counts(&self, user_id: UserId) -> Result<StatusCounts>;
  fn total_reviews(&self, user_id: UserId) -> Result<i64>;
  fn activity_since(&self, user_id: UserId, since: DateTime<Utc>) -> Result<BTreeMap<NaiveDate, i64>>;
  fn all_problems(&self) -> Result<Vec<Problem>>;
  fn problem_exists(&self, problem_id: ProblemId) -> Result<bool> {
    Ok(!self.problems_by_ids(&[problem_id])?.is_empty())
  }
}

impl StudyStore for Connection {
  fn active_pool(&self, user_id: UserId) -> Result<Vec<QueueCandidate>> {
    Ok(db::get_active_pool(self, user_id)?)
  }

  fn progress_map(
    &self,
    user_id: UserId,
    problem_ids: &[ProblemId],
  ) -> Result<HashMap<ProblemId, SchedulingState>> {
    // De-duplicate so the IN clause stays small for overlapping sets
    let unique: Vec<ProblemId> = {
      let mut seen = HashSet::with_capacity(problem_ids.len());
      problem_ids.iter().copied().filter(|id| seen.insert(*id)).collect()
    };
    Ok(db::get_progress_map(self, user_id, &unique)?)
  }

  fn progress(&self, user_id: UserId, problem_id: ProblemId) -> Result<Option<SchedulingState>> {
    Ok(db::get_progress(self, user_id, problem_id)?)
  }

  fn save_progress(&self, user_id: UserId, problem_id: ProblemId, state: &SchedulingState) -> Result<()> {
    Ok(db::upsert_progress(self, user_id, problem_id, state)?)
  }

  fn clear_progress(&self, user_id: UserId, problem_ids: &[ProblemId]) -> Result<usize> {
    Ok(db::delete_progress(self, user_id, problem_ids)?)
  }

  fn append_review(&self, event: &ReviewEvent) -> Result<i64> {
    Ok(db::insert_review_event(self, event)?)
  }

  fn reviews_since(&self, user_id: UserId, since: DateTime<Utc>) -> Result<i64> {
    Ok(db::count_reviews_since(self, user_id, since)?)
  }

  fn attempt_counts(&self, user_id: UserId, problem_ids: &[ProblemId]) -> Result<HashMap<ProblemId, i64>> {
    Ok(db::attempt_counts(self, user_id, problem_ids)?)
  }

  fn problems_by_ids(&self, problem_ids: &[ProblemId]) -> Result<Vec<Problem>> {
    Ok(db::get_problems_by_ids(self, problem_ids)?)
  }

  fn set_members(&self, problem_set_id: i64) -> Result<Vec<SetMembership>> {
    Ok(db::get_set_items(self, problem_set_id)?)
  }

  fn find_set(&self, name: &str) -> Result<Option<ProblemSet>> {
    Ok(db::find_set_by_name(self, name)?)
  }

  fn set_by_id(&self, problem_set_id: i64) -> Result<Option<ProblemSet>> {
    Ok(db::get_set(self, problem_set_id)?)
  }

  fn toggle_set(&self, user_id: UserId, problem_set_id: i64, now: DateTime<Utc>) -> Result<bool> {
    Ok(db::toggle_user_set(self, user_id, problem_set_id, now)?)
  }

  fn preset_sets(&self) -> Result<Vec<(ProblemSet, i64)>> {
    Ok(db::list_preset_sets(self)?)
  }

  fn active_set_ids(&self, user_id: UserId) -> Result<HashSet<i64>> {
    Ok(db::get_active_set_ids(self, user_id)?.into_iter().collect())
  }

  fn daily_goal(&self, user_id: UserId) -> Result<Option<i64>> {
    Ok(db::get_daily_goal(self, user_id)?)
  }

  fn save_daily_goal(&self, user_id: UserId, goal: i64, now: DateTime<Utc>) -> Result<()> {
    Ok(db::set_daily_goal(self, user_id, goal, now)?)
  }

  fn status_counts(&self, user_id: UserId) -> Result<StatusCounts> {
    Ok(db::status_counts(self, user_id)?)
  }

  fn total_reviews(&self, user_id: UserId) -> Result<i64> {
    Ok(db::total_reviews(self, user_id)?)
  }

  fn activity_since(&self, user_id: UserId, since: DateTime<Utc>) -> Result<BTreeMap<NaiveDate, i64>> {
    Ok(db::activity_by_day(self, user_id, since)?)
  }

  fn all_problems(&self) -> Result<Vec<Problem>> {
    Ok(db::list_problems(self)?)
  }

  fn problem_exists(&self, problem_id: ProblemId) -> Result<bool> {
    Ok(db::get_problem(self, problem_id)?.is_some())
  }
}
