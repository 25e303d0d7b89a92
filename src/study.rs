//! Study workflows: rating a problem, building the queue, resets and stats.
//!
//! Each function reads what it needs through [`StudyStore`], runs the pure
//! scheduler or ranker, and writes the result back. The clock is always an
//! argument.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::config::{ACTIVITY_WINDOW_DAYS, MAX_DAILY_GOAL, MIN_DAILY_GOAL, StudyConfig};
use crate::db::{LogOnError, StatusCounts};
use crate::domain::{Problem, ProblemId, ProblemSet, Rating, ReviewEvent, SchedulingState, Status, UserId};
use crate::error::SrsError;
use crate::session;
use crate::srs::{self, IntervalPreview, QueueCandidate, RankedQueue};
use crate::store::StudyStore;
use crate::Result;

/// A user's self-rating of one attempt
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSubmission {
  pub problem_id: ProblemId,
  pub rating: Rating,
  /// Minutes
  pub time_spent: Option<i64>,
  pub notes: Option<String>,
}

impl ReviewSubmission {
  pub fn new(problem_id: ProblemId, rating: Rating) -> Self {
    Self {
      problem_id,
      rating,
      time_spent: None,
      notes: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewOutcome {
  pub problem_id: ProblemId,
  pub next_review: DateTime<Utc>,
  pub interval: i64,
  pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedProblem {
  #[serde(flatten)]
  pub problem: Problem,
  pub status: Status,
  pub next_review: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudyQueue {
  pub problems: Vec<QueuedProblem>,
  pub daily_goal: i64,
  pub reviewed_today: i64,
  pub has_more: bool,
  pub is_guest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingProblem {
  #[serde(flatten)]
  pub problem: Problem,
  pub status: Status,
  pub next_review: Option<DateTime<Utc>>,
  pub interval: i64,
  pub attempts: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
  pub counts: StatusCounts,
  pub reviewed_today: i64,
  pub total_reviews: i64,
  pub daily_goal: i64,
  /// Ratings per UTC day over the activity window
  pub activity: BTreeMap<NaiveDate, i64>,
}

/// A preset curriculum as listed for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetSummary {
  #[serde(flatten)]
  pub set: ProblemSet,
  pub problem_count: i64,
  pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetDetail {
  pub set: ProblemSet,
  /// Members in curriculum order
  pub problems: Vec<QueuedProblem>,
  pub total: usize,
  /// Members never attempted count as new
  pub counts: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemDetail {
  #[serde(flatten)]
  pub problem: Problem,
  pub progress: Option<SchedulingState>,
}

/// Start of the UTC day containing `now`
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
  now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Apply a rating and persist the new scheduling state.
///
/// The progress write is authoritative. A failed history insert is logged
/// and does not fail the review.
pub fn submit_review(
  store: &impl StudyStore,
  user_id: UserId,
  submission: ReviewSubmission,
  now: DateTime<Utc>,
) -> Result<ReviewOutcome> {
  if !store.problem_exists(submission.problem_id)? {
    return Err(SrsError::UnknownProblem(submission.problem_id));
  }

  let prior = store.progress(user_id, submission.problem_id)?;
  let result = srs::advance(submission.rating, prior.as_ref(), now);
  store.save_progress(user_id, submission.problem_id, &result.state)?;

  let event = ReviewEvent::new(
    user_id,
    submission.problem_id,
    submission.rating,
    submission.time_spent,
    submission.notes,
    now,
  );
  store
    .append_review(&event)
    .log_warn("Failed to record review history");

  tracing::info!(
    user_id,
    problem_id = submission.problem_id,
    rating = %submission.rating,
    interval = result.state.interval,
    status = result.state.status.as_str(),
    "Review recorded"
  );

  Ok(ReviewOutcome {
    problem_id: submission.problem_id,
    next_review: result.next_review,
    interval: result.state.interval,
    status: result.state.status,
  })
}

/// Intervals each rating would produce, without writing anything
pub fn preview_for(
  store: &impl StudyStore,
  user_id: UserId,
  problem_id: ProblemId,
) -> Result<IntervalPreview> {
  if !store.problem_exists(problem_id)? {
    return Err(SrsError::UnknownProblem(problem_id));
  }
  let state = store.progress(user_id, problem_id)?;
  Ok(srs::preview_intervals(state.as_ref()))
}

// Attach problem details in ranked order; ids missing from the catalogue are dropped
fn hydrate(
  store: &impl StudyStore,
  ordered: &[ProblemId],
  states: &HashMap<ProblemId, SchedulingState>,
) -> Result<Vec<QueuedProblem>> {
  let mut by_id: HashMap<ProblemId, Problem> = store
    .problems_by_ids(ordered)?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();

  Ok(
    ordered
      .iter()
      .filter_map(|id| by_id.remove(id))
      .map(|problem| {
        let state = states.get(&problem.id);
        QueuedProblem {
          status: state.map(|s| s.status).unwrap_or(Status::New),
          next_review: state.and_then(|s| s.next_review),
          problem,
        }
      })
      .collect(),
  )
}

/// "What should I study now" for a signed-in user.
///
/// Only problems in the user's active sets are eligible; `excluded` holds the
/// session's skipped problems.
pub fn build_queue(
  store: &impl StudyStore,
  config: &StudyConfig,
  user_id: UserId,
  excluded: &HashSet<ProblemId>,
  limit: usize,
  now: DateTime<Utc>,
) -> Result<StudyQueue> {
  let daily_goal = store.daily_goal(user_id)?.unwrap_or(config.daily_goal);
  let reviewed_today = store.reviews_since(user_id, start_of_day(now))?;

  let pool = store.active_pool(user_id)?;
  if pool.is_empty() {
    return Ok(StudyQueue {
      daily_goal,
      reviewed_today,
      ..StudyQueue::default()
    });
  }

  let ids: Vec<ProblemId> = pool.iter().map(|c| c.problem_id).collect();
  let states = store.progress_map(user_id, &ids)?;
  let RankedQueue { ordered, has_more } = srs::rank_queue(&pool, &states, excluded, limit, now);

  Ok(StudyQueue {
    problems: hydrate(store, &ordered, &states)?,
    daily_goal,
    reviewed_today,
    has_more,
    is_guest: false,
  })
}

/// [`build_queue`] with the session's "skip for now" list applied
pub fn session_queue(
  store: &impl StudyStore,
  config: &StudyConfig,
  user_id: UserId,
  session_id: &str,
  limit: usize,
  now: DateTime<Utc>,
) -> Result<StudyQueue> {
  let excluded = session::skipped(session_id);
  build_queue(store, config, user_id, &excluded, limit, now)
}

/// Queue for visitors: the guest curriculum in its own order.
///
/// Without the guest set, the whole catalogue is offered by LeetCode number.
pub fn guest_queue(store: &impl StudyStore, config: &StudyConfig, limit: usize) -> Result<StudyQueue> {
  let RankedQueue { ordered, has_more } = match store.find_set(&config.guest_set)? {
    Some(set) => {
      let pool: Vec<QueueCandidate> = store
        .set_members(set.id)?
        .into_iter()
        .map(|m| QueueCandidate::new(m.problem_id, m.sort_order))
        .collect();
      srs::rank_guest(&pool, limit)
    }
    None => {
      tracing::debug!("Guest set '{}' missing, using full catalogue", config.guest_set);
      let all = store.all_problems()?;
      RankedQueue {
        has_more: all.len() > limit,
        ordered: all.into_iter().take(limit).map(|p| p.id).collect(),
      }
    }
  };

  Ok(StudyQueue {
    problems: hydrate(store, &ordered, &HashMap::new())?,
    daily_goal: config.daily_goal,
    reviewed_today: 0,
    has_more,
    is_guest: true,
  })
}

/// Attempted problems of the active sets, soonest due first
pub fn upcoming(store: &impl StudyStore, user_id: UserId) -> Result<Vec<UpcomingProblem>> {
  let pool = store.active_pool(user_id)?;
  if pool.is_empty() {
    return Ok(Vec::new());
  }

  let ids: Vec<ProblemId> = pool.iter().map(|c| c.problem_id).collect();
  let states = store.progress_map(user_id, &ids)?;
  let ordered = srs::rank_upcoming(&ids, &states);
  if ordered.is_empty() {
    return Ok(Vec::new());
  }
  let attempts = store.attempt_counts(user_id, &ordered)?;

  let mut by_id: HashMap<ProblemId, Problem> = store
    .problems_by_ids(&ordered)?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();

  Ok(
    ordered
      .iter()
      .filter_map(|id| Some((by_id.remove(id)?, states.get(id)?)))
      .map(|(problem, state)| UpcomingProblem {
        status: state.status,
        next_review: state.next_review,
        interval: state.interval,
        attempts: attempts.get(&problem.id).copied().unwrap_or(0),
        problem,
      })
      .collect(),
  )
}

/// One problem with the user's scheduling record, if any
pub fn problem_detail(
  store: &impl StudyStore,
  user_id: UserId,
  problem_id: ProblemId,
) -> Result<ProblemDetail> {
  let problem = store
    .problems_by_ids(&[problem_id])?
    .pop()
    .ok_or(SrsError::UnknownProblem(problem_id))?;
  Ok(ProblemDetail {
    progress: store.progress(user_id, problem_id)?,
    problem,
  })
}

/// Preset curricula and whether the user studies each
pub fn list_sets(store: &impl StudyStore, user_id: UserId) -> Result<Vec<SetSummary>> {
  let active = store.active_set_ids(user_id)?;
  Ok(
    store
      .preset_sets()?
      .into_iter()
      .map(|(set, problem_count)| SetSummary {
        is_active: active.contains(&set.id),
        set,
        problem_count,
      })
      .collect(),
  )
}

pub fn set_detail(store: &impl StudyStore, user_id: UserId, problem_set_id: i64) -> Result<SetDetail> {
  let set = store
    .set_by_id(problem_set_id)?
    .ok_or(SrsError::UnknownSet(problem_set_id))?;

  let ids: Vec<ProblemId> = store
    .set_members(problem_set_id)?
    .into_iter()
    .map(|m| m.problem_id)
    .collect();
  let states = store.progress_map(user_id, &ids)?;
  let problems = hydrate(store, &ids, &states)?;

  let mut counts = StatusCounts::default();
  for p in &problems {
    match p.status {
      Status::New => counts.new += 1,
      Status::Learning => counts.learning += 1,
      Status::Review => counts.review += 1,
      Status::Mastered => counts.mastered += 1,
    }
  }

  Ok(SetDetail {
    set,
    total: problems.len(),
    problems,
    counts,
  })
}

/// Store a new daily goal; returns the stored value
pub fn update_daily_goal(
  store: &impl StudyStore,
  user_id: UserId,
  goal: i64,
  now: DateTime<Utc>,
) -> Result<i64> {
  if !(MIN_DAILY_GOAL..=MAX_DAILY_GOAL).contains(&goal) {
    return Err(SrsError::InvalidDailyGoal(goal));
  }
  store.save_daily_goal(user_id, goal, now)?;
  tracing::info!(user_id, goal, "Updated daily goal");
  Ok(goal)
}

/// Forget one problem's scheduling record. Review history is kept.
pub fn reset_problem(store: &impl StudyStore, user_id: UserId, problem_id: ProblemId) -> Result<usize> {
  if !store.problem_exists(problem_id)? {
    return Err(SrsError::UnknownProblem(problem_id));
  }
  let removed = store.clear_progress(user_id, &[problem_id])?;
  tracing::info!(user_id, problem_id, removed, "Reset problem progress");
  Ok(removed)
}

/// Forget the scheduling records of every problem in a set.
///
/// Reports the number of set members, attempted or not.
pub fn reset_set(store: &impl StudyStore, user_id: UserId, problem_set_id: i64) -> Result<usize> {
  if store.set_by_id(problem_set_id)?.is_none() {
    return Err(SrsError::UnknownSet(problem_set_id));
  }

  let members: Vec<ProblemId> = store
    .set_members(problem_set_id)?
    .into_iter()
    .map(|m| m.problem_id)
    .collect();
  if members.is_empty() {
    return Ok(0);
  }

  let removed = store.clear_progress(user_id, &members)?;
  tracing::info!(user_id, problem_set_id, removed, "Reset set progress");
  Ok(members.len())
}

/// Activate or deactivate a set for the user; returns the new flag
pub fn toggle_set(
  store: &impl StudyStore,
  user_id: UserId,
  problem_set_id: i64,
  now: DateTime<Utc>,
) -> Result<bool> {
  if store.set_by_id(problem_set_id)?.is_none() {
    return Err(SrsError::UnknownSet(problem_set_id));
  }
  let active = store.toggle_set(user_id, problem_set_id, now)?;
  tracing::info!(user_id, problem_set_id, active, "Toggled problem set");
  Ok(active)
}

pub fn progress_summary(
  store: &impl StudyStore,
  config: &StudyConfig,
  user_id: UserId,
  now: DateTime<Utc>,
) -> Result<ProgressSummary> {
  let today = start_of_day(now);
  Ok(ProgressSummary {
    counts: store.status_counts(user_id)?,
    reviewed_today: store.reviews_since(user_id, today)?,
    total_reviews: store.total_reviews(user_id)?,
    daily_goal: store.daily_goal(user_id)?.unwrap_or(config.daily_goal),
    activity: store.activity_since(user_id, today - Duration::days(ACTIVITY_WINDOW_DAYS))?,
  })
}
