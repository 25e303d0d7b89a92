//! Study queue ranking.
//!
//! Problems are ranked in three strict tiers:
//! - Overdue reviews, most overdue first
//! - Never-attempted problems, in curriculum order
//! - Attempted problems that are not yet due, in curriculum order
//!
//! Both rankers are pure; callers supply "now" and the scheduling records.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ProblemId, SchedulingState, Status};

/// A problem from one of the user's active curricula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCandidate {
  pub problem_id: ProblemId,
  pub sort_order: i64,
}

impl QueueCandidate {
  pub fn new(problem_id: ProblemId, sort_order: i64) -> Self {
    Self {
      problem_id,
      sort_order,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedQueue {
  pub ordered: Vec<ProblemId>,
  /// More eligible problems exist beyond `ordered`
  pub has_more: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
  Overdue,
  New,
  NotDue,
}

#[derive(Debug)]
struct Ranked {
  problem_id: ProblemId,
  sort_order: i64,
  tier: Tier,
  /// next_review - now; negative when overdue
  urgency: Duration,
}

impl Ranked {
  fn compare(&self, other: &Self) -> Ordering {
    self.tier.cmp(&other.tier).then_with(|| match self.tier {
      Tier::Overdue => self
        .urgency
        .cmp(&other.urgency)
        .then(self.sort_order.cmp(&other.sort_order)),
      Tier::New | Tier::NotDue => self.sort_order.cmp(&other.sort_order),
    })
  }
}

/// Collapse repeated problems to one candidate with the smallest sort order.
///
/// Keeps the position of each problem's first occurrence.
pub fn merge_candidates(problems: &[QueueCandidate]) -> Vec<QueueCandidate> {
  let mut merged: Vec<QueueCandidate> = Vec::with_capacity(problems.len());
  let mut index: HashMap<ProblemId, usize> = HashMap::with_capacity(problems.len());

  for candidate in problems {
    match index.get(&candidate.problem_id) {
      Some(&i) => {
        let existing = &mut merged[i];
        existing.sort_order = existing.sort_order.min(candidate.sort_order);
      }
      None => {
        index.insert(candidate.problem_id, merged.len());
        merged.push(*candidate);
      }
    }
  }

  merged
}

fn classify(state: Option<&SchedulingState>, now: DateTime<Utc>) -> (Tier, Duration) {
  match state {
    None => (Tier::New, Duration::zero()),
    Some(s) => match s.next_review {
      Some(due) if due <= now => (Tier::Overdue, due.signed_duration_since(now)),
      Some(due) => (Tier::NotDue, due.signed_duration_since(now)),
      // Attempted but never scheduled: not due
      None => (Tier::NotDue, Duration::zero()),
    },
  }
}

/// Rank the pool into "what to study now".
///
/// Excluded problems are dropped before ranking. `has_more` compares the
/// number of eligible problems against `limit`.
pub fn rank_queue(
  problems: &[QueueCandidate],
  states: &HashMap<ProblemId, SchedulingState>,
  excluded: &HashSet<ProblemId>,
  limit: usize,
  now: DateTime<Utc>,
) -> RankedQueue {
  let mut ranked: Vec<Ranked> = merge_candidates(problems)
    .into_iter()
    .filter(|c| !excluded.contains(&c.problem_id))
    .map(|c| {
      let (tier, urgency) = classify(states.get(&c.problem_id), now);
      Ranked {
        problem_id: c.problem_id,
        sort_order: c.sort_order,
        tier,
        urgency,
      }
    })
    .collect();

  let eligible = ranked.len();
  ranked.sort_by(Ranked::compare);

  tracing::debug!(
    eligible,
    overdue = ranked.iter().filter(|r| r.tier == Tier::Overdue).count(),
    new = ranked.iter().filter(|r| r.tier == Tier::New).count(),
    limit,
    "Ranked study queue"
  );

  RankedQueue {
    ordered: ranked.into_iter().take(limit).map(|r| r.problem_id).collect(),
    has_more: eligible > limit,
  }
}

/// Guest ranking: no scheduling records, so every problem is new
pub fn rank_guest(problems: &[QueueCandidate], limit: usize) -> RankedQueue {
  // Without records no due date is compared, so any instant works
  rank_queue(problems, &HashMap::new(), &HashSet::new(), limit, DateTime::<Utc>::UNIX_EPOCH)
}

/// Calendar view of attempted problems, soonest due first.
///
/// Problems without a record, or whose record is still `New`, are left out.
/// Records without a due date sort last.
pub fn rank_upcoming(
  problems: &[ProblemId],
  states: &HashMap<ProblemId, SchedulingState>,
) -> Vec<ProblemId> {
  let mut seen = HashSet::with_capacity(problems.len());
  let mut scheduled: Vec<(ProblemId, Option<DateTime<Utc>>)> = problems
    .iter()
    .filter(|id| seen.insert(**id))
    .filter_map(|id| {
      states
        .get(id)
        .filter(|s| s.status != Status::New)
        .map(|s| (*id, s.next_review))
    })
    .collect();

  scheduled.sort_by(|(_, a), (_, b)| match (a, b) {
    (Some(a), Some(b)) => a.cmp(b),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  });

  scheduled.into_iter().map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  const A: ProblemId = 1;
  const B: ProblemId = 2;
  const C: ProblemId = 3;
  const D: ProblemId = 4;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap()
  }

  fn scheduled(next_review: DateTime<Utc>, status: Status) -> SchedulingState {
    SchedulingState {
      interval: 3,
      repetitions: 1,
      status,
      next_review: Some(next_review),
      ..SchedulingState::default()
    }
  }

  /// A overdue by 3 days, B new (order 1), C new (order 0), D due in 5 days
  fn scenario() -> (Vec<QueueCandidate>, HashMap<ProblemId, SchedulingState>) {
    let problems = vec![
      QueueCandidate::new(A, 5),
      QueueCandidate::new(B, 1),
      QueueCandidate::new(C, 0),
      QueueCandidate::new(D, 2),
    ];
    let mut states = HashMap::new();
    states.insert(A, scheduled(now() - Duration::days(3), Status::Learning));
    states.insert(D, scheduled(now() + Duration::days(5), Status::Learning));
    (problems, states)
  }

  #[test]
  fn test_three_tier_ordering() {
    let (problems, states) = scenario();
    let result = rank_queue(&problems, &states, &HashSet::new(), 10, now());
    assert_eq!(result.ordered, vec![A, C, B, D]);
    assert!(!result.has_more);
  }

  #[test]
  fn test_excluded_problem_removed() {
    let (problems, states) = scenario();
    let excluded = HashSet::from([A]);

    let result = rank_queue(&problems, &states, &excluded, 10, now());
    assert_eq!(result.ordered, vec![C, B, D]);
    assert!(!result.has_more);

    // 3 eligible against a limit of 2
    let result = rank_queue(&problems, &states, &excluded, 2, now());
    assert_eq!(result.ordered, vec![C, B]);
    assert!(result.has_more);

    // 3 eligible against a limit of 3
    let result = rank_queue(&problems, &states, &excluded, 3, now());
    assert!(!result.has_more);
  }

  #[test]
  fn test_has_more_boundary() {
    let (problems, states) = scenario();
    let n = problems.len();

    let result = rank_queue(&problems, &states, &HashSet::new(), n, now());
    assert_eq!(result.ordered.len(), n);
    assert!(!result.has_more);

    let result = rank_queue(&problems, &states, &HashSet::new(), n - 1, now());
    assert_eq!(result.ordered.len(), n - 1);
    assert!(result.has_more);
  }

  #[test]
  fn test_empty_pool() {
    let result = rank_queue(&[], &HashMap::new(), &HashSet::new(), 5, now());
    assert!(result.ordered.is_empty());
    assert!(!result.has_more);
  }

  #[test]
  fn test_everything_excluded() {
    let (problems, states) = scenario();
    let excluded: HashSet<_> = problems.iter().map(|c| c.problem_id).collect();
    let result = rank_queue(&problems, &states, &excluded, 5, now());
    assert_eq!(result, RankedQueue::default());
  }

  #[test]
  fn test_zero_limit_reports_more() {
    let (problems, states) = scenario();
    let result = rank_queue(&problems, &states, &HashSet::new(), 0, now());
    assert!(result.ordered.is_empty());
    assert!(result.has_more);
  }

  #[test]
  fn test_overdue_uses_sub_day_precision() {
    let problems = vec![QueueCandidate::new(A, 0), QueueCandidate::new(B, 1)];
    let mut states = HashMap::new();
    // Same calendar day, B is overdue by more
    states.insert(A, scheduled(now() - Duration::hours(1), Status::Learning));
    states.insert(B, scheduled(now() - Duration::hours(1) - Duration::milliseconds(1), Status::Learning));

    let result = rank_queue(&problems, &states, &HashSet::new(), 10, now());
    assert_eq!(result.ordered, vec![B, A]);
  }

  #[test]
  fn test_equal_urgency_falls_back_to_sort_order() {
    let due = now() - Duration::days(1);
    let problems = vec![QueueCandidate::new(A, 9), QueueCandidate::new(B, 3)];
    let states = HashMap::from([
      (A, scheduled(due, Status::Learning)),
      (B, scheduled(due, Status::Review)),
    ]);

    let result = rank_queue(&problems, &states, &HashSet::new(), 10, now());
    assert_eq!(result.ordered, vec![B, A]);
  }

  #[test]
  fn test_due_exactly_now_is_overdue() {
    let problems = vec![QueueCandidate::new(A, 0), QueueCandidate::new(B, 5)];
    let states = HashMap::from([(B, scheduled(now(), Status::Learning))]);

    let result = rank_queue(&problems, &states, &HashSet::new(), 10, now());
    assert_eq!(result.ordered, vec![B, A]);
  }

  #[test]
  fn test_not_due_tier_ignores_due_date() {
    let problems = vec![QueueCandidate::new(A, 2), QueueCandidate::new(B, 1)];
    let states = HashMap::from([
      (A, scheduled(now() + Duration::days(1), Status::Learning)),
      (B, scheduled(now() + Duration::days(40), Status::Mastered)),
    ]);

    let result = rank_queue(&problems, &states, &HashSet::new(), 10, now());
    assert_eq!(result.ordered, vec![B, A]);
  }

  #[test]
  fn test_record_without_due_date_is_not_due() {
    let problems = vec![QueueCandidate::new(A, 0), QueueCandidate::new(B, 1)];
    let mut unscheduled = SchedulingState::default();
    unscheduled.status = Status::Learning;
    let states = HashMap::from([(A, unscheduled)]);

    let result = rank_queue(&problems, &states, &HashSet::new(), 10, now());
    assert_eq!(result.ordered, vec![B, A]);
  }

  #[test]
  fn test_duplicate_membership_ranked_once_with_min_order() {
    let problems = vec![
      QueueCandidate::new(A, 7),
      QueueCandidate::new(B, 3),
      QueueCandidate::new(A, 1),
    ];

    let result = rank_queue(&problems, &HashMap::new(), &HashSet::new(), 10, now());
    assert_eq!(result.ordered, vec![A, B]);
    assert!(!result.has_more);

    // Two distinct problems against a limit of two
    let result = rank_queue(&problems, &HashMap::new(), &HashSet::new(), 2, now());
    assert!(!result.has_more);
  }

  #[test]
  fn test_merge_candidates_keeps_first_position() {
    let merged = merge_candidates(&[
      QueueCandidate::new(C, 4),
      QueueCandidate::new(A, 2),
      QueueCandidate::new(C, 0),
    ]);
    assert_eq!(merged, vec![QueueCandidate::new(C, 0), QueueCandidate::new(A, 2)]);
  }

  #[test]
  fn test_guest_ranking_is_curriculum_order() {
    let problems = vec![
      QueueCandidate::new(A, 2),
      QueueCandidate::new(B, 0),
      QueueCandidate::new(C, 1),
    ];
    let result = rank_guest(&problems, 2);
    assert_eq!(result.ordered, vec![B, C]);
    assert!(result.has_more);
  }

  #[test]
  fn test_upcoming_sorted_by_due_date() {
    let states = HashMap::from([
      (A, scheduled(now() + Duration::days(9), Status::Learning)),
      (B, scheduled(now() - Duration::days(2), Status::Review)),
      (C, scheduled(now() + Duration::days(1), Status::Mastered)),
    ]);

    let result = rank_upcoming(&[A, B, C], &states);
    assert_eq!(result, vec![B, C, A]);
  }

  #[test]
  fn test_upcoming_excludes_new_and_unattempted() {
    let states = HashMap::from([
      (A, scheduled(now() + Duration::days(2), Status::New)),
      (B, scheduled(now() + Duration::days(1), Status::Learning)),
    ]);

    let result = rank_upcoming(&[A, B, C], &states);
    assert_eq!(result, vec![B]);
  }

  #[test]
  fn test_upcoming_unscheduled_sorts_last() {
    let mut unscheduled = SchedulingState::default();
    unscheduled.status = Status::Learning;
    let states = HashMap::from([
      (A, unscheduled),
      (B, scheduled(now() + Duration::days(30), Status::Mastered)),
    ]);

    let result = rank_upcoming(&[A, B, B], &states);
    assert_eq!(result, vec![B, A]);
  }
}
