//! Append-only review history

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, Result};

use super::{from_db_time, placeholders, to_db_time};
use crate::domain::{ProblemId, Rating, ReviewEvent, UserId};

pub fn insert_review_event(conn: &Connection, event: &ReviewEvent) -> Result<i64> {
  conn.execute(
    r#"
    INSERT INTO review_history (user_id, problem_id, rating, time_spent, notes, reviewed_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#,
    params![
      event.user_id,
      event.problem_id,
      event.rating.as_str(),
      event.time_spent,
      event.notes,
      to_db_time(event.reviewed_at),
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

/// Ratings submitted at or after `since`
pub fn count_reviews_since(conn: &Connection, user_id: UserId, since: DateTime<Utc>) -> Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM review_history WHERE user_id = ?1 AND reviewed_at >= ?2",
    params![user_id, to_db_time(since)],
    |row| row.get(0),
  )
}

pub fn total_reviews(conn: &Connection, user_id: UserId) -> Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM review_history WHERE user_id = ?1",
    params![user_id],
    |row| row.get(0),
  )
}

/// Number of ratings per problem; problems never rated are absent
pub fn attempt_counts(
  conn: &Connection,
  user_id: UserId,
  problem_ids: &[ProblemId],
) -> Result<HashMap<ProblemId, i64>> {
  if problem_ids.is_empty() {
    return Ok(HashMap::new());
  }

  let sql = format!(
    "SELECT problem_id, COUNT(*) FROM review_history WHERE user_id = ? AND problem_id IN ({}) GROUP BY problem_id",
    placeholders(problem_ids.len())
  );
  let mut stmt = conn.prepare(&sql)?;
  let values = std::iter::once(&user_id).chain(problem_ids.iter());
  let counts = stmt
    .query_map(params_from_iter(values), |row| Ok((row.get(0)?, row.get(1)?)))?
    .collect::<Result<HashMap<_, _>>>()?;
  Ok(counts)
}

/// History of one problem, newest first
pub fn get_review_events(
  conn: &Connection,
  user_id: UserId,
  problem_id: ProblemId,
) -> Result<Vec<ReviewEvent>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, user_id, problem_id, rating, time_spent, notes, reviewed_at
    FROM review_history
    WHERE user_id = ?1 AND problem_id = ?2
    ORDER BY reviewed_at DESC, id DESC
    "#,
  )?;

  let events = stmt
    .query_map(params![user_id, problem_id], |row| {
      let rating: String = row.get(3)?;
      let reviewed_at: String = row.get(6)?;
      Ok(ReviewEvent {
        id: row.get(0)?,
        user_id: row.get(1)?,
        problem_id: row.get(2)?,
        rating: rating
          .parse::<Rating>()
          .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        time_spent: row.get(4)?,
        notes: row.get(5)?,
        reviewed_at: from_db_time(6, &reviewed_at)?,
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(events)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{insert_problem, run_migrations};
  use crate::domain::Problem;
  use crate::testing::fixed_now;
  use chrono::{Duration, TimeZone};

  fn setup() -> (Connection, ProblemId, ProblemId) {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    let a = insert_problem(&conn, &Problem::new("A".to_string(), None), fixed_now()).unwrap();
    let b = insert_problem(&conn, &Problem::new("B".to_string(), None), fixed_now()).unwrap();
    (conn, a, b)
  }

  fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap()
  }

  #[test]
  fn test_insert_and_read_back() {
    let (conn, a, _) = setup();
    let event = ReviewEvent::new(1, a, Rating::Medium, Some(20), Some("two pointers".to_string()), at(9));
    let id = insert_review_event(&conn, &event).unwrap();

    let events = get_review_events(&conn, 1, a).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, id);
    assert_eq!(events[0].rating, Rating::Medium);
    assert_eq!(events[0].time_spent, Some(20));
    assert_eq!(events[0].notes.as_deref(), Some("two pointers"));
    assert_eq!(events[0].reviewed_at, at(9));
  }

  #[test]
  fn test_history_is_append_only() {
    let (conn, a, _) = setup();
    insert_review_event(&conn, &ReviewEvent::new(1, a, Rating::Again, None, None, at(8))).unwrap();
    insert_review_event(&conn, &ReviewEvent::new(1, a, Rating::Easy, None, None, at(9))).unwrap();

    let ratings: Vec<Rating> = get_review_events(&conn, 1, a).unwrap().iter().map(|e| e.rating).collect();
    assert_eq!(ratings, vec![Rating::Easy, Rating::Again]);
    assert_eq!(total_reviews(&conn, 1).unwrap(), 2);
  }

  #[test]
  fn test_count_reviews_since_is_inclusive() {
    let (conn, a, b) = setup();
    insert_review_event(&conn, &ReviewEvent::new(1, a, Rating::Hard, None, None, at(6))).unwrap();
    insert_review_event(&conn, &ReviewEvent::new(1, b, Rating::Hard, None, None, at(9))).unwrap();
    insert_review_event(&conn, &ReviewEvent::new(2, b, Rating::Hard, None, None, at(9))).unwrap();

    assert_eq!(count_reviews_since(&conn, 1, at(9)).unwrap(), 1);
    assert_eq!(count_reviews_since(&conn, 1, at(0)).unwrap(), 2);
    assert_eq!(count_reviews_since(&conn, 1, at(9) + Duration::milliseconds(1)).unwrap(), 0);
  }

  #[test]
  fn test_attempt_counts() {
    let (conn, a, b) = setup();
    for hour in [7, 8, 9] {
      insert_review_event(&conn, &ReviewEvent::new(1, a, Rating::Medium, None, None, at(hour))).unwrap();
    }

    let counts = attempt_counts(&conn, 1, &[a, b]).unwrap();
    assert_eq!(counts.get(&a), Some(&3));
    assert_eq!(counts.get(&b), None);
    assert!(attempt_counts(&conn, 1, &[]).unwrap().is_empty());
  }
}
