//! Scheduling records (one per user and problem)

use std::collections::HashMap;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result, Row};

use super::{from_db_time_opt, placeholders, to_db_time};
use crate::domain::{ProblemId, SchedulingState, Status, UserId};

const PROGRESS_COLUMNS: &str =
  "problem_id, ease_factor, interval_days, repetitions, status, next_review, last_reviewed";

fn row_to_state(row: &Row<'_>) -> Result<(ProblemId, SchedulingState)> {
  let status: String = row.get(4)?;
  Ok((
    row.get(0)?,
    SchedulingState {
      ease_factor: row.get(1)?,
      interval: row.get(2)?,
      repetitions: row.get(3)?,
      status: Status::from_str(&status),
      next_review: from_db_time_opt(5, row.get(5)?)?,
      last_reviewed: from_db_time_opt(6, row.get(6)?)?,
    },
  ))
}

pub fn get_progress(
  conn: &Connection,
  user_id: UserId,
  problem_id: ProblemId,
) -> Result<Option<SchedulingState>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM user_progress WHERE user_id = ?1 AND problem_id = ?2",
        PROGRESS_COLUMNS
      ),
      params![user_id, problem_id],
      row_to_state,
    )
    .optional()
    .map(|found| found.map(|(_, state)| state))
}

/// Records for the given problems; problems never attempted are absent
pub fn get_progress_map(
  conn: &Connection,
  user_id: UserId,
  problem_ids: &[ProblemId],
) -> Result<HashMap<ProblemId, SchedulingState>> {
  if problem_ids.is_empty() {
    return Ok(HashMap::new());
  }

  let sql = format!(
    "SELECT {} FROM user_progress WHERE user_id = ? AND problem_id IN ({})",
    PROGRESS_COLUMNS,
    placeholders(problem_ids.len())
  );
  let mut stmt = conn.prepare(&sql)?;
  let values = std::iter::once(&user_id).chain(problem_ids.iter());
  let map = stmt
    .query_map(params_from_iter(values), row_to_state)?
    .collect::<Result<HashMap<_, _>>>()?;
  Ok(map)
}

/// Write a record, replacing whatever was stored for this user and problem
pub fn upsert_progress(
  conn: &Connection,
  user_id: UserId,
  problem_id: ProblemId,
  state: &SchedulingState,
) -> Result<()> {
  conn.execute(
    r#"
    INSERT INTO user_progress
      (user_id, problem_id, ease_factor, interval_days, repetitions, status, next_review, last_reviewed)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT (user_id, problem_id) DO UPDATE SET
      ease_factor = excluded.ease_factor,
      interval_days = excluded.interval_days,
      repetitions = excluded.repetitions,
      status = excluded.status,
      next_review = excluded.next_review,
      last_reviewed = excluded.last_reviewed
    "#,
    params![
      user_id,
      problem_id,
      state.ease_factor,
      state.interval,
      state.repetitions,
      state.status.as_str(),
      state.next_review.map(to_db_time),
      state.last_reviewed.map(to_db_time),
    ],
  )?;
  Ok(())
}

/// Drop records so the problems count as never attempted again
pub fn delete_progress(conn: &Connection, user_id: UserId, problem_ids: &[ProblemId]) -> Result<usize> {
  if problem_ids.is_empty() {
    return Ok(0);
  }

  let sql = format!(
    "DELETE FROM user_progress WHERE user_id = ? AND problem_id IN ({})",
    placeholders(problem_ids.len())
  );
  let values = std::iter::once(&user_id).chain(problem_ids.iter());
  conn.execute(&sql, params_from_iter(values))
}
