//! Aggregates for the progress dashboard

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result};
use serde::Serialize;

use super::to_db_time;
use crate::domain::{Status, UserId};

/// Scheduling records per mastery status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
  pub new: i64,
  pub learning: i64,
  pub review: i64,
  pub mastered: i64,
}

impl StatusCounts {
  pub fn attempted(&self) -> i64 {
    self.learning + self.review + self.mastered
  }
}

pub fn status_counts(conn: &Connection, user_id: UserId) -> Result<StatusCounts> {
  let mut stmt =
    conn.prepare("SELECT status, COUNT(*) FROM user_progress WHERE user_id = ?1 GROUP BY status")?;
  let rows = stmt.query_map(params![user_id], |row| {
    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
  })?;

  let mut counts = StatusCounts::default();
  for row in rows {
    let (status, count) = row?;
    match Status::from_str(&status) {
      Status::New => counts.new += count,
      Status::Learning => counts.learning += count,
      Status::Review => counts.review += count,
      Status::Mastered => counts.mastered += count,
    }
  }
  Ok(counts)
}

/// Ratings per UTC calendar day since `since`; days without activity are absent
pub fn activity_by_day(
  conn: &Connection,
  user_id: UserId,
  since: DateTime<Utc>,
) -> Result<BTreeMap<NaiveDate, i64>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT substr(reviewed_at, 1, 10) AS day, COUNT(*)
    FROM review_history
    WHERE user_id = ?1 AND reviewed_at >= ?2
    GROUP BY day
    "#,
  )?;

  let activity = stmt
    .query_map(params![user_id, to_db_time(since)], |row| {
      let day: String = row.get(0)?;
      let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
      Ok((date, row.get(1)?))
    })?
    .collect::<Result<BTreeMap<_, _>>>()?;
  Ok(activity)
}
