//! Problem catalogue

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result, Row};

use super::{placeholders, to_db_time};
use crate::domain::{Difficulty, Problem, ProblemId};

const PROBLEM_COLUMNS: &str = "id, leetcode_id, title, difficulty, url, tags, category";

fn tags_to_json(tags: &[String]) -> Result<String> {
  serde_json::to_string(tags).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn row_to_problem(row: &Row<'_>) -> Result<Problem> {
  let difficulty: Option<String> = row.get(3)?;
  let tags_json: String = row.get(5)?;
  let tags: Vec<String> = serde_json::from_str(&tags_json)
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

  Ok(Problem {
    id: row.get(0)?,
    leetcode_id: row.get(1)?,
    title: row.get(2)?,
    difficulty: difficulty.as_deref().and_then(Difficulty::from_str),
    url: row.get(4)?,
    tags,
    category: row.get(6)?,
  })
}

pub fn insert_problem(conn: &Connection, problem: &Problem, now: DateTime<Utc>) -> Result<ProblemId> {
  conn.execute(
    r#"
    INSERT INTO problems (leetcode_id, title, difficulty, url, tags, category, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    "#,
    params![
      problem.leetcode_id,
      problem.title,
      problem.difficulty.map(|d| d.as_str()),
      problem.url,
      tags_to_json(&problem.tags)?,
      problem.category,
      to_db_time(now),
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

/// Insert, or refresh the existing row with the same LeetCode number.
///
/// Problems without a LeetCode number are always inserted.
pub fn upsert_problem(conn: &Connection, problem: &Problem, now: DateTime<Utc>) -> Result<ProblemId> {
  let Some(leetcode_id) = problem.leetcode_id else {
    return insert_problem(conn, problem, now);
  };

  conn.execute(
    r#"
    INSERT INTO problems (leetcode_id, title, difficulty, url, tags, category, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT (leetcode_id) DO UPDATE SET
      title = excluded.title,
      difficulty = excluded.difficulty,
      url = excluded.url,
      tags = excluded.tags,
      category = excluded.category
    "#,
    params![
      leetcode_id,
      problem.title,
      problem.difficulty.map(|d| d.as_str()),
      problem.url,
      tags_to_json(&problem.tags)?,
      problem.category,
      to_db_time(now),
    ],
  )?;

  conn.query_row(
    "SELECT id FROM problems WHERE leetcode_id = ?1",
    params![leetcode_id],
    |row| row.get(0),
  )
}

pub fn get_problem(conn: &Connection, id: ProblemId) -> Result<Option<Problem>> {
  conn
    .query_row(
      &format!("SELECT {} FROM problems WHERE id = ?1", PROBLEM_COLUMNS),
      params![id],
      row_to_problem,
    )
    .optional()
}

/// Fetch several problems; ids with no row are skipped
pub fn get_problems_by_ids(conn: &Connection, ids: &[ProblemId]) -> Result<Vec<Problem>> {
  if ids.is_empty() {
    return Ok(Vec::new());
  }

  let sql = format!(
    "SELECT {} FROM problems WHERE id IN ({})",
    PROBLEM_COLUMNS,
    placeholders(ids.len())
  );
  let mut stmt = conn.prepare(&sql)?;
  let problems = stmt
    .query_map(params_from_iter(ids.iter()), row_to_problem)?
    .collect::<Result<Vec<_>>>()?;
  Ok(problems)
}

/// Whole catalogue by LeetCode number, unnumbered problems last
pub fn list_problems(conn: &Connection) -> Result<Vec<Problem>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM problems ORDER BY leetcode_id IS NULL, leetcode_id ASC, id ASC",
    PROBLEM_COLUMNS
  ))?;
  let problems = stmt
    .query_map([], row_to_problem)?
    .collect::<Result<Vec<_>>>()?;
  Ok(problems)
}
