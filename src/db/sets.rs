//! Curricula and per-user curriculum activation

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use super::to_db_time;
use crate::domain::{ProblemId, ProblemSet, SetMembership, UserId};
use crate::srs::QueueCandidate;

fn row_to_set(row: &Row<'_>) -> Result<ProblemSet> {
  Ok(ProblemSet {
    id: row.get(0)?,
    name: row.get(1)?,
    description: row.get(2)?,
    is_preset: row.get(3)?,
  })
}

/// Create a set, or refresh the description of the set with the same name
pub fn upsert_set(
  conn: &Connection,
  name: &str,
  description: Option<&str>,
  is_preset: bool,
  now: DateTime<Utc>,
) -> Result<i64> {
  conn.execute(
    r#"
    INSERT INTO problem_sets (name, description, is_preset, created_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT (name) DO UPDATE SET
      description = excluded.description,
      is_preset = excluded.is_preset
    "#,
    params![name, description, is_preset, to_db_time(now)],
  )?;

  conn.query_row(
    "SELECT id FROM problem_sets WHERE name = ?1",
    params![name],
    |row| row.get(0),
  )
}

pub fn get_set(conn: &Connection, id: i64) -> Result<Option<ProblemSet>> {
  conn
    .query_row(
      "SELECT id, name, description, is_preset FROM problem_sets WHERE id = ?1",
      params![id],
      row_to_set,
    )
    .optional()
}

pub fn find_set_by_name(conn: &Connection, name: &str) -> Result<Option<ProblemSet>> {
  conn
    .query_row(
      "SELECT id, name, description, is_preset FROM problem_sets WHERE name = ?1",
      params![name],
      row_to_set,
    )
    .optional()
}

/// Preset curricula with their member counts, oldest first
pub fn list_preset_sets(conn: &Connection) -> Result<Vec<(ProblemSet, i64)>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT s.id, s.name, s.description, s.is_preset, COUNT(i.problem_id)
    FROM problem_sets s
    LEFT JOIN problem_set_items i ON i.problem_set_id = s.id
    WHERE s.is_preset = 1
    GROUP BY s.id
    ORDER BY s.id ASC
    "#,
  )?;

  let sets = stmt
    .query_map([], |row| Ok((row_to_set(row)?, row.get(4)?)))?
    .collect::<Result<Vec<_>>>()?;
  Ok(sets)
}

/// Place a problem in a set; re-adding moves it to the new position
pub fn add_set_item(
  conn: &Connection,
  problem_set_id: i64,
  problem_id: ProblemId,
  sort_order: i64,
) -> Result<()> {
  conn.execute(
    r#"
    INSERT INTO problem_set_items (problem_set_id, problem_id, sort_order)
    VALUES (?1, ?2, ?3)
    ON CONFLICT (problem_set_id, problem_id) DO UPDATE SET sort_order = excluded.sort_order
    "#,
    params![problem_set_id, problem_id, sort_order],
  )?;
  Ok(())
}

/// Members of one set in curriculum order
pub fn get_set_items(conn: &Connection, problem_set_id: i64) -> Result<Vec<SetMembership>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT problem_set_id, problem_id, sort_order
    FROM problem_set_items
    WHERE problem_set_id = ?1
    ORDER BY sort_order ASC, problem_id ASC
    "#,
  )?;

  let items = stmt
    .query_map(params![problem_set_id], |row| {
      Ok(SetMembership {
        problem_set_id: row.get(0)?,
        problem_id: row.get(1)?,
        sort_order: row.get(2)?,
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(items)
}

/// Flip a user's subscription to a set, creating it active on first use.
///
/// Returns the new active flag.
pub fn toggle_user_set(
  conn: &Connection,
  user_id: UserId,
  problem_set_id: i64,
  now: DateTime<Utc>,
) -> Result<bool> {
  let existing: Option<bool> = conn
    .query_row(
      "SELECT is_active FROM user_problem_sets WHERE user_id = ?1 AND problem_set_id = ?2",
      params![user_id, problem_set_id],
      |row| row.get(0),
    )
    .optional()?;

  match existing {
    Some(active) => {
      conn.execute(
        "UPDATE user_problem_sets SET is_active = ?1 WHERE user_id = ?2 AND problem_set_id = ?3",
        params![!active, user_id, problem_set_id],
      )?;
      Ok(!active)
    }
    None => {
      conn.execute(
        r#"
        INSERT INTO user_problem_sets (user_id, problem_set_id, is_active, added_at)
        VALUES (?1, ?2, 1, ?3)
        "#,
        params![user_id, problem_set_id, to_db_time(now)],
      )?;
      Ok(true)
    }
  }
}

pub fn get_active_set_ids(conn: &Connection, user_id: UserId) -> Result<Vec<i64>> {
  let mut stmt = conn.prepare(
    "SELECT problem_set_id FROM user_problem_sets WHERE user_id = ?1 AND is_active = 1 ORDER BY problem_set_id",
  )?;
  let ids = stmt
    .query_map(params![user_id], |row| row.get(0))?
    .collect::<Result<Vec<i64>>>()?;
  Ok(ids)
}

/// Every problem in the user's active sets, with its smallest sort order
pub fn get_active_pool(conn: &Connection, user_id: UserId) -> Result<Vec<QueueCandidate>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT i.problem_id, MIN(i.sort_order) AS sort_order
    FROM problem_set_items i
    JOIN user_problem_sets u ON u.problem_set_id = i.problem_set_id
    WHERE u.user_id = ?1 AND u.is_active = 1
    GROUP BY i.problem_id
    ORDER BY sort_order ASC, i.problem_id ASC
    "#,
  )?;

  let pool = stmt
    .query_map(params![user_id], |row| {
      Ok(QueueCandidate::new(row.get(0)?, row.get(1)?))
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(pool)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{insert_problem, run_migrations};
  use crate::domain::Problem;
  use crate::testing::fixed_now;

  fn conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    conn
  }

  fn problem(conn: &Connection, title: &str) -> ProblemId {
    insert_problem(conn, &Problem::new(title.to_string(), None), fixed_now()).unwrap()
  }

  #[test]
  fn test_upsert_set_by_name() {
    let conn = conn();
    let id = upsert_set(&conn, "Blind 75", None, true, fixed_now()).unwrap();
    let again = upsert_set(&conn, "Blind 75", Some("Classic list"), true, fixed_now()).unwrap();
    assert_eq!(id, again);

    let set = find_set_by_name(&conn, "Blind 75").unwrap().unwrap();
    assert_eq!(set.description.as_deref(), Some("Classic list"));
    assert!(set.is_preset);
    assert_eq!(get_set(&conn, id).unwrap(), Some(set));
    assert!(find_set_by_name(&conn, "Grind 169").unwrap().is_none());
  }

  #[test]
  fn test_list_preset_sets_counts_members() {
    let conn = conn();
    let blind = upsert_set(&conn, "Blind 75", None, true, fixed_now()).unwrap();
    let empty = upsert_set(&conn, "Grind 169", None, true, fixed_now()).unwrap();
    upsert_set(&conn, "My picks", None, false, fixed_now()).unwrap();
    add_set_item(&conn, blind, problem(&conn, "A"), 0).unwrap();
    add_set_item(&conn, blind, problem(&conn, "B"), 1).unwrap();

    let listed: Vec<(i64, i64)> = list_preset_sets(&conn)
      .unwrap()
      .into_iter()
      .map(|(set, count)| (set.id, count))
      .collect();
    assert_eq!(listed, vec![(blind, 2), (empty, 0)]);
  }

  #[test]
  fn test_set_created_at_uses_supplied_clock() {
    let conn = conn();
    let id = upsert_set(&conn, "Blind 75", None, true, fixed_now()).unwrap();
    let stored: String = conn
      .query_row("SELECT created_at FROM problem_sets WHERE id = ?1", params![id], |row| row.get(0))
      .unwrap();
    assert_eq!(stored, to_db_time(fixed_now()));
  }

  #[test]
  fn test_set_items_in_order() {
    let conn = conn();
    let set = upsert_set(&conn, "Blind 75", None, true, fixed_now()).unwrap();
    let a = problem(&conn, "A");
    let b = problem(&conn, "B");
    add_set_item(&conn, set, a, 5).unwrap();
    add_set_item(&conn, set, b, 2).unwrap();

    let items: Vec<ProblemId> = get_set_items(&conn, set).unwrap().iter().map(|m| m.problem_id).collect();
    assert_eq!(items, vec![b, a]);

    // Re-adding moves the problem
    add_set_item(&conn, set, a, 0).unwrap();
    let items: Vec<ProblemId> = get_set_items(&conn, set).unwrap().iter().map(|m| m.problem_id).collect();
    assert_eq!(items, vec![a, b]);
  }

  #[test]
  fn test_toggle_user_set() {
    let conn = conn();
    let set = upsert_set(&conn, "Blind 75", None, true, fixed_now()).unwrap();
    let now = fixed_now();

    assert!(toggle_user_set(&conn, 1, set, now).unwrap());
    assert_eq!(get_active_set_ids(&conn, 1).unwrap(), vec![set]);

    assert!(!toggle_user_set(&conn, 1, set, now).unwrap());
    assert!(get_active_set_ids(&conn, 1).unwrap().is_empty());

    assert!(toggle_user_set(&conn, 1, set, now).unwrap());
    // Other users unaffected
    assert!(get_active_set_ids(&conn, 2).unwrap().is_empty());
  }

  #[test]
  fn test_active_pool_takes_min_sort_order() {
    let conn = conn();
    let first = upsert_set(&conn, "NeetCode 150", None, true, fixed_now()).unwrap();
    let second = upsert_set(&conn, "Blind 75", None, true, fixed_now()).unwrap();
    let inactive = upsert_set(&conn, "Grind 169", None, true, fixed_now()).unwrap();

    let a = problem(&conn, "A");
    let b = problem(&conn, "B");
    let c = problem(&conn, "C");
    add_set_item(&conn, first, a, 10).unwrap();
    add_set_item(&conn, first, b, 1).unwrap();
    add_set_item(&conn, second, a, 0).unwrap();
    add_set_item(&conn, inactive, c, 0).unwrap();

    let now = fixed_now();
    toggle_user_set(&conn, 1, first, now).unwrap();
    toggle_user_set(&conn, 1, second, now).unwrap();

    let pool = get_active_pool(&conn, 1).unwrap();
    assert_eq!(pool, vec![QueueCandidate::new(a, 0), QueueCandidate::new(b, 1)]);
  }

  #[test]
  fn test_active_pool_empty_without_sets() {
    let conn = conn();
    assert!(get_active_pool(&conn, 1).unwrap().is_empty());
  }
}
