use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};

use super::to_db_time;
use crate::domain::UserId;

/// Stored daily goal; `None` when the user never set one
pub fn get_daily_goal(conn: &Connection, user_id: UserId) -> Result<Option<i64>> {
  conn
    .query_row(
      "SELECT daily_goal FROM profiles WHERE user_id = ?1",
      params![user_id],
      |row| row.get(0),
    )
    .optional()
}

pub fn set_daily_goal(conn: &Connection, user_id: UserId, goal: i64, now: DateTime<Utc>) -> Result<()> {
  conn.execute(
    r#"
    INSERT INTO profiles (user_id, daily_goal, created_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT (user_id) DO UPDATE SET daily_goal = excluded.daily_goal
    "#,
    params![user_id, goal, to_db_time(now)],
  )?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::run_migrations;
  use crate::testing::fixed_now;

  #[test]
  fn test_daily_goal() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();

    assert_eq!(get_daily_goal(&conn, 1).unwrap(), None);
    set_daily_goal(&conn, 1, 5, fixed_now()).unwrap();
    assert_eq!(get_daily_goal(&conn, 1).unwrap(), Some(5));
    set_daily_goal(&conn, 1, 12, fixed_now()).unwrap();
    assert_eq!(get_daily_goal(&conn, 1).unwrap(), Some(12));
    assert_eq!(get_daily_goal(&conn, 2).unwrap(), None);
  }

  #[test]
  fn test_profile_created_at_uses_supplied_clock() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    set_daily_goal(&conn, 1, 4, fixed_now()).unwrap();

    let stored: String = conn
      .query_row("SELECT created_at FROM profiles WHERE user_id = 1", [], |row| row.get(0))
      .unwrap();
    assert_eq!(stored, to_db_time(fixed_now()));
  }
}
