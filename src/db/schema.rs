use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Create tables with COMPLETE schema for new databases
  // Migrations below handle upgrades for existing databases
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS problems (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      leetcode_id INTEGER UNIQUE,
      title TEXT NOT NULL,
      difficulty TEXT,
      url TEXT,
      tags TEXT NOT NULL DEFAULT '[]',
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS problem_sets (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL UNIQUE,
      description TEXT,
      is_preset INTEGER NOT NULL DEFAULT 0,
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS problem_set_items (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      problem_set_id INTEGER NOT NULL,
      problem_id INTEGER NOT NULL,
      sort_order INTEGER NOT NULL DEFAULT 0,
      UNIQUE (problem_set_id, problem_id),
      FOREIGN KEY (problem_set_id) REFERENCES problem_sets(id),
      FOREIGN KEY (problem_id) REFERENCES problems(id)
    );

    CREATE TABLE IF NOT EXISTS user_problem_sets (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      problem_set_id INTEGER NOT NULL,
      is_active INTEGER NOT NULL DEFAULT 1,
      added_at TEXT NOT NULL,
      UNIQUE (user_id, problem_set_id),
      FOREIGN KEY (problem_set_id) REFERENCES problem_sets(id)
    );

    -- One scheduling record per user and problem, overwritten on every rating
    CREATE TABLE IF NOT EXISTS user_progress (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      problem_id INTEGER NOT NULL,
      ease_factor REAL NOT NULL DEFAULT 2.5,
      interval_days INTEGER NOT NULL DEFAULT 0,
      repetitions INTEGER NOT NULL DEFAULT 0,
      next_review TEXT,
      last_reviewed TEXT,
      status TEXT NOT NULL DEFAULT 'new',
      UNIQUE (user_id, problem_id),
      FOREIGN KEY (problem_id) REFERENCES problems(id)
    );

    -- Append-only
    CREATE TABLE IF NOT EXISTS review_history (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      problem_id INTEGER NOT NULL,
      rating TEXT NOT NULL,
      time_spent INTEGER,
      notes TEXT,
      reviewed_at TEXT NOT NULL,
      FOREIGN KEY (problem_id) REFERENCES problems(id)
    );

    CREATE TABLE IF NOT EXISTS profiles (
      user_id INTEGER PRIMARY KEY,
      display_name TEXT,
      daily_goal INTEGER NOT NULL DEFAULT 3,
      created_at TEXT NOT NULL
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_set_items_problem ON problem_set_items(problem_id);
    CREATE INDEX IF NOT EXISTS idx_user_sets_active ON user_problem_sets(user_id, is_active);
    CREATE INDEX IF NOT EXISTS idx_progress_next_review ON user_progress(user_id, next_review);
    CREATE INDEX IF NOT EXISTS idx_progress_status ON user_progress(user_id, status);
    CREATE INDEX IF NOT EXISTS idx_history_user_time ON review_history(user_id, reviewed_at);
    CREATE INDEX IF NOT EXISTS idx_history_problem ON review_history(user_id, problem_id);
    "#,
  )?;

  // ============================================================
  // MIGRATIONS FOR EXISTING DATABASES
  // ============================================================

  // Migration: explicit category replaces reading the first tag
  add_column_if_missing(conn, "problems", "category", "TEXT")?;

  Ok(())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, column_def: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    tracing::info!("Migrating: adding {}.{}", table, column);
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();
    assert!(column_exists(&conn, "problems", "category"));
  }

  #[test]
  fn test_progress_unique_per_user_and_problem() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    conn
      .execute(
        "INSERT INTO problems (title, created_at) VALUES ('Two Sum', '2025-01-01T00:00:00.000Z')",
        [],
      )
      .unwrap();
    conn
      .execute("INSERT INTO user_progress (user_id, problem_id) VALUES (1, 1)", [])
      .unwrap();
    assert!(
      conn
        .execute("INSERT INTO user_progress (user_id, problem_id) VALUES (1, 1)", [])
        .is_err()
    );
  }
}
