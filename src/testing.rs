//! Test utilities for database setup.
//!
//! Provides helpers that reuse the authoritative schema initialization,
//! eliminating schema duplication in test code.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use tempfile::TempDir;

use crate::db;
use crate::domain::{Difficulty, Problem, ProblemId, UserId};

/// Test environment with a study database built by `run_migrations`.
///
/// The database file lives in a temporary directory that is removed when
/// the environment is dropped.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    /// Connection with the full schema (all migrations)
    pub conn: Connection,
}

impl TestEnv {
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let conn = Connection::open(temp.path().join("study.db"))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        db::run_migrations(&conn)?;

        Ok(Self { temp, conn })
    }

    /// Insert a problem with a LeetCode number and return its id
    pub fn add_problem(&self, leetcode_id: i64, title: &str) -> rusqlite::Result<ProblemId> {
        let mut problem = Problem::new(title.to_string(), Some(Difficulty::Medium));
        problem.leetcode_id = Some(leetcode_id);
        db::insert_problem(&self.conn, &problem, fixed_now())
    }

    /// Create a preset set whose sort order follows the slice order
    pub fn add_set(&self, name: &str, problems: &[ProblemId]) -> rusqlite::Result<i64> {
        let set_id = db::upsert_set(&self.conn, name, None, true, fixed_now())?;
        for (position, problem_id) in problems.iter().enumerate() {
            db::add_set_item(&self.conn, set_id, *problem_id, position as i64)?;
        }
        Ok(set_id)
    }

    /// Subscribe a user to a set
    pub fn activate(&self, user_id: UserId, set_id: i64) -> rusqlite::Result<()> {
        if !db::toggle_user_set(&self.conn, user_id, set_id, fixed_now())? {
            db::toggle_user_set(&self.conn, user_id, set_id, fixed_now())?;
        }
        Ok(())
    }
}

/// Fixed clock for deterministic scheduling tests: 2025-03-10 09:30 UTC
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0)
        .single()
        .unwrap_or_default()
}
