//! Import a JSON problem catalogue into a preset curriculum.
//!
//! The file is an array of objects:
//!
//! ```json
//! [{ "leetcode_id": 1, "title": "Two Sum", "difficulty": "Easy",
//!    "url": "https://leetcode.com/problems/two-sum/",
//!    "tags": ["Array", "Hash Table"], "category": "Arrays & Hashing" }]
//! ```

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::{add_set_item, upsert_problem, upsert_set};
use crate::domain::{Difficulty, Problem};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedProblem {
  pub leetcode_id: i64,
  pub title: String,
  #[serde(default)]
  pub difficulty: Option<String>,
  #[serde(default)]
  pub url: Option<String>,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub category: Option<String>,
}

impl SeedProblem {
  fn to_problem(&self) -> Problem {
    let mut problem = Problem::new(
      self.title.clone(),
      self.difficulty.as_deref().and_then(Difficulty::from_str),
    );
    problem.leetcode_id = Some(self.leetcode_id);
    problem.url = self.url.clone();
    problem.tags = self.tags.clone();
    problem.category = self.category.clone();
    problem
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
  pub problem_set_id: i64,
  pub problems: usize,
  pub duplicates_skipped: usize,
}

pub fn load_seed_file(path: &Path) -> crate::Result<Vec<SeedProblem>> {
  let content = std::fs::read_to_string(path)?;
  Ok(serde_json::from_str(&content)?)
}

/// Upsert every problem and place it in the named set in file order.
///
/// Repeated LeetCode numbers keep their first occurrence. Runs in one
/// transaction so a bad row leaves the catalogue untouched.
pub fn seed_problem_set(
  conn: &Connection,
  name: &str,
  description: Option<&str>,
  problems: &[SeedProblem],
  now: DateTime<Utc>,
) -> crate::Result<SeedReport> {
  let tx = conn.unchecked_transaction()?;
  let set_id = upsert_set(&tx, name, description, true, now)?;

  let mut seen = HashSet::new();
  let mut position = 0i64;
  for seed in problems {
    if !seen.insert(seed.leetcode_id) {
      continue;
    }
    let problem_id = upsert_problem(&tx, &seed.to_problem(), now)?;
    add_set_item(&tx, set_id, problem_id, position)?;
    position += 1;
  }
  tx.commit()?;

  let report = SeedReport {
    problem_set_id: set_id,
    problems: seen.len(),
    duplicates_skipped: problems.len() - seen.len(),
  };
  tracing::info!(
    "Seeded {} problems into '{}' ({} duplicates skipped)",
    report.problems,
    name,
    report.duplicates_skipped
  );
  Ok(report)
}
