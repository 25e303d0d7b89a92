use serde::{Deserialize, Serialize};

pub type ProblemId = i64;
pub type UserId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "Easy" | "easy" => Some(Self::Easy),
      "Medium" | "medium" => Some(Self::Medium),
      "Hard" | "hard" => Some(Self::Hard),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Easy => "Easy",
      Self::Medium => "Medium",
      Self::Hard => "Hard",
    }
  }
}

/// A practice problem in the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
  pub id: ProblemId,
  pub leetcode_id: Option<i64>,
  pub title: String,
  pub difficulty: Option<Difficulty>,
  pub url: Option<String>,
  pub tags: Vec<String>,
  /// Explicit grouping for aggregate views; never inferred from tag order
  pub category: Option<String>,
}

impl Problem {
  pub fn new(title: String, difficulty: Option<Difficulty>) -> Self {
    Self {
      id: 0,
      leetcode_id: None,
      title,
      difficulty,
      url: None,
      tags: Vec::new(),
      category: None,
    }
  }
}

/// A named, ordered curriculum of problems
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemSet {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub is_preset: bool,
}

/// One problem's position inside one curriculum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetMembership {
  pub problem_set_id: i64,
  pub problem_id: ProblemId,
  pub sort_order: i64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_difficulty_from_str() {
    assert_eq!(Difficulty::from_str("Easy"), Some(Difficulty::Easy));
    assert_eq!(Difficulty::from_str("medium"), Some(Difficulty::Medium));
    assert_eq!(Difficulty::from_str("Hard"), Some(Difficulty::Hard));
    assert_eq!(Difficulty::from_str("HARD"), None);
    assert_eq!(Difficulty::from_str(""), None);
  }

  #[test]
  fn test_difficulty_as_str_roundtrip() {
    for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
      assert_eq!(Difficulty::from_str(d.as_str()), Some(d));
    }
  }

  #[test]
  fn test_problem_new_defaults() {
    let p = Problem::new("Two Sum".to_string(), Some(Difficulty::Easy));
    assert_eq!(p.id, 0);
    assert_eq!(p.title, "Two Sum");
    assert!(p.leetcode_id.is_none());
    assert!(p.url.is_none());
    assert!(p.tags.is_empty());
    assert!(p.category.is_none());
  }
}
