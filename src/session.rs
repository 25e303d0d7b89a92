//! In-memory skip lists for study sessions.
//!
//! "Skip for now" hides a problem from the queue for the rest of a session
//! without touching its scheduling record. Entries are keyed by session ID
//! and expire after `SESSION_EXPIRY_HOURS` of inactivity.

use crate::config;
use crate::domain::ProblemId;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{LazyLock, Mutex, MutexGuard};

/// Skip list with last access time for expiration
struct SkipEntry {
  skipped: HashSet<ProblemId>,
  last_access: DateTime<Utc>,
}

/// Global skip store
static SKIPS: LazyLock<Mutex<HashMap<String, SkipEntry>>> =
  LazyLock::new(|| Mutex::new(HashMap::new()));

// A skip list is disposable, so a poisoned lock just hands back the data
fn lock() -> MutexGuard<'static, HashMap<String, SkipEntry>> {
  SKIPS.lock().unwrap_or_else(|poisoned| {
    tracing::warn!("Skip store lock poisoned, recovering");
    poisoned.into_inner()
  })
}

/// Hide a problem for the rest of the session
pub fn skip(session_id: &str, problem_id: ProblemId) {
  skip_at(&mut lock(), session_id, problem_id, Utc::now());
}

/// Problems skipped in this session (empty for unknown or expired sessions)
pub fn skipped(session_id: &str) -> HashSet<ProblemId> {
  skipped_at(&mut lock(), session_id, Utc::now())
}

/// Forget every skip in the session
pub fn clear(session_id: &str) {
  lock().remove(session_id);
}

fn skip_at(
  sessions: &mut HashMap<String, SkipEntry>,
  session_id: &str,
  problem_id: ProblemId,
  now: DateTime<Utc>,
) {
  // Clean up expired sessions occasionally (~10% chance)
  if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
    cleanup_expired(sessions, now);
  }

  let entry = sessions
    .entry(session_id.to_string())
    .or_insert_with(|| SkipEntry {
      skipped: HashSet::new(),
      last_access: now,
    });
  if is_expired(entry, now) {
    entry.skipped.clear();
  }
  entry.skipped.insert(problem_id);
  entry.last_access = now;
}

fn skipped_at(
  sessions: &mut HashMap<String, SkipEntry>,
  session_id: &str,
  now: DateTime<Utc>,
) -> HashSet<ProblemId> {
  match sessions.get_mut(session_id) {
    Some(entry) if !is_expired(entry, now) => {
      entry.last_access = now;
      entry.skipped.clone()
    }
    Some(_) => {
      sessions.remove(session_id);
      HashSet::new()
    }
    None => HashSet::new(),
  }
}

fn is_expired(entry: &SkipEntry, now: DateTime<Utc>) -> bool {
  entry.last_access <= now - Duration::hours(config::SESSION_EXPIRY_HOURS)
}

/// Clean up expired sessions
fn cleanup_expired(sessions: &mut HashMap<String, SkipEntry>, now: DateTime<Utc>) {
  sessions.retain(|_, entry| !is_expired(entry, now));
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36u8);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_skip_and_clear() {
    let id = generate_session_id();
    assert!(skipped(&id).is_empty());

    skip(&id, 7);
    skip(&id, 9);
    skip(&id, 7);
    assert_eq!(skipped(&id), HashSet::from([7, 9]));

    clear(&id);
    assert!(skipped(&id).is_empty());
  }

  #[test]
  fn test_sessions_are_isolated() {
    let a = generate_session_id();
    let b = generate_session_id();
    skip(&a, 1);
    assert!(skipped(&b).is_empty());
  }

  #[test]
  fn test_skips_expire_after_inactivity() {
    let mut sessions = HashMap::new();
    let start = Utc::now();
    skip_at(&mut sessions, "s", 3, start);

    let later = start + Duration::minutes(30);
    assert_eq!(skipped_at(&mut sessions, "s", later), HashSet::from([3]));

    // Reading refreshed the session, so the hour counts from `later`
    let expired = later + Duration::hours(config::SESSION_EXPIRY_HOURS);
    assert!(skipped_at(&mut sessions, "s", expired).is_empty());
    assert!(!sessions.contains_key("s"));
  }

  #[test]
  fn test_skip_on_expired_session_starts_fresh() {
    let mut sessions = HashMap::new();
    let start = Utc::now();
    skip_at(&mut sessions, "s", 3, start);
    let expired = start + Duration::hours(config::SESSION_EXPIRY_HOURS + 1);
    skip_at(&mut sessions, "s", 4, expired);
    assert_eq!(skipped_at(&mut sessions, "s", expired), HashSet::from([4]));
  }

  #[test]
  fn test_generate_session_id_format() {
    let id = generate_session_id();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
  }
}
