//! In-memory registry of running study sessions.
//!
//! Controllers are keyed by a random session ID and expire after a
//! configurable period of inactivity.

use crate::config;
use crate::error::{Result, SrsError};
use crate::srs::StudySessionController;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Session entry with last access time for expiration
struct SessionEntry {
  controller: StudySessionController,
  last_access: DateTime<Utc>,
}

pub struct SessionStore {
  sessions: Mutex<HashMap<String, SessionEntry>>,
  expiry: Duration,
}

impl SessionStore {
  /// Out-of-range expiries fall back to the default
  pub fn new(expiry_hours: i64) -> Self {
    let expiry = Duration::try_hours(expiry_hours)
      .filter(|expiry| *expiry > Duration::zero())
      .unwrap_or_else(|| {
        tracing::warn!(expiry_hours, "invalid session expiry, using default");
        Duration::hours(config::SESSION_EXPIRY_HOURS)
      });
    Self {
      sessions: Mutex::new(HashMap::new()),
      expiry,
    }
  }

  fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, SessionEntry>>> {
    self
      .sessions
      .lock()
      .map_err(|_| SrsError::PersistenceUnavailable("session store lock poisoned".into()))
  }

  /// Register a controller under a fresh ID and return the ID
  pub fn insert(&self, controller: StudySessionController) -> Result<String> {
    let mut sessions = self.lock()?;
    let now = Utc::now();

    // Clean up expired sessions occasionally (~10% chance)
    if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
      self.cleanup_expired(&mut sessions, now);
    }

    let mut session_id = generate_session_id();
    while sessions.contains_key(&session_id) {
      session_id = generate_session_id();
    }
    sessions.insert(
      session_id.clone(),
      SessionEntry {
        controller,
        last_access: now,
      },
    );
    Ok(session_id)
  }

  /// Run `f` against the session's controller, refreshing its last access
  pub fn with_session<R>(
    &self,
    session_id: &str,
    f: impl FnOnce(&mut StudySessionController) -> Result<R>,
  ) -> Result<R> {
    let mut sessions = self.lock()?;
    let now = Utc::now();
    let entry = sessions
      .get_mut(session_id)
      .filter(|entry| entry.last_access > now - self.expiry)
      .ok_or_else(|| SrsError::NotFound(format!("session {}", session_id)))?;
    entry.last_access = now;
    f(&mut entry.controller)
  }

  pub fn remove(&self, session_id: &str) -> Result<bool> {
    Ok(self.lock()?.remove(session_id).is_some())
  }

  pub fn len(&self) -> usize {
    self.lock().map(|s| s.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Drop every session idle since before `now - expiry`. Returns how many went.
  pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
    let mut sessions = self.lock()?;
    Ok(self.cleanup_expired(&mut sessions, now))
  }

  fn cleanup_expired(&self, sessions: &mut HashMap<String, SessionEntry>, now: DateTime<Utc>) -> usize {
    let cutoff = now - self.expiry;
    let before = sessions.len();
    sessions.retain(|_, entry| entry.last_access > cutoff);
    let removed = before - sessions.len();
    if removed > 0 {
      tracing::info!(removed, "expired study sessions cleaned up");
    }
    removed
  }
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
