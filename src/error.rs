//! Error taxonomy shared by the scheduler, the queue and the session controller.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SrsError {
  /// Caller handed us corrupt state (ease below the floor, unknown grade or
  /// status, negative counters). Never retried.
  #[error("invariant violation: {0}")]
  InvariantViolation(String),

  /// Conditional write rejected because the stored record moved on.
  #[error("version conflict: expected version {expected}, found {actual}")]
  VersionConflict { expected: i64, actual: i64 },

  #[error("not found: {0}")]
  NotFound(String),

  #[error("persistence unavailable: {0}")]
  PersistenceUnavailable(String),

  /// Operation not allowed in the session's current state.
  #[error("invalid session state: {0}")]
  InvalidSessionState(String),
}

impl SrsError {
  pub fn invariant(msg: impl Into<String>) -> Self {
    Self::InvariantViolation(msg.into())
  }

  /// Transient errors are worth a "please retry" in the UI.
  pub fn is_transient(&self) -> bool {
    matches!(self, Self::VersionConflict { .. } | Self::PersistenceUnavailable(_))
  }
}

impl From<rusqlite::Error> for SrsError {
  fn from(e: rusqlite::Error) -> Self {
    Self::PersistenceUnavailable(e.to_string())
  }
}

pub type Result<T> = std::result::Result<T, SrsError>;
