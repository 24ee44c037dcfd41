use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, SrsError};

/// Hard floor for the ease factor. Not configurable.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Learner's self-reported recall quality for one presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
  Again,
  Hard,
  Good,
  Easy,
}

impl Grade {
  pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

  /// Map a UI button rating (1-4) to a grade
  pub fn from_u8(value: u8) -> Result<Self> {
    match value {
      1 => Ok(Self::Again),
      2 => Ok(Self::Hard),
      3 => Ok(Self::Good),
      4 => Ok(Self::Easy),
      _ => Err(SrsError::invariant(format!("grade {} out of range 1-4", value))),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Again => "AGAIN",
      Self::Hard => "HARD",
      Self::Good => "GOOD",
      Self::Easy => "EASY",
    }
  }

  pub fn is_correct(&self) -> bool {
    matches!(self, Self::Hard | Self::Good | Self::Easy)
  }
}

impl FromStr for Grade {
  type Err = SrsError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "AGAIN" | "again" => Ok(Self::Again),
      "HARD" | "hard" => Ok(Self::Hard),
      "GOOD" | "good" => Ok(Self::Good),
      "EASY" | "easy" => Ok(Self::Easy),
      _ => Err(SrsError::invariant(format!("unrecognized grade '{}'", s))),
    }
  }
}

/// Persisted status of a record. A card without a record is implicitly new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
  Learning,
  Review,
}

impl Status {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Learning => "LEARNING",
      Self::Review => "REVIEW",
    }
  }
}

impl FromStr for Status {
  type Err = SrsError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "LEARNING" => Ok(Self::Learning),
      "REVIEW" => Ok(Self::Review),
      _ => Err(SrsError::invariant(format!("unrecognized status '{}'", s))),
    }
  }
}

/// Cached queue classification, always derived from the record state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueType {
  New,
  Learning,
  Review,
}

impl QueueType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::New => "NEW",
      Self::Learning => "LEARNING",
      Self::Review => "REVIEW",
    }
  }
}

impl FromStr for QueueType {
  type Err = SrsError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "NEW" => Ok(Self::New),
      "LEARNING" => Ok(Self::Learning),
      "REVIEW" => Ok(Self::Review),
      _ => Err(SrsError::invariant(format!("unrecognized queueType '{}'", s))),
    }
  }
}

/// Scheduling state. Learning cards sit on a rung of the learning ladder;
/// review cards carry a day interval and a repetition streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
  Learning { step: u32 },
  Review { interval_days: u32, repetitions: u32 },
}

/// Scheduling state for one (learner, card) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PersistedReviewRecord", into = "PersistedReviewRecord")]
pub struct ReviewRecord {
  pub learner_id: i64,
  pub card_id: i64,
  pub state: ReviewState,
  pub ease_factor: f64,
  /// Earliest time the card may reappear
  pub next_review_at: DateTime<Utc>,
  /// Grading time that produced this state
  pub last_reviewed_at: DateTime<Utc>,
  /// Version this record was read at; 0 means it has never been stored
  pub version: i64,
}

impl ReviewRecord {
  /// State of a card that has never been graded, before the first grade applies
  pub fn fresh(learner_id: i64, card_id: i64, starting_ease: f64, now: DateTime<Utc>) -> Self {
    Self {
      learner_id,
      card_id,
      state: ReviewState::Learning { step: 0 },
      ease_factor: starting_ease,
      next_review_at: now,
      last_reviewed_at: now,
      version: 0,
    }
  }

  pub fn status(&self) -> Status {
    match self.state {
      ReviewState::Learning { .. } => Status::Learning,
      ReviewState::Review { .. } => Status::Review,
    }
  }

  pub fn queue_type(&self) -> QueueType {
    match self.status() {
      Status::Learning => QueueType::Learning,
      Status::Review => QueueType::Review,
    }
  }

  pub fn repetitions(&self) -> u32 {
    match self.state {
      ReviewState::Learning { .. } => 0,
      ReviewState::Review { repetitions, .. } => repetitions,
    }
  }

  /// Days while reviewing, ladder index while learning
  pub fn interval(&self) -> u32 {
    match self.state {
      ReviewState::Learning { step } => step,
      ReviewState::Review { interval_days, .. } => interval_days,
    }
  }

  pub fn learning_step(&self) -> u32 {
    match self.state {
      ReviewState::Learning { step } => step,
      ReviewState::Review { .. } => 0,
    }
  }

  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    self.next_review_at <= now
  }

  /// How long the card has been due; negative when not yet due
  pub fn overdue_by(&self, now: DateTime<Utc>) -> chrono::Duration {
    now - self.next_review_at
  }

  /// Checks the invariants that do not depend on scheduler configuration.
  pub fn validate(&self) -> Result<()> {
    if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE_FACTOR {
      return Err(SrsError::invariant(format!(
        "card {}: ease factor {} below floor {}",
        self.card_id, self.ease_factor, MIN_EASE_FACTOR
      )));
    }
    if let ReviewState::Review { interval_days: 0, .. } = self.state {
      return Err(SrsError::invariant(format!(
        "card {}: review interval must be at least one day",
        self.card_id
      )));
    }
    if self.version < 0 {
      return Err(SrsError::invariant(format!(
        "card {}: negative version {}",
        self.card_id, self.version
      )));
    }
    Ok(())
  }
}

/// Flat storage shape. Field names are the persisted contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedReviewRecord {
  pub learner_id: i64,
  pub card_id: i64,
  pub status: String,
  pub queue_type: String,
  pub next_review_at: DateTime<Utc>,
  pub last_reviewed_at: DateTime<Utc>,
  pub repetitions: i64,
  pub ease_factor: f64,
  pub interval: i64,
  pub learning_step: i64,
  pub version: i64,
}

fn non_negative(card_id: i64, field: &str, value: i64) -> Result<u32> {
  u32::try_from(value).map_err(|_| {
    SrsError::invariant(format!("card {}: {} out of range ({})", card_id, field, value))
  })
}

impl TryFrom<PersistedReviewRecord> for ReviewRecord {
  type Error = SrsError;

  fn try_from(p: PersistedReviewRecord) -> Result<Self> {
    let status: Status = p.status.parse()?;
    let queue_type: QueueType = p.queue_type.parse()?;
    let repetitions = non_negative(p.card_id, "repetitions", p.repetitions)?;
    let interval = non_negative(p.card_id, "interval", p.interval)?;
    let learning_step = non_negative(p.card_id, "learningStep", p.learning_step)?;

    let state = match status {
      Status::Learning => {
        if repetitions != 0 {
          return Err(SrsError::invariant(format!(
            "card {}: LEARNING record with {} repetitions",
            p.card_id, repetitions
          )));
        }
        ReviewState::Learning { step: learning_step }
      }
      Status::Review => ReviewState::Review {
        interval_days: interval,
        repetitions,
      },
    };

    let record = ReviewRecord {
      learner_id: p.learner_id,
      card_id: p.card_id,
      state,
      ease_factor: p.ease_factor,
      next_review_at: p.next_review_at,
      last_reviewed_at: p.last_reviewed_at,
      version: p.version,
    };

    if queue_type != record.queue_type() {
      return Err(SrsError::invariant(format!(
        "card {}: queueType {} inconsistent with status {}",
        p.card_id,
        queue_type.as_str(),
        status.as_str()
      )));
    }
    record.validate()?;
    Ok(record)
  }
}

impl From<ReviewRecord> for PersistedReviewRecord {
  fn from(r: ReviewRecord) -> Self {
    Self {
      learner_id: r.learner_id,
      card_id: r.card_id,
      status: r.status().as_str().to_string(),
      queue_type: r.queue_type().as_str().to_string(),
      next_review_at: r.next_review_at,
      last_reviewed_at: r.last_reviewed_at,
      repetitions: i64::from(r.repetitions()),
      ease_factor: r.ease_factor,
      interval: i64::from(r.interval()),
      learning_step: i64::from(r.learning_step()),
      version: r.version,
    }
  }
}
