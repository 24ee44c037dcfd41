//! SM-2 scheduling with a short learning-step ladder.
//!
//! New and lapsed cards climb the learning ladder (minutes). Passing the last
//! rung graduates the card to day-scale review intervals that grow by the
//! ease factor. The function is pure: the grading time comes in as `now`.

use chrono::{DateTime, Duration, Utc};

use crate::config::SrsConfig;
use crate::domain::{Grade, ReviewRecord, ReviewState, MIN_EASE_FACTOR};
use crate::error::{Result, SrsError};

/// Compute the record that results from grading a card.
///
/// `existing` is `None` for a card that has never been graded; it is treated
/// as a fresh learning card on step 0 with the starting ease. Corrupt input
/// (ease below the floor, a step past the ladder, a zero review interval, a
/// record for another key, a grading time earlier than the last one) is
/// rejected rather than repaired.
pub fn schedule(
  existing: Option<&ReviewRecord>,
  learner_id: i64,
  card_id: i64,
  grade: Grade,
  now: DateTime<Utc>,
  config: &SrsConfig,
) -> Result<ReviewRecord> {
  let current = match existing {
    Some(record) => {
      check_input(record, learner_id, card_id, now, config)?;
      record.clone()
    }
    None => ReviewRecord::fresh(learner_id, card_id, config.starting_ease, now),
  };

  let mut next = current.clone();
  next.last_reviewed_at = now;

  match (current.state, grade) {
    (ReviewState::Learning { .. }, Grade::Again) => {
      next.state = ReviewState::Learning { step: 0 };
      next.next_review_at = due_after(now, step_duration(config, 0)?)?;
    }
    (ReviewState::Learning { step }, _) => {
      let next_step = step + 1;
      if next_step as usize >= config.step_count() {
        let interval_days = if grade == Grade::Easy {
          config.easy_graduating_interval_days
        } else {
          config.graduating_interval_days
        };
        next.state = ReviewState::Review {
          interval_days,
          repetitions: 1,
        };
        next.next_review_at = due_after(now, days(interval_days)?)?;
      } else {
        next.state = ReviewState::Learning { step: next_step };
        next.next_review_at = due_after(now, step_duration(config, next_step)?)?;
      }
    }
    (
      ReviewState::Review {
        interval_days,
        repetitions,
      },
      _,
    ) => match Recall::from_grade(grade) {
      None => {
        // Lapse: back to the first rung, streak reset, ease penalised
        next.ease_factor = floor_ease(current.ease_factor - config.lapse_ease_penalty);
        next.state = ReviewState::Learning { step: 0 };
        next.next_review_at = due_after(now, step_duration(config, 0)?)?;
      }
      Some(recall) => {
        let (ease_factor, new_interval) =
          grow_interval(interval_days, current.ease_factor, recall, config);
        next.ease_factor = ease_factor;
        next.state = ReviewState::Review {
          interval_days: new_interval,
          repetitions: repetitions.saturating_add(1),
        };
        next.next_review_at = due_after(now, days(new_interval)?)?;
      }
    },
  }

  tracing::debug!(
    card_id,
    learner_id,
    grade = grade.as_str(),
    status = next.status().as_str(),
    interval = next.interval(),
    ease = next.ease_factor,
    "scheduled card"
  );

  Ok(next)
}

/// Next-due time each grade would produce, in button order.
pub fn preview(
  existing: Option<&ReviewRecord>,
  learner_id: i64,
  card_id: i64,
  now: DateTime<Utc>,
  config: &SrsConfig,
) -> Result<Vec<(Grade, DateTime<Utc>)>> {
  Grade::ALL
    .iter()
    .map(|grade| {
      schedule(existing, learner_id, card_id, *grade, now, config)
        .map(|record| (*grade, record.next_review_at))
    })
    .collect()
}

/// A passing grade on a review card
#[derive(Debug, Clone, Copy)]
enum Recall {
  Hard,
  Good,
  Easy,
}

impl Recall {
  fn from_grade(grade: Grade) -> Option<Self> {
    match grade {
      Grade::Again => None,
      Grade::Hard => Some(Self::Hard),
      Grade::Good => Some(Self::Good),
      Grade::Easy => Some(Self::Easy),
    }
  }
}

/// Successful review of a graduated card: adjust ease, then stretch the interval
fn grow_interval(interval_days: u32, ease_factor: f64, recall: Recall, config: &SrsConfig) -> (f64, u32) {
  let interval = f64::from(interval_days);
  let (ease, raw) = match recall {
    Recall::Hard => {
      let ease = floor_ease(ease_factor - config.hard_ease_penalty);
      (ease, (interval * config.hard_interval_multiplier).round().max(1.0))
    }
    Recall::Good => (ease_factor, (interval * ease_factor).round()),
    Recall::Easy => {
      let ease = ease_factor + config.easy_ease_bonus;
      (ease, (interval * ease * config.easy_interval_multiplier).round())
    }
  };
  let capped = raw.min(f64::from(config.max_interval_days)) as u32;
  (ease, capped)
}

fn floor_ease(ease: f64) -> f64 {
  ease.max(MIN_EASE_FACTOR)
}

fn step_duration(config: &SrsConfig, step: u32) -> Result<Duration> {
  config
    .step_duration(step)
    .ok_or_else(|| SrsError::invariant(format!("learning step {} missing from the ladder or out of range", step)))
}

fn days(interval_days: u32) -> Result<Duration> {
  Duration::try_days(i64::from(interval_days))
    .ok_or_else(|| SrsError::invariant(format!("interval of {} days is out of range", interval_days)))
}

fn due_after(now: DateTime<Utc>, delay: Duration) -> Result<DateTime<Utc>> {
  now
    .checked_add_signed(delay)
    .ok_or_else(|| SrsError::invariant(format!("due date {} + {} is out of range", now, delay)))
}

fn check_input(
  record: &ReviewRecord,
  learner_id: i64,
  card_id: i64,
  now: DateTime<Utc>,
  config: &SrsConfig,
) -> Result<()> {
  if record.learner_id != learner_id || record.card_id != card_id {
    return Err(SrsError::invariant(format!(
      "record for learner {} card {} passed for learner {} card {}",
      record.learner_id, record.card_id, learner_id, card_id
    )));
  }
  record.validate()?;
  if let ReviewState::Learning { step } = record.state {
    if step as usize >= config.step_count() {
      return Err(SrsError::invariant(format!(
        "card {}: learning step {} beyond ladder of {}",
        card_id,
        step,
        config.step_count()
      )));
    }
  }
  if now < record.last_reviewed_at {
    return Err(SrsError::invariant(format!(
      "card {}: grading time {} precedes last review {}",
      card_id, now, record.last_reviewed_at
    )));
  }
  Ok(())
}
