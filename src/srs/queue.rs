//! Due-card selection for a study session.
//!
//! The queue is a deterministic snapshot:
//! - due learning cards first, earliest `next_review_at` first
//! - then due review cards, most overdue first
//! - then new cards in deck order, capped per session
//!
//! Learning and review cards share the review cap, learning cards are admitted first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::SrsConfig;
use crate::domain::{Card, ReviewRecord, ReviewState};

/// Why an item is in the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueKind {
  DueLearning,
  DueReview,
  New,
}

/// A card ready to be presented, with the record it was selected from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyItem {
  pub kind: QueueKind,
  pub card: Card,
  pub record: Option<ReviewRecord>,
}

impl StudyItem {
  pub fn card_id(&self) -> i64 {
    self.card.id
  }

  /// Version to use for the conditional write after grading this item
  pub fn expected_version(&self) -> i64 {
    self.record.as_ref().map_or(0, |r| r.version)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueLimits {
  pub new_per_session: usize,
  pub review_per_session: usize,
}

impl QueueLimits {
  pub fn from_config(config: &SrsConfig) -> Self {
    Self {
      new_per_session: config.new_per_session,
      review_per_session: config.review_per_session,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DueCounts {
  pub learning: usize,
  pub review: usize,
}

/// Classify a stored record; `None` when it is not due yet
pub fn classify(record: &ReviewRecord, now: DateTime<Utc>) -> Option<QueueKind> {
  if !record.is_due(now) {
    return None;
  }
  match record.state {
    ReviewState::Learning { .. } => Some(QueueKind::DueLearning),
    ReviewState::Review { .. } => Some(QueueKind::DueReview),
  }
}

/// Build the ordered study queue for one learner and deck.
pub fn build_queue(
  reviewed: Vec<(Card, ReviewRecord)>,
  new_cards: Vec<Card>,
  now: DateTime<Utc>,
  limits: QueueLimits,
) -> Vec<StudyItem> {
  let mut learning = Vec::new();
  let mut review = Vec::new();

  for (card, record) in reviewed {
    match classify(&record, now) {
      Some(QueueKind::DueLearning) => learning.push((card, record)),
      Some(QueueKind::DueReview) => review.push((card, record)),
      _ => {}
    }
  }

  // Ascending next_review_at is both earliest-first for learning and
  // most-overdue-first for review. Card id settles exact ties.
  learning.sort_by_key(|(card, record)| (record.next_review_at, card.id));
  review.sort_by_key(|(card, record)| (record.next_review_at, card.id));

  let mut queue = Vec::new();
  let due = learning
    .into_iter()
    .map(|pair| (QueueKind::DueLearning, pair))
    .chain(review.into_iter().map(|pair| (QueueKind::DueReview, pair)))
    .take(limits.review_per_session);
  for (kind, (card, record)) in due {
    queue.push(StudyItem {
      kind,
      card,
      record: Some(record),
    });
  }

  let mut new_cards = new_cards;
  new_cards.sort_by_key(|card| card.deck_order());
  queue.extend(
    new_cards
      .into_iter()
      .take(limits.new_per_session)
      .map(|card| StudyItem {
        kind: QueueKind::New,
        card,
        record: None,
      }),
  );

  tracing::debug!(
    items = queue.len(),
    learning = queue.iter().filter(|i| i.kind == QueueKind::DueLearning).count(),
    review = queue.iter().filter(|i| i.kind == QueueKind::DueReview).count(),
    "built study queue"
  );

  queue
}

/// Put already-admitted items back into presentation order: due learning by
/// `next_review_at`, then due review most overdue first, then new in deck order.
pub fn sort_for_presentation(items: &mut [StudyItem]) {
  items.sort_by_key(|item| {
    let due_at = item.record.as_ref().map(|r| r.next_review_at);
    match item.kind {
      QueueKind::DueLearning => (0, due_at, item.card.id, 0),
      QueueKind::DueReview => (1, due_at, item.card.id, 0),
      QueueKind::New => {
        let (position, id) = item.card.deck_order();
        (2, None, position, id)
      }
    }
  });
}

/// Join a deck's cards with a learner's records. Cards without a record are new.
pub fn split_by_record(
  cards: Vec<Card>,
  records: Vec<ReviewRecord>,
) -> (Vec<(Card, ReviewRecord)>, Vec<Card>) {
  let mut by_card: HashMap<i64, ReviewRecord> =
    records.into_iter().map(|r| (r.card_id, r)).collect();

  let mut reviewed = Vec::new();
  let mut new_cards = Vec::new();
  for card in cards {
    match by_card.remove(&card.id) {
      Some(record) => reviewed.push((card, record)),
      None => new_cards.push(card),
    }
  }

  if !by_card.is_empty() {
    tracing::debug!("ignoring {} records for cards not in the deck", by_card.len());
  }

  (reviewed, new_cards)
}

pub fn due_counts<'a>(
  records: impl IntoIterator<Item = &'a ReviewRecord>,
  now: DateTime<Utc>,
) -> DueCounts {
  let mut counts = DueCounts::default();
  for record in records {
    match classify(record, now) {
      Some(QueueKind::DueLearning) => counts.learning += 1,
      Some(QueueKind::DueReview) => counts.review += 1,
      _ => {}
    }
  }
  counts
}

/// Earliest time after `now` at which some card becomes due
pub fn next_due_at<'a>(
  records: impl IntoIterator<Item = &'a ReviewRecord>,
  now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
  records
    .into_iter()
    .map(|r| r.next_review_at)
    .filter(|at| *at > now)
    .min()
}
