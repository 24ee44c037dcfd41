//! Read-only views: what a session would study now, and what each grade would do.

use axum::{
  extract::{Path, State},
  Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AppState;
use crate::domain::Grade;
use crate::error::{Result, SrsError};
use crate::srs::{self, DueCounts, QueueLimits, StudyItem};
use crate::store::ReviewStore;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
  pub items: Vec<StudyItem>,
  pub due: DueCounts,
  pub new_available: usize,
  /// Set only when nothing is due right now
  pub next_due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradePreview {
  pub grade: Grade,
  pub next_review_at: DateTime<Utc>,
}

pub async fn queue_snapshot(
  State(state): State<AppState>,
  Path((learner_id, deck_id)): Path<(i64, i64)>,
) -> Result<Json<QueueSnapshot>> {
  let now = Utc::now();
  let cards = state.store.list_cards(deck_id)?;
  let records = state.store.list_review_records(learner_id, deck_id)?;

  let due = srs::due_counts(&records, now);
  let next_due_at = if due.learning + due.review == 0 {
    srs::next_due_at(&records, now)
  } else {
    None
  };

  let (reviewed, new_cards) = srs::split_by_record(cards, records);
  let new_available = new_cards.len();
  let items = srs::build_queue(
    reviewed,
    new_cards,
    now,
    QueueLimits::from_config(&state.config.srs),
  );

  Ok(Json(QueueSnapshot {
    items,
    due,
    new_available,
    next_due_at,
  }))
}

pub async fn preview_card(
  State(state): State<AppState>,
  Path((learner_id, card_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<GradePreview>>> {
  if state.store.get_card(card_id)?.is_none() {
    return Err(SrsError::NotFound(format!("card {}", card_id)));
  }
  let existing = state.store.get_review_record(learner_id, card_id)?;

  let previews = srs::preview(
    existing.as_ref(),
    learner_id,
    card_id,
    Utc::now(),
    &state.config.srs,
  )?
  .into_iter()
  .map(|(grade, next_review_at)| GradePreview {
    grade,
    next_review_at,
  })
  .collect();

  Ok(Json(previews))
}
