//! Study session endpoints: start, inspect, grade, refill, stop.

use axum::{
  extract::{Path, State},
  http::StatusCode,
  Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::Grade;
use crate::error::Result;
use crate::srs::{GradeOutcome, SessionState, SessionStats, StudyItem, StudySessionController};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
  pub session_id: String,
  pub learner_id: i64,
  pub deck_id: i64,
  pub state: SessionState,
  pub current: Option<StudyItem>,
  pub stats: SessionStats,
}

impl SessionView {
  fn of(session_id: &str, controller: &StudySessionController) -> Self {
    Self {
      session_id: session_id.to_string(),
      learner_id: controller.learner_id(),
      deck_id: controller.deck_id(),
      state: controller.state(),
      current: controller.current().cloned(),
      stats: controller.stats(),
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRequest {
  pub card_id: i64,
  pub grade: Grade,
}

#[derive(Debug, Serialize)]
pub struct GradeResponse {
  pub result: GradeOutcome,
  pub session: SessionView,
}

pub async fn start_session(
  State(state): State<AppState>,
  Path((learner_id, deck_id)): Path<(i64, i64)>,
) -> Result<(StatusCode, Json<SessionView>)> {
  let mut controller = StudySessionController::new(learner_id, deck_id, state.config.srs.clone());
  controller.start(&state.store, Utc::now())?;

  let session_id = state.sessions.insert(controller)?;
  let view = state
    .sessions
    .with_session(&session_id, |c| Ok(SessionView::of(&session_id, c)))?;
  Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_session(
  State(state): State<AppState>,
  Path(session_id): Path<String>,
) -> Result<Json<SessionView>> {
  let view = state
    .sessions
    .with_session(&session_id, |c| Ok(SessionView::of(&session_id, c)))?;
  Ok(Json(view))
}

pub async fn grade_card(
  State(state): State<AppState>,
  Path(session_id): Path<String>,
  Json(req): Json<GradeRequest>,
) -> Result<Json<GradeResponse>> {
  let response = state.sessions.with_session(&session_id, |c| {
    let result = c.grade(&state.store, req.card_id, req.grade, Utc::now())?;
    Ok(GradeResponse {
      result,
      session: SessionView::of(&session_id, c),
    })
  })?;
  Ok(Json(response))
}

pub async fn refill_session(
  State(state): State<AppState>,
  Path(session_id): Path<String>,
) -> Result<Json<SessionView>> {
  let view = state.sessions.with_session(&session_id, |c| {
    c.refill(&state.store, Utc::now())?;
    Ok(SessionView::of(&session_id, c))
  })?;
  Ok(Json(view))
}

pub async fn stop_session(
  State(state): State<AppState>,
  Path(session_id): Path<String>,
) -> Result<Json<SessionView>> {
  let view = state.sessions.with_session(&session_id, |c| {
    c.stop();
    Ok(SessionView::of(&session_id, c))
  })?;
  Ok(Json(view))
}
