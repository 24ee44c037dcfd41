pub mod queue;
pub mod study;

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  routing::{get, post},
  Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::db::SqliteStore;
use crate::error::SrsError;
use crate::session::SessionStore;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
  pub store: SqliteStore,
  pub config: Arc<AppConfig>,
  pub sessions: Arc<SessionStore>,
}

impl AppState {
  pub fn new(store: SqliteStore, config: AppConfig) -> Self {
    let sessions = SessionStore::new(config.sessions.expiry_hours);
    Self {
      store,
      config: Arc::new(config),
      sessions: Arc::new(sessions),
    }
  }
}

impl SrsError {
  fn status_code(&self) -> StatusCode {
    match self {
      SrsError::InvariantViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      SrsError::VersionConflict { .. } => StatusCode::CONFLICT,
      SrsError::NotFound(_) => StatusCode::NOT_FOUND,
      SrsError::PersistenceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      SrsError::InvalidSessionState(_) => StatusCode::CONFLICT,
    }
  }
}

impl IntoResponse for SrsError {
  fn into_response(self) -> Response {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!("request failed: {}", self);
    }

    let body = json!({
      "error": self.to_string(),
      "status": status.as_u16(),
      "retryable": self.is_transient(),
    });

    (status, Json(body)).into_response()
  }
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route(
      "/learners/{learner_id}/decks/{deck_id}/sessions",
      post(study::start_session),
    )
    .route(
      "/learners/{learner_id}/decks/{deck_id}/queue",
      get(queue::queue_snapshot),
    )
    .route(
      "/learners/{learner_id}/cards/{card_id}/preview",
      get(queue::preview_card),
    )
    .route("/sessions/{session_id}", get(study::get_session))
    .route("/sessions/{session_id}/grade", post(study::grade_card))
    .route("/sessions/{session_id}/refill", post(study::refill_session))
    .route("/sessions/{session_id}/stop", post(study::stop_session))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
