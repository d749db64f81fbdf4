//! HTTP endpoint handlers. These are thin wrappers that forward to the directory.
//! Each handler is instrumented; logs include parameters and basic result info (never passwords).

use std::sync::Arc;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument, warn};

use crate::engine::SESSION_LENGTH;
use crate::error::QuizError;
use crate::protocol::*;
use crate::state::AppState;

type HttpError = (StatusCode, Json<ErrorOut>);

fn http_error(e: QuizError) -> HttpError {
  let status = match e {
    QuizError::InvalidInput(_) => StatusCode::BAD_REQUEST,
    QuizError::InvalidCredentials => StatusCode::UNAUTHORIZED,
    _ => StatusCode::BAD_GATEWAY,
  };
  (status, Json(ErrorOut { error: e.to_string() }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "trivia_quiz_backend", backend = state.backend, "Health check");
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_categories(State(state): State<Arc<AppState>>) -> Result<Json<CategoriesOut>, HttpError> {
  match state.directory.categories().await {
    Ok(categories) => {
      info!(target: "trivia_quiz_backend", count = categories.len(), "HTTP categories served");
      Ok(Json(CategoriesOut { categories }))
    }
    Err(e) => {
      warn!(target: "trivia_quiz_backend", error = %e, "Category catalog unavailable");
      Err(http_error(e))
    }
  }
}

#[instrument(level = "info", skip(state, body), fields(username = %body.username))]
pub async fn http_post_login(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LoginIn>,
) -> Result<Json<LoginOut>, HttpError> {
  if body.username.trim().is_empty() || body.password.trim().is_empty() {
    return Err(http_error(QuizError::InvalidInput("username and password are required".into())));
  }
  let user = state.directory.login(&body.username, &body.password).await.map_err(|e| {
    warn!(target: "trivia_quiz_backend", error = %e, "Login failed");
    http_error(e)
  })?;
  info!(target: "trivia_quiz_backend", user_id = user.id, "HTTP login ok");
  Ok(Json(LoginOut { user }))
}

#[instrument(level = "info")]
pub async fn http_get_settings() -> impl IntoResponse {
  Json(SettingsOut { session_length: SESSION_LENGTH })
}
