//! Minimal client for the trivia REST API.
//!
//! We only call the four endpoints the quiz needs (next question, save result,
//! category map, login). Every response is wrapped in `{success, ...}`; a
//! transport error, a non-2xx status or `success: false` is a failure.
//! Calls are instrumented and log status codes and sizes, never passwords.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use crate::config::ApiConfig;
use crate::domain::{Category, CategoryFilter, Question, QuestionId, QuestionRequest, ResultSubmission, UserProfile};
use crate::error::QuizError;
use crate::source::{Directory, QuestionSource, ResultSink};
use crate::util::trunc_for_log;

const CLIENT_UA: &str = "trivia-quiz-backend/0.1";

/// Errors emitted by `TriviaApi`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TriviaApiError {
  #[error(transparent)]
  Http(#[from] reqwest::Error),
  #[error("trivia API HTTP {status}: {message}")]
  Status { status: StatusCode, message: String },
  #[error("trivia API rejected the request: {0}")]
  Rejected(String),
}

#[derive(Clone)]
pub struct TriviaApi {
  pub client: reqwest::Client,
  pub base_url: String,
}

impl TriviaApi {
  /// Construct the client if a base URL is configured; otherwise return None.
  pub fn from_config(api: &ApiConfig) -> Option<Self> {
    let base_url = api.base_url.as_deref()?.trim_end_matches('/').to_string();
    match reqwest::Client::builder().timeout(Duration::from_secs(api.timeout_secs)).build() {
      Ok(client) => Some(Self { client, base_url }),
      Err(e) => {
        error!(target: "trivia_api", error = %e, "Failed to build HTTP client");
        None
      }
    }
  }

  #[instrument(level = "info", skip(self, request), fields(excluded = request.previous_questions.len()))]
  pub async fn next_question(&self, request: &QuestionRequest) -> Result<Option<Question>, TriviaApiError> {
    let body = QuizReq {
      previous_questions: &request.previous_questions,
      quiz_category: request.category.as_ref(),
    };
    let res: QuizResp = self.post_json("/api/quizzes", &body).await?;
    Ok(res.question.map(QuestionWire::into_question))
  }

  #[instrument(level = "info", skip(self))]
  pub async fn save_result(&self, submission: &ResultSubmission) -> Result<UserProfile, TriviaApiError> {
    let res: UserResp = self.post_json("/api/quizzes/results", submission).await?;
    Ok(res.user)
  }

  #[instrument(level = "info", skip(self))]
  pub async fn categories(&self) -> Result<Vec<Category>, TriviaApiError> {
    let res: CategoriesResp = self.get_json("/api/categories?pagination=n&type=map").await?;
    let mut out: Vec<Category> = res
      .categories
      .into_iter()
      .filter_map(|(id, kind)| match id.parse::<i64>() {
        Ok(id) => Some(Category { id, kind }),
        Err(_) => {
          warn!(target: "trivia_api", %id, "Skipping category with non-numeric id");
          None
        }
      })
      .collect();
    out.sort_by_key(|c| c.id);
    Ok(out)
  }

  #[instrument(level = "info", skip(self, password))]
  pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile, TriviaApiError> {
    let res: UserResp = self.post_json("/api/login", &LoginReq { username, password }).await?;
    Ok(res.user)
  }

  async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, TriviaApiError> {
    let url = format!("{}{}", self.base_url, path);
    let res = self.client.post(&url)
      .header(USER_AGENT, CLIENT_UA)
      .header(CONTENT_TYPE, "application/json")
      .json(body).send().await?;
    Self::read_envelope(path, res).await
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TriviaApiError> {
    let url = format!("{}{}", self.base_url, path);
    let res = self.client.get(&url).header(USER_AGENT, CLIENT_UA).send().await?;
    Self::read_envelope(path, res).await
  }

  async fn read_envelope<T: DeserializeOwned>(path: &str, res: reqwest::Response) -> Result<T, TriviaApiError> {
    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      error!(target: "trivia_api", %path, %status, body = %trunc_for_log(&body, 200), "Trivia API error status");
      let message = extract_api_error(&body).unwrap_or(body);
      return Err(TriviaApiError::Status { status, message });
    }

    let env: Envelope<T> = res.json().await?;
    if !env.success {
      let message = env.message.unwrap_or_else(|| "success=false".into());
      return Err(TriviaApiError::Rejected(message));
    }
    debug!(target: "trivia_api", %path, %status, "Trivia API call ok");
    Ok(env.body)
  }
}

#[async_trait]
impl QuestionSource for TriviaApi {
  async fn next_question(&self, request: &QuestionRequest) -> Result<Option<Question>, QuizError> {
    TriviaApi::next_question(self, request).await.map_err(|e| QuizError::SourceUnavailable(e.to_string()))
  }
}

#[async_trait]
impl ResultSink for TriviaApi {
  async fn save_result(&self, submission: &ResultSubmission) -> Result<UserProfile, QuizError> {
    TriviaApi::save_result(self, submission).await.map_err(|e| QuizError::SinkUnavailable(e.to_string()))
  }
}

#[async_trait]
impl Directory for TriviaApi {
  async fn categories(&self) -> Result<Vec<Category>, QuizError> {
    TriviaApi::categories(self).await.map_err(|e| QuizError::DirectoryUnavailable(e.to_string()))
  }

  async fn login(&self, username: &str, password: &str) -> Result<UserProfile, QuizError> {
    TriviaApi::login(self, username, password).await.map_err(|e| match e {
      TriviaApiError::Status { status, .. } if status == StatusCode::UNAUTHORIZED => QuizError::InvalidCredentials,
      TriviaApiError::Status { status, message } if status == StatusCode::BAD_REQUEST => QuizError::InvalidInput(message),
      other => QuizError::DirectoryUnavailable(other.to_string()),
    })
  }
}

// --- Wire DTOs ---

#[derive(Deserialize)]
struct Envelope<T> {
  #[serde(default)]
  success: bool,
  #[serde(default)]
  message: Option<String>,
  #[serde(flatten)]
  body: T,
}

#[derive(Serialize)]
struct QuizReq<'a> {
  previous_questions: &'a [QuestionId],
  #[serde(skip_serializing_if = "Option::is_none")]
  quiz_category: Option<&'a CategoryFilter>,
}

#[derive(Deserialize)]
struct QuizResp {
  #[serde(default)]
  question: Option<QuestionWire>,
}

#[derive(Deserialize)]
struct QuestionWire {
  id: QuestionId,
  question: String,
  answer: String,
  #[serde(default, rename = "match")]
  match_words: Option<String>,
  #[serde(default)]
  category: Option<i64>,
  #[serde(default)]
  difficulty: Option<u8>,
}

impl QuestionWire {
  /// Prefer the API's precomputed match words; fall back to the answer.
  fn into_question(self) -> Question {
    let mut q = Question::new(self.id, self.question, self.answer);
    if let Some(words) = self.match_words.filter(|m| !m.trim().is_empty()) {
      q = q.with_match_tokens(words.split_whitespace().map(str::to_string).collect());
    }
    q.category = self.category;
    q.difficulty = self.difficulty;
    q
  }
}

#[derive(Deserialize)]
struct UserResp {
  user: UserProfile,
}

#[derive(Deserialize)]
struct CategoriesResp {
  categories: HashMap<String, String>,
}

#[derive(Serialize)]
struct LoginReq<'a> {
  username: &'a str,
  password: &'a str,
}

/// Try to extract a clean error message from a trivia API error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EObj {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detailed_message: Option<String>,
  }
  let e = serde_json::from_str::<EObj>(body).ok()?;
  e.detailed_message.or(e.message)
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::StatusCode as AxumStatus;
  use axum::routing::{get, post};
  use axum::{Json, Router};
  use serde_json::{json, Value};
  use tokio::net::TcpListener;

  use crate::domain::CategorySelection;

  /// Echoes the requested category id, or null when no filter was sent.
  /// A `quiz_category` without a positive id is a bad request.
  async fn quizzes(Json(body): Json<Value>) -> (AxumStatus, Json<Value>) {
    let previous = body["previous_questions"].as_array().cloned().unwrap_or_default();
    let category = match body.get("quiz_category") {
      None => Value::Null,
      Some(c) => match c.get("id").and_then(Value::as_i64) {
        Some(id) if id > 0 => json!(id),
        _ => return (AxumStatus::BAD_REQUEST, Json(json!({ "success": false, "message": "bad quiz_category" }))),
      },
    };
    if previous.iter().any(|v| v == 16) {
      return (AxumStatus::OK, Json(json!({ "success": true })));
    }
    (AxumStatus::OK, Json(json!({
      "success": true,
      "question": {
        "id": 16,
        "question": "What is the heaviest organ in the human body?",
        "answer": "The Liver",
        "match": "liver",
        "category": category,
        "difficulty": 4
      }
    })))
  }

  async fn results(Json(body): Json<Value>) -> (AxumStatus, Json<Value>) {
    if body["user_id"] == 1 {
      (AxumStatus::OK, Json(json!({
        "success": true,
        "user": { "id": 1, "username": "ada", "num_questions": 15, "num_correct": 9 }
      })))
    } else {
      (AxumStatus::NOT_FOUND, Json(json!({ "success": false, "error": 404, "message": "Not Found" })))
    }
  }

  async fn categories() -> Json<Value> {
    Json(json!({ "success": true, "categories": { "2": "Art", "1": "Science", "x": "Broken" } }))
  }

  async fn login(Json(body): Json<Value>) -> (AxumStatus, Json<Value>) {
    if body["password"] == "secret" {
      (AxumStatus::OK, Json(json!({ "success": true, "user": { "id": 1, "username": "ada", "num_questions": 0, "num_correct": 0 } })))
    } else {
      (AxumStatus::UNAUTHORIZED, Json(json!({ "success": false, "error": 401, "message": "Unauthorized", "detailed_message": "Invalid username or password" })))
    }
  }

  async fn start_server() -> TriviaApi {
    let app = Router::new()
      .route("/api/quizzes", post(quizzes))
      .route("/api/quizzes/results", post(results))
      .route("/api/categories", get(categories))
      .route("/api/login", post(login));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    TriviaApi::from_config(&ApiConfig { base_url: Some(format!("http://{addr}/")), timeout_secs: 5 }).unwrap()
  }

  #[tokio::test]
  async fn next_question_uses_match_words_and_signals_exhaustion() {
    let api = start_server().await;
    let req = QuestionRequest {
      previous_questions: vec![],
      category: Some(CategoryFilter { kind: "Science".into(), id: 1 }),
    };
    let q = api.next_question(&req).await.unwrap().expect("question");
    assert_eq!(q.id, 16);
    assert_eq!(q.answer, "The Liver");
    assert_eq!(q.match_tokens, vec!["liver".to_string()]);
    assert_eq!(q.category, Some(1));

    let req = QuestionRequest { previous_questions: vec![16], category: None };
    assert!(api.next_question(&req).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn unfiltered_selections_send_no_quiz_category() {
    let api = start_server().await;
    for selection in [CategorySelection::Any, CategorySelection::Named { id: 0, name: "All".into() }] {
      let req = QuestionRequest { previous_questions: vec![], category: selection.filter() };
      let q = api.next_question(&req).await.unwrap().expect("question");
      assert_eq!(q.category, None);
    }

    let req = QuestionRequest {
      previous_questions: vec![],
      category: CategorySelection::Named { id: 3, name: "Geography".into() }.filter(),
    };
    let q = api.next_question(&req).await.unwrap().expect("question");
    assert_eq!(q.category, Some(3));
  }

  #[tokio::test]
  async fn save_result_returns_authoritative_totals() {
    let api = start_server().await;
    let user = api
      .save_result(&ResultSubmission { user_id: 1, num_correct: 4, num_questions: 5 })
      .await
      .unwrap();
    assert_eq!((user.num_correct, user.num_questions), (9, 15));

    let err = ResultSink::save_result(&api, &ResultSubmission { user_id: 2, num_correct: 0, num_questions: 1 })
      .await
      .unwrap_err();
    assert!(matches!(err, QuizError::SinkUnavailable(_)));
  }

  #[tokio::test]
  async fn categories_are_sorted_and_bad_ids_skipped() {
    let api = start_server().await;
    let cats = api.categories().await.unwrap();
    assert_eq!(cats, vec![
      Category { id: 1, kind: "Science".into() },
      Category { id: 2, kind: "Art".into() },
    ]);
  }

  #[tokio::test]
  async fn login_maps_unauthorized_to_invalid_credentials() {
    let api = start_server().await;
    assert_eq!(Directory::login(&api, "ada", "secret").await.unwrap().id, 1);
    assert_eq!(Directory::login(&api, "ada", "nope").await.unwrap_err(), QuizError::InvalidCredentials);
  }

  #[tokio::test]
  async fn unreachable_api_is_source_unavailable() {
    let api = TriviaApi::from_config(&ApiConfig { base_url: Some("http://127.0.0.1:9".into()), timeout_secs: 1 }).unwrap();
    let req = QuestionRequest { previous_questions: vec![], category: None };
    let err = QuestionSource::next_question(&api, &req).await.unwrap_err();
    assert!(matches!(err, QuizError::SourceUnavailable(_)));
  }

  #[test]
  fn wire_question_without_match_falls_back_to_answer() {
    let wire: QuestionWire = serde_json::from_value(json!({
      "id": 3, "question": "Largest lake in Africa?", "answer": "Lake Victoria", "match": " "
    })).unwrap();
    assert_eq!(wire.into_question().match_tokens, vec!["lake".to_string(), "victoria".to_string()]);
  }
}
