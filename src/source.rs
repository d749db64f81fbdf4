//! Seams between the quiz engine and the services it consumes.
//!
//! Both the remote trivia API client and the local question bank implement
//! these traits; the rest of the crate only ever sees `Arc<dyn ...>`.

use async_trait::async_trait;

use crate::domain::{Category, Question, QuestionRequest, ResultSubmission, UserProfile};
use crate::error::QuizError;

/// Serves unseen questions, optionally filtered by category.
#[async_trait]
pub trait QuestionSource: Send + Sync {
  /// `Ok(None)` means no unseen question is left for this request.
  async fn next_question(&self, request: &QuestionRequest) -> Result<Option<Question>, QuizError>;
}

/// Persists a finished session's score against the user's running totals.
#[async_trait]
pub trait ResultSink: Send + Sync {
  /// Returns the user's updated aggregate as stored by the sink.
  async fn save_result(&self, submission: &ResultSubmission) -> Result<UserProfile, QuizError>;
}

/// Category catalog and user accounts.
#[async_trait]
pub trait Directory: Send + Sync {
  async fn categories(&self) -> Result<Vec<Category>, QuizError>;

  /// Log in, registering the username on first use.
  async fn login(&self, username: &str, password: &str) -> Result<UserProfile, QuizError>;
}
