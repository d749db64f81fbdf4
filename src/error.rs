//! Error kinds surfaced by the quiz engine and its collaborators.

use thiserror::Error;

use crate::domain::QuestionId;
use crate::engine::SessionPhase;

/// Errors emitted by the engine, the question/result backends and the directory
/// (category catalog + accounts).
///
/// Running out of questions is not an error: sources report it as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum QuizError {
  #[error("question source unavailable: {0}")]
  SourceUnavailable(String),
  #[error("result sink unavailable: {0}")]
  SinkUnavailable(String),
  #[error("trivia directory unavailable: {0}")]
  DirectoryUnavailable(String),
  #[error("invalid username or password")]
  InvalidCredentials,
  #[error("invalid input: {0}")]
  InvalidInput(String),
  #[error("{action} is not allowed while {phase}")]
  IllegalTransition { action: &'static str, phase: SessionPhase },
  #[error("a request for this session is already in flight")]
  Busy,
  #[error("question {0} was already served in this session")]
  RepeatedQuestion(QuestionId),
}

impl QuizError {
  /// Remote failures the player may retry by re-triggering the same action.
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      QuizError::SourceUnavailable(_) | QuizError::SinkUnavailable(_) | QuizError::RepeatedQuestion(_)
    )
  }

  /// Stable kind name used in client notices.
  pub fn kind(&self) -> &'static str {
    match self {
      QuizError::SourceUnavailable(_) | QuizError::RepeatedQuestion(_) => "source_unavailable",
      QuizError::SinkUnavailable(_) => "sink_unavailable",
      QuizError::DirectoryUnavailable(_) => "directory_unavailable",
      QuizError::InvalidCredentials => "invalid_credentials",
      QuizError::InvalidInput(_) => "invalid_input",
      QuizError::IllegalTransition { .. } => "illegal_transition",
      QuizError::Busy => "busy",
    }
  }
}
