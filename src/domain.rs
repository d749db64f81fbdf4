//! Domain models shared by the engine, the remote client and the local bank:
//! questions, categories, category selections and user score aggregates.

use serde::{Deserialize, Serialize};

use crate::answer::match_tokens_from_answer;

pub type QuestionId = i64;
pub type CategoryId = i64;
pub type UserId = i64;

/// One trivia question as served by a question source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Question {
  pub id: QuestionId,
  pub prompt: String,
  pub answer: String,
  /// Lower-cased tokens that must all appear in a guess for it to count.
  pub match_tokens: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<CategoryId>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub difficulty: Option<u8>,
}

impl Question {
  /// Build a question whose match tokens are derived from the answer text.
  pub fn new(id: QuestionId, prompt: impl Into<String>, answer: impl Into<String>) -> Self {
    let answer = answer.into();
    let match_tokens = match_tokens_from_answer(&answer);
    Self { id, prompt: prompt.into(), answer, match_tokens, category: None, difficulty: None }
  }

  pub fn with_match_tokens(mut self, tokens: Vec<String>) -> Self {
    self.match_tokens = tokens.into_iter().map(|t| t.to_lowercase()).collect();
    self
  }

  pub fn in_category(mut self, category: CategoryId) -> Self {
    self.category = Some(category);
    self
  }
}

/// A quiz category from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub id: CategoryId,
  #[serde(rename = "type")]
  pub kind: String,
}

/// What the player picked before the session started.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CategorySelection {
  /// No filter: questions from every category.
  Any,
  Named {
    id: CategoryId,
    #[serde(default)]
    name: String,
  },
}

impl CategorySelection {
  /// Filter sent to the question source. Id 0 means "no category" upstream,
  /// so only positive ids produce a filter.
  pub fn filter(&self) -> Option<CategoryFilter> {
    match self {
      CategorySelection::Any => None,
      CategorySelection::Named { id, name } if *id > 0 => Some(CategoryFilter { kind: name.clone(), id: *id }),
      CategorySelection::Named { .. } => None,
    }
  }

  /// Label used by the display for the category icon.
  pub fn label(&self) -> &str {
    match self {
      CategorySelection::Any => "any",
      CategorySelection::Named { name, .. } => name,
    }
  }
}

/// Category filter as the trivia API expects it: `{type, id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFilter {
  #[serde(rename = "type")]
  pub kind: String,
  pub id: CategoryId,
}

/// Request for the next unseen question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionRequest {
  pub previous_questions: Vec<QuestionId>,
  pub category: Option<CategoryFilter>,
}

/// Final score of one session, sent to the result sink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResultSubmission {
  pub user_id: UserId,
  pub num_correct: usize,
  pub num_questions: usize,
}

/// A user's running totals, as returned by the result sink and by login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub id: UserId,
  pub username: String,
  #[serde(default)]
  pub num_questions: u64,
  #[serde(default)]
  pub num_correct: u64,
}
