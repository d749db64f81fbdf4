//! In-process question bank used when no trivia API is configured.
//!
//! Questions and categories come from the TOML config plus built-in seeds.
//! User totals live in memory and are lost on restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use tracing::{error, info, instrument};

use crate::answer::generate_match;
use crate::config::{QuestionCfg, QuizConfig};
use crate::domain::{Category, Question, QuestionId, QuestionRequest, ResultSubmission, UserProfile};
use crate::error::QuizError;
use crate::seeds::{seed_categories, seed_questions};
use crate::source::{Directory, QuestionSource, ResultSink};

const MIN_DIFFICULTY: u8 = 1;
const MAX_DIFFICULTY: u8 = 5;

struct LocalUser {
  password: String,
  profile: UserProfile,
}

pub struct LocalBank {
  questions: Vec<Question>,
  categories: Vec<Category>,
  users: RwLock<Vec<LocalUser>>,
}

impl LocalBank {
  pub fn new(categories: Vec<Category>, questions: Vec<Question>) -> Self {
    Self { questions, categories, users: RwLock::new(Vec::new()) }
  }

  /// Config entries first, then seeds that don't collide with configured ids.
  /// Config questions without an id are numbered after everything else.
  pub fn from_config(cfg: &QuizConfig) -> Self {
    let mut categories = BTreeMap::new();
    for c in &cfg.categories {
      categories.insert(c.id, Category { id: c.id, kind: c.kind.clone() });
    }
    for c in seed_categories() {
      categories.entry(c.id).or_insert(c);
    }

    let mut by_id = BTreeMap::<QuestionId, Question>::new();
    let mut unnumbered = Vec::new();
    for qc in &cfg.questions {
      match qc.id {
        Some(id) => {
          if let Some(q) = question_from_cfg(id, qc) {
            by_id.insert(id, q);
          }
        }
        None => unnumbered.push(qc),
      }
    }
    for qc in seed_questions() {
      let Some(id) = qc.id else { continue };
      if !by_id.contains_key(&id) {
        if let Some(q) = question_from_cfg(id, &qc) {
          by_id.insert(id, q);
        }
      }
    }
    let mut next_id = by_id.keys().next_back().copied().unwrap_or(0) + 1;
    for qc in unnumbered {
      if let Some(q) = question_from_cfg(next_id, qc) {
        by_id.insert(next_id, q);
        next_id += 1;
      }
    }

    // Inventory summary by category.
    let mut count_by_category = BTreeMap::<i64, usize>::new();
    for q in by_id.values() {
      *count_by_category.entry(q.category.unwrap_or(0)).or_default() += 1;
    }
    for (category, count) in count_by_category {
      info!(target: "quiz", category, questions = count, "Local bank inventory");
    }

    Self::new(categories.into_values().collect(), by_id.into_values().collect())
  }

  pub fn question_count(&self) -> usize { self.questions.len() }
}

fn question_from_cfg(id: QuestionId, qc: &QuestionCfg) -> Option<Question> {
  if qc.question.trim().is_empty() || qc.answer.trim().is_empty() {
    error!(target: "quiz", id, "Skipping bank question: missing question or answer.");
    return None;
  }
  if let Some(d) = qc.difficulty {
    if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&d) {
      error!(target: "quiz", id, difficulty = d, "Skipping bank question: difficulty out of range.");
      return None;
    }
  }
  let (answer, match_tokens) = generate_match(&qc.answer);
  let mut q = Question::new(id, qc.question.clone(), answer)
    .with_match_tokens(match_tokens)
    .in_category(qc.category);
  q.difficulty = qc.difficulty;
  Some(q)
}

#[async_trait]
impl QuestionSource for LocalBank {
  #[instrument(level = "debug", skip(self, request), fields(excluded = request.previous_questions.len()))]
  async fn next_question(&self, request: &QuestionRequest) -> Result<Option<Question>, QuizError> {
    let category = request.category.as_ref().map(|c| c.id).filter(|id| *id > 0);
    let candidates: Vec<&Question> = self
      .questions
      .iter()
      .filter(|q| !request.previous_questions.contains(&q.id))
      .filter(|q| category.map_or(true, |c| q.category == Some(c)))
      .collect();

    let picked = {
      let mut rng = rand::thread_rng();
      candidates.choose(&mut rng).map(|q| (*q).clone())
    };
    Ok(picked)
  }
}

#[async_trait]
impl ResultSink for LocalBank {
  #[instrument(level = "debug", skip(self))]
  async fn save_result(&self, submission: &ResultSubmission) -> Result<UserProfile, QuizError> {
    let mut users = self.users.write().await;
    let user = users
      .iter_mut()
      .find(|u| u.profile.id == submission.user_id)
      .ok_or_else(|| QuizError::SinkUnavailable(format!("unknown user {}", submission.user_id)))?;
    user.profile.num_correct += submission.num_correct as u64;
    user.profile.num_questions += submission.num_questions as u64;
    Ok(user.profile.clone())
  }
}

#[async_trait]
impl Directory for LocalBank {
  async fn categories(&self) -> Result<Vec<Category>, QuizError> {
    Ok(self.categories.clone())
  }

  #[instrument(level = "debug", skip(self, password))]
  async fn login(&self, username: &str, password: &str) -> Result<UserProfile, QuizError> {
    if username.trim().is_empty() {
      return Err(QuizError::InvalidInput("username required".into()));
    }
    if password.trim().is_empty() {
      return Err(QuizError::InvalidInput("password required".into()));
    }

    let mut users = self.users.write().await;
    if let Some(user) = users.iter().find(|u| u.profile.username == username) {
      return if user.password == password {
        Ok(user.profile.clone())
      } else {
        Err(QuizError::InvalidCredentials)
      };
    }

    let profile = UserProfile {
      id: users.len() as i64 + 1,
      username: username.to_string(),
      num_questions: 0,
      num_correct: 0,
    };
    info!(target: "quiz", user_id = profile.id, "Registered local user");
    users.push(LocalUser { password: password.to_string(), profile: profile.clone() });
    Ok(profile)
  }
}
