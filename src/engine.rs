//! Quiz Session Engine: the per-player state machine behind the quiz view.
//!
//! Phases: `NotStarted -> AwaitingGuess <-> AnswerRevealed -> ... -> Finished`.
//! `Finished` is terminal until `restart`.
//!
//! Remote work is split in two halves so the engine never awaits anything:
//!   1. an operation validates the transition and hands out a ticket
//!      (`QuestionTicket` / `ResultsTicket`) tagged with the current epoch;
//!   2. the caller runs the remote call and feeds the outcome back through
//!      `apply_question` / `apply_results`.
//!
//! Session state only changes when a successful outcome is applied. A failed
//! call leaves it untouched. `start_session` and `restart` bump the epoch, so
//! an outcome that arrives for a superseded session is discarded.
//! Only one ticket may be outstanding at a time; other mutating operations
//! are rejected with `QuizError::Busy` until it resolves.

use std::fmt;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::answer::evaluate_guess;
use crate::domain::{CategorySelection, Question, QuestionId, QuestionRequest, ResultSubmission, UserId, UserProfile};
use crate::error::QuizError;

/// Number of questions served in one session.
pub const SESSION_LENGTH: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
  NotStarted,
  AwaitingGuess,
  AnswerRevealed,
  Finished,
}

impl fmt::Display for SessionPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      SessionPhase::NotStarted => "not_started",
      SessionPhase::AwaitingGuess => "awaiting_guess",
      SessionPhase::AnswerRevealed => "answer_revealed",
      SessionPhase::Finished => "finished",
    };
    f.write_str(name)
  }
}

/// Data of the running session. All fields at rest mean "not started".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
  pub category: Option<CategorySelection>,
  /// Served question ids in order; never contains duplicates.
  pub asked_question_ids: Vec<QuestionId>,
  pub current_question: Option<Question>,
  pub questions_asked: usize,
  pub correct_count: usize,
  pub answer_revealed: bool,
  /// Only meaningful while `answer_revealed` is set.
  pub last_guess_correct: bool,
  pub terminated: bool,
}

/// Outstanding remote call.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Pending {
  Start(CategorySelection),
  Advance,
  Save,
}

/// Permission to ask the question source for the next question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionTicket {
  pub epoch: u64,
  pub request: QuestionRequest,
}

/// Permission to send the final score to the result sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsTicket {
  pub epoch: u64,
  pub submission: ResultSubmission,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuestionApplied {
  Served(QuestionId),
  /// The source had nothing left; the session is finished.
  Exhausted,
  /// The outcome belonged to a superseded session and was dropped.
  Stale,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResultsApplied {
  Saved(UserProfile),
  Stale,
}

pub struct QuizEngine {
  user_id: UserId,
  epoch: u64,
  phase: SessionPhase,
  state: SessionState,
  pending: Option<Pending>,
  stats: watch::Sender<Option<UserProfile>>,
}

impl QuizEngine {
  /// `stats` receives the authoritative user aggregate after every saved result.
  pub fn new(user_id: UserId, stats: watch::Sender<Option<UserProfile>>) -> Self {
    Self {
      user_id,
      epoch: 0,
      phase: SessionPhase::NotStarted,
      state: SessionState::default(),
      pending: None,
      stats,
    }
  }

  pub fn epoch(&self) -> u64 { self.epoch }
  pub fn phase(&self) -> SessionPhase { self.phase }
  pub fn state(&self) -> &SessionState { &self.state }
  pub fn is_busy(&self) -> bool { self.pending.is_some() }

  /// Begin a session for `selection`. The session fields are reset only when
  /// the first question (or exhaustion) comes back.
  pub fn start_session(&mut self, selection: CategorySelection) -> Result<QuestionTicket, QuizError> {
    self.ensure_idle()?;
    if !matches!(self.phase, SessionPhase::NotStarted | SessionPhase::Finished) {
      return Err(self.illegal("start_session"));
    }

    self.epoch += 1;
    let request = QuestionRequest { previous_questions: Vec::new(), category: selection.filter() };
    info!(target: "quiz", user_id = self.user_id, epoch = self.epoch, category = %selection.label(), "Session start requested");
    self.pending = Some(Pending::Start(selection));
    Ok(QuestionTicket { epoch: self.epoch, request })
  }

  /// Ask for the next unseen question. Legal once the current answer is
  /// revealed and the session still has room.
  pub fn advance_question(&mut self) -> Result<QuestionTicket, QuizError> {
    self.ensure_idle()?;
    if self.phase != SessionPhase::AnswerRevealed
      || self.state.terminated
      || self.state.questions_asked >= SESSION_LENGTH
    {
      return Err(self.illegal("advance_question"));
    }

    let request = QuestionRequest {
      previous_questions: self.state.asked_question_ids.clone(),
      category: self.state.category.as_ref().and_then(CategorySelection::filter),
    };
    debug!(target: "quiz", epoch = self.epoch, excluded = request.previous_questions.len(), "Next question requested");
    self.pending = Some(Pending::Advance);
    Ok(QuestionTicket { epoch: self.epoch, request })
  }

  /// Apply the question source's answer to a ticket issued under `epoch`.
  ///
  /// On `Err` the pending request is cleared and the session is left exactly
  /// as it was; the caller should surface a retryable notice.
  pub fn apply_question(
    &mut self,
    epoch: u64,
    outcome: Result<Option<Question>, QuizError>,
  ) -> Result<QuestionApplied, QuizError> {
    if epoch != self.epoch {
      debug!(target: "quiz", epoch, current = self.epoch, "Dropping question for superseded session");
      return Ok(QuestionApplied::Stale);
    }
    let pending = match self.pending.take() {
      Some(p @ (Pending::Start(_) | Pending::Advance)) => p,
      other => {
        self.pending = other;
        debug!(target: "quiz", epoch, "Dropping question nobody asked for");
        return Ok(QuestionApplied::Stale);
      }
    };

    let question = match outcome {
      Err(e) => {
        warn!(target: "quiz", epoch, error = %e, "Question fetch failed; session unchanged");
        return Err(e);
      }
      Ok(None) => {
        if let Pending::Start(selection) = pending {
          self.reset_for(selection);
        }
        self.state.current_question = None;
        self.state.answer_revealed = false;
        self.state.terminated = true;
        self.phase = SessionPhase::Finished;
        info!(target: "quiz", epoch, served = self.state.questions_asked, "Question source exhausted; session finished");
        return Ok(QuestionApplied::Exhausted);
      }
      Ok(Some(q)) => q,
    };

    let repeated = match &pending {
      Pending::Start(_) => false,
      _ => self.state.asked_question_ids.contains(&question.id),
    };
    if repeated {
      warn!(target: "quiz", epoch, id = question.id, "Source served a repeated question; session unchanged");
      return Err(QuizError::RepeatedQuestion(question.id));
    }

    if let Pending::Start(selection) = pending {
      self.reset_for(selection);
    }
    let id = question.id;
    self.state.asked_question_ids.push(id);
    self.state.current_question = Some(question);
    self.state.questions_asked += 1;
    self.state.answer_revealed = false;
    self.state.last_guess_correct = false;
    // The last question of a full session still waits for its guess.
    self.state.terminated = self.state.questions_asked == SESSION_LENGTH;
    self.phase = SessionPhase::AwaitingGuess;
    info!(target: "quiz", epoch, id, number = self.state.questions_asked, "Question served");
    Ok(QuestionApplied::Served(id))
  }

  /// Judge a guess against the loaded question and reveal the answer.
  /// Empty guesses are filtered out before they get here.
  pub fn submit_guess(&mut self, raw_guess: &str) -> Result<bool, QuizError> {
    self.ensure_idle()?;
    if self.phase != SessionPhase::AwaitingGuess {
      return Err(self.illegal("submit_guess"));
    }
    let Some(question) = self.state.current_question.as_ref() else {
      return Err(self.illegal("submit_guess"));
    };

    let id = question.id;
    let correct = evaluate_guess(&question.match_tokens, raw_guess);
    if correct {
      self.state.correct_count += 1;
    }
    self.state.last_guess_correct = correct;
    self.state.answer_revealed = true;
    self.phase = SessionPhase::AnswerRevealed;
    info!(target: "quiz", epoch = self.epoch, id, correct, guess_len = raw_guess.len(), "Guess evaluated");
    Ok(correct)
  }

  /// Move past a revealed answer: finish when the session is full, otherwise
  /// hand out a ticket for the next question.
  pub fn continue_session(&mut self) -> Result<Option<QuestionTicket>, QuizError> {
    self.ensure_idle()?;
    if self.phase != SessionPhase::AnswerRevealed {
      return Err(self.illegal("continue"));
    }
    if self.state.questions_asked >= SESSION_LENGTH {
      self.state.terminated = true;
      self.phase = SessionPhase::Finished;
      info!(target: "quiz", epoch = self.epoch, correct = self.state.correct_count, "Session finished");
      return Ok(None);
    }
    self.advance_question().map(Some)
  }

  /// Ticket for saving the final score. Not de-duplicated: every call
  /// submits the score again.
  pub fn submit_results(&mut self) -> Result<ResultsTicket, QuizError> {
    self.ensure_idle()?;
    if self.phase != SessionPhase::Finished {
      return Err(self.illegal("submit_results"));
    }
    let submission = ResultSubmission {
      user_id: self.user_id,
      num_correct: self.state.correct_count,
      num_questions: self.state.questions_asked,
    };
    self.pending = Some(Pending::Save);
    Ok(ResultsTicket { epoch: self.epoch, submission })
  }

  /// Apply the result sink's answer. The returned aggregate is published
  /// verbatim on the stats channel; the engine never computes it.
  pub fn apply_results(
    &mut self,
    epoch: u64,
    outcome: Result<UserProfile, QuizError>,
  ) -> Result<ResultsApplied, QuizError> {
    if epoch != self.epoch || self.pending != Some(Pending::Save) {
      debug!(target: "quiz", epoch, current = self.epoch, "Dropping result for superseded request");
      return Ok(ResultsApplied::Stale);
    }
    self.pending = None;

    match outcome {
      Ok(profile) => {
        info!(target: "quiz", user_id = profile.id, num_correct = profile.num_correct, num_questions = profile.num_questions, "Results saved");
        self.stats.send_replace(Some(profile.clone()));
        Ok(ResultsApplied::Saved(profile))
      }
      Err(e) => {
        warn!(target: "quiz", epoch, error = %e, "Saving results failed");
        Err(e)
      }
    }
  }

  /// Drop the session, whatever its phase. Outstanding requests become stale.
  pub fn restart(&mut self) {
    self.epoch += 1;
    self.state = SessionState::default();
    self.phase = SessionPhase::NotStarted;
    self.pending = None;
    info!(target: "quiz", epoch = self.epoch, "Session restarted");
  }

  fn reset_for(&mut self, selection: CategorySelection) {
    self.state = SessionState { category: Some(selection), ..SessionState::default() };
  }

  fn ensure_idle(&self) -> Result<(), QuizError> {
    if self.pending.is_some() { Err(QuizError::Busy) } else { Ok(()) }
  }

  fn illegal(&self, action: &'static str) -> QuizError {
    QuizError::IllegalTransition { action, phase: self.phase }
  }
}
