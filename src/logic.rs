//! Per-connection quiz play: turns client actions into engine transitions and
//! runs the engine's remote calls as spawned tasks.
//!
//! Only the connection task touches the engine. A spawned call reports back
//! through the completion channel with the epoch it was issued under, and
//! the engine decides whether the outcome still applies.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, Instrument};

use crate::domain::{Question, UserId, UserProfile};
use crate::engine::{QuestionApplied, QuestionTicket, QuizEngine, ResultsApplied, ResultsTicket};
use crate::error::QuizError;
use crate::protocol::{session_view, ClientWsMessage, ServerWsMessage};
use crate::source::{QuestionSource, ResultSink};

/// Outcome of a remote call, tagged with the epoch of the ticket.
#[derive(Debug)]
pub enum Completion {
  Question { epoch: u64, outcome: Result<Option<Question>, QuizError> },
  Results { epoch: u64, outcome: Result<UserProfile, QuizError> },
}

pub struct PlaySession {
  engine: QuizEngine,
  source: Arc<dyn QuestionSource>,
  sink: Arc<dyn ResultSink>,
  completions: mpsc::UnboundedSender<Completion>,
}

impl PlaySession {
  /// Returns the session plus the receivers the connection loop must poll:
  /// remote completions, and refreshed user totals after a save.
  pub fn new(
    user_id: UserId,
    source: Arc<dyn QuestionSource>,
    sink: Arc<dyn ResultSink>,
  ) -> (Self, mpsc::UnboundedReceiver<Completion>, watch::Receiver<Option<UserProfile>>) {
    let (completions, completion_rx) = mpsc::unbounded_channel();
    let (stats_tx, stats_rx) = watch::channel(None);
    let session = Self { engine: QuizEngine::new(user_id, stats_tx), source, sink, completions };
    (session, completion_rx, stats_rx)
  }

  pub fn engine(&self) -> &QuizEngine { &self.engine }

  pub fn state_message(&self) -> ServerWsMessage {
    ServerWsMessage::State { session: session_view(&self.engine) }
  }

  #[instrument(level = "debug", skip(self, msg))]
  pub fn handle_client(&mut self, msg: ClientWsMessage) -> Vec<ServerWsMessage> {
    let result = match msg {
      ClientWsMessage::Ping => return vec![ServerWsMessage::Pong],
      ClientWsMessage::GetState => Ok(vec![]),

      ClientWsMessage::StartSession { category } => {
        self.engine.start_session(category).map(|ticket| {
          self.spawn_fetch(ticket);
          vec![]
        })
      }

      ClientWsMessage::SubmitGuess { guess } => {
        if guess.is_empty() {
          return vec![ServerWsMessage::Error { message: "Guess must not be empty.".into() }];
        }
        self.engine.submit_guess(&guess).map(|correct| {
          let answer = self
            .engine
            .state()
            .current_question
            .as_ref()
            .map(|q| q.answer.clone())
            .unwrap_or_default();
          vec![ServerWsMessage::GuessResult { correct, answer }]
        })
      }

      ClientWsMessage::Continue => self.engine.continue_session().map(|ticket| {
        if let Some(ticket) = ticket {
          self.spawn_fetch(ticket);
        }
        vec![]
      }),

      ClientWsMessage::SubmitResults => self.engine.submit_results().map(|ticket| {
        self.spawn_save(ticket);
        vec![]
      }),

      ClientWsMessage::Restart => {
        self.engine.restart();
        Ok(vec![])
      }
    };

    match result {
      Ok(mut out) => {
        out.push(self.state_message());
        out
      }
      Err(e) => vec![ServerWsMessage::Error { message: e.to_string() }],
    }
  }

  #[instrument(level = "debug", skip(self, completion))]
  pub fn handle_completion(&mut self, completion: Completion) -> Vec<ServerWsMessage> {
    let applied = match completion {
      Completion::Question { epoch, outcome } => {
        self.engine.apply_question(epoch, outcome).map(|a| a != QuestionApplied::Stale)
      }
      Completion::Results { epoch, outcome } => {
        self.engine.apply_results(epoch, outcome).map(|a| a != ResultsApplied::Stale)
      }
    };

    match applied {
      Ok(false) => vec![],
      Ok(true) => vec![self.state_message()],
      Err(e) => vec![
        ServerWsMessage::Notice { kind: e.kind().into(), message: e.to_string(), retryable: e.is_retryable() },
        self.state_message(),
      ],
    }
  }

  fn spawn_fetch(&self, ticket: QuestionTicket) {
    let source = self.source.clone();
    let tx = self.completions.clone();
    debug!(target: "quiz", epoch = ticket.epoch, "Fetching next question");
    tokio::spawn(
      async move {
        let outcome = source.next_question(&ticket.request).await;
        // Receiver gone means the connection closed; nothing left to update.
        let _ = tx.send(Completion::Question { epoch: ticket.epoch, outcome });
      }
      .in_current_span(),
    );
  }

  fn spawn_save(&self, ticket: ResultsTicket) {
    let sink = self.sink.clone();
    let tx = self.completions.clone();
    info!(target: "quiz", epoch = ticket.epoch, num_correct = ticket.submission.num_correct, num_questions = ticket.submission.num_questions, "Saving results");
    tokio::spawn(
      async move {
        let outcome = sink.save_result(&ticket.submission).await;
        let _ = tx.send(Completion::Results { epoch: ticket.epoch, outcome });
      }
      .in_current_span(),
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bank::LocalBank;
  use crate::domain::{Category, CategorySelection, QuestionRequest};
  use crate::engine::{SessionPhase, SESSION_LENGTH};
  use crate::protocol::SessionView;
  use crate::source::Directory;
  use async_trait::async_trait;

  struct DownSource;

  #[async_trait]
  impl QuestionSource for DownSource {
    async fn next_question(&self, _request: &QuestionRequest) -> Result<Option<Question>, QuizError> {
      Err(QuizError::SourceUnavailable("connection refused".into()))
    }
  }

  fn bank(n: i64) -> Arc<LocalBank> {
    let questions = (1..=n).map(|id| Question::new(id, format!("Q{id}?"), format!("answer{id}")).in_category(1)).collect();
    Arc::new(LocalBank::new(vec![Category { id: 1, kind: "Science".into() }], questions))
  }

  fn view(msgs: &[ServerWsMessage]) -> SessionView {
    msgs
      .iter()
      .rev()
      .find_map(|m| match m {
        ServerWsMessage::State { session } => Some(session.clone()),
        _ => None,
      })
      .expect("state message")
  }

  async fn settle(play: &mut PlaySession, rx: &mut mpsc::UnboundedReceiver<Completion>) -> Vec<ServerWsMessage> {
    let completion = rx.recv().await.expect("completion");
    play.handle_completion(completion)
  }

  #[tokio::test]
  async fn plays_a_full_session_and_saves() {
    let bank = bank(8);
    let user = bank.login("ada", "pw").await.unwrap();
    let (mut play, mut rx, mut stats) = PlaySession::new(user.id, bank.clone(), bank.clone());

    let out = play.handle_client(ClientWsMessage::StartSession { category: CategorySelection::Any });
    assert!(view(&out).busy);
    let mut out = settle(&mut play, &mut rx).await;

    for n in 1..=SESSION_LENGTH {
      let v = view(&out);
      assert_eq!(v.phase, SessionPhase::AwaitingGuess);
      assert_eq!(v.questions_asked, n);
      let id = v.question.expect("question").id;
      let guess = if n % 2 == 1 { format!("It's answer{id}!") } else { "pass".to_string() };
      let replies = play.handle_client(ClientWsMessage::SubmitGuess { guess });
      assert!(matches!(replies[0], ServerWsMessage::GuessResult { .. }));
      out = play.handle_client(ClientWsMessage::Continue);
      if n < SESSION_LENGTH {
        out = settle(&mut play, &mut rx).await;
      }
    }

    let v = view(&out);
    assert_eq!(v.phase, SessionPhase::Finished);
    assert_eq!((v.correct_count, v.questions_asked), (3, 5));

    play.handle_client(ClientWsMessage::SubmitResults);
    settle(&mut play, &mut rx).await;
    stats.changed().await.unwrap();
    let saved = stats.borrow().clone().expect("stats");
    assert_eq!((saved.num_correct, saved.num_questions), (3, 5));
  }

  #[tokio::test]
  async fn small_category_ends_early() {
    let bank = bank(2);
    let (mut play, mut rx, _stats) = PlaySession::new(1, bank.clone(), bank);
    play.handle_client(ClientWsMessage::StartSession { category: CategorySelection::Named { id: 1, name: "Science".into() } });
    settle(&mut play, &mut rx).await;
    for _ in 0..2 {
      play.handle_client(ClientWsMessage::SubmitGuess { guess: "?".into() });
      play.handle_client(ClientWsMessage::Continue);
      settle(&mut play, &mut rx).await;
    }
    let v = session_view(play.engine());
    assert_eq!(v.phase, SessionPhase::Finished);
    assert_eq!(v.questions_asked, 2);
    assert!(v.terminated);
  }

  #[tokio::test]
  async fn source_failure_is_a_retryable_notice() {
    let bank = bank(2);
    let (mut play, mut rx, _stats) = PlaySession::new(1, Arc::new(DownSource), bank);
    play.handle_client(ClientWsMessage::StartSession { category: CategorySelection::Any });
    let out = settle(&mut play, &mut rx).await;
    assert!(matches!(
      &out[0],
      ServerWsMessage::Notice { kind, retryable: true, .. } if kind == "source_unavailable"
    ));
    let v = view(&out);
    assert_eq!(v.phase, SessionPhase::NotStarted);
    assert!(!v.busy);
  }

  #[tokio::test]
  async fn restart_discards_in_flight_question() {
    let bank = bank(3);
    let (mut play, mut rx, _stats) = PlaySession::new(1, bank.clone(), bank);
    play.handle_client(ClientWsMessage::StartSession { category: CategorySelection::Any });
    play.handle_client(ClientWsMessage::Restart);
    let out = settle(&mut play, &mut rx).await;
    assert!(out.is_empty());
    assert_eq!(session_view(play.engine()).phase, SessionPhase::NotStarted);
  }

  #[tokio::test]
  async fn restart_discards_in_flight_save() {
    let bank = bank(1);
    let user = bank.login("ada", "pw").await.unwrap();
    let (mut play, mut rx, stats) = PlaySession::new(user.id, bank.clone(), bank);
    play.handle_client(ClientWsMessage::StartSession { category: CategorySelection::Any });
    settle(&mut play, &mut rx).await;
    play.handle_client(ClientWsMessage::SubmitGuess { guess: "answer1".into() });
    play.handle_client(ClientWsMessage::Continue);
    settle(&mut play, &mut rx).await;
    assert_eq!(session_view(play.engine()).phase, SessionPhase::Finished);

    play.handle_client(ClientWsMessage::SubmitResults);
    let out = play.handle_client(ClientWsMessage::Restart);
    assert_eq!(view(&out).phase, SessionPhase::NotStarted);
    let out = settle(&mut play, &mut rx).await;
    assert!(out.is_empty());
    assert!(stats.borrow().is_none());
    assert!(!stats.has_changed().unwrap());
  }

  #[tokio::test]
  async fn boundary_rejects_empty_and_illegal_actions() {
    let bank = bank(3);
    let (mut play, _rx, _stats) = PlaySession::new(1, bank.clone(), bank);
    let out = play.handle_client(ClientWsMessage::SubmitGuess { guess: String::new() });
    assert!(matches!(&out[..], [ServerWsMessage::Error { .. }]));
    let out = play.handle_client(ClientWsMessage::Continue);
    assert!(matches!(&out[..], [ServerWsMessage::Error { .. }]));
    let out = play.handle_client(ClientWsMessage::Ping);
    assert!(matches!(&out[..], [ServerWsMessage::Pong]));
  }
}
