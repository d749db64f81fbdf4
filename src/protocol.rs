//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Category, CategorySelection, QuestionId, UserId, UserProfile};
use crate::engine::{QuizEngine, SessionPhase, SESSION_LENGTH};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    GetState,
    StartSession {
        category: CategorySelection,
    },
    SubmitGuess {
        guess: String,
    },
    Continue,
    SubmitResults,
    Restart,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    State {
        session: SessionView,
    },
    GuessResult {
        correct: bool,
        answer: String,
    },
    ResultsSaved {
        user: UserProfile,
    },
    /// Remote call failed; the session is unchanged and the action can be retried.
    Notice {
        kind: String,
        message: String,
        retryable: bool,
    },
    Error {
        message: String,
    },
}

/// Everything the display needs to render the quiz view.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub category: Option<CategorySelection>,
    pub question: Option<QuestionView>,
    pub questions_asked: usize,
    pub session_length: usize,
    pub correct_count: usize,
    /// Present only while the answer is revealed.
    pub last_guess_correct: Option<bool>,
    pub terminated: bool,
    /// A remote call is outstanding; the display should disable actions.
    pub busy: bool,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct QuestionView {
    pub id: QuestionId,
    pub prompt: String,
    /// Hidden until the guess is in.
    pub answer: Option<String>,
}

/// Snapshot of the engine for the display. Never leaks the answer early.
pub fn session_view(engine: &QuizEngine) -> SessionView {
    let s = engine.state();
    SessionView {
        phase: engine.phase(),
        category: s.category.clone(),
        question: s.current_question.as_ref().map(|q| QuestionView {
            id: q.id,
            prompt: q.prompt.clone(),
            answer: s.answer_revealed.then(|| q.answer.clone()),
        }),
        questions_asked: s.questions_asked,
        session_length: SESSION_LENGTH,
        correct_count: s.correct_count,
        last_guess_correct: s.answer_revealed.then_some(s.last_guess_correct),
        terminated: s.terminated,
        busy: engine.is_busy(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

#[derive(Deserialize)]
pub struct LoginIn {
    pub username: String,
    pub password: String,
}
#[derive(Serialize)]
pub struct LoginOut {
    pub user: UserProfile,
}

#[derive(Serialize)]
pub struct CategoriesOut {
    pub categories: Vec<Category>,
}

#[derive(Serialize)]
pub struct SettingsOut {
    pub session_length: usize,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
