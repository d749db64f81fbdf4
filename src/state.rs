//! Application state: the question source, result sink and directory.
//!
//! With `TRIVIA_API_BASE_URL` (or `[api] base_url`) set, all three are the
//! remote trivia API. Otherwise the in-process bank (config + seeds) stands in.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::bank::LocalBank;
use crate::config::{load_quiz_config_from_env, QuizConfig};
use crate::source::{Directory, QuestionSource, ResultSink};
use crate::trivia_api::TriviaApi;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn QuestionSource>,
    pub sink: Arc<dyn ResultSink>,
    pub directory: Arc<dyn Directory>,
    /// "trivia_api" or "local_bank", for logs and health checks.
    pub backend: &'static str,
}

impl AppState {
    /// Build state from env: load config, then pick the remote API or the local bank.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        Self::from_config(load_quiz_config_from_env())
    }

    pub fn from_config(config: QuizConfig) -> Self {
        if let Some(api) = TriviaApi::from_config(&config.api) {
            info!(target: "trivia_quiz_backend", base_url = %api.base_url, timeout_secs = config.api.timeout_secs, "Trivia API enabled.");
            let api = Arc::new(api);
            return Self {
                source: api.clone(),
                sink: api.clone(),
                directory: api,
                backend: "trivia_api",
            };
        }

        if config.api.base_url.is_some() {
            warn!(target: "trivia_quiz_backend", "Trivia API configured but client could not be built; using local bank.");
        } else {
            info!(target: "trivia_quiz_backend", "Trivia API disabled (no TRIVIA_API_BASE_URL). Using local bank.");
        }
        let bank = Arc::new(LocalBank::from_config(&config));
        info!(target: "trivia_quiz_backend", questions = bank.question_count(), "Local bank ready.");
        Self::with_local_bank(bank)
    }

    pub fn with_local_bank(bank: Arc<LocalBank>) -> Self {
        Self {
            source: bank.clone(),
            sink: bank.clone(),
            directory: bank,
            backend: "local_bank",
        }
    }
}
