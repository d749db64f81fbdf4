//! Loading quiz configuration (trivia API location + optional local question bank) from TOML.
//!
//! See `QuizConfig` for the expected schema. Environment variables win over the file:
//!   TRIVIA_API_BASE_URL     : enables the remote trivia API
//!   TRIVIA_API_TIMEOUT_SECS : request timeout (default 20)

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::{CategoryId, QuestionId};

const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub categories: Vec<CategoryCfg>,
  #[serde(default)]
  pub questions: Vec<QuestionCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
  /// Root of the trivia REST API, e.g. "http://localhost:5000". Unset means "use the local bank".
  #[serde(default)]
  pub base_url: Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self { base_url: None, timeout_secs: DEFAULT_TIMEOUT_SECS }
  }
}

fn default_timeout_secs() -> u64 { DEFAULT_TIMEOUT_SECS }

/// Category entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct CategoryCfg {
  pub id: CategoryId,
  #[serde(rename = "type")]
  pub kind: String,
}

/// Question entry accepted in TOML configuration.
/// `answer` may carry an explicit match list as `answer%%%match words`.
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  #[serde(default)] pub id: Option<QuestionId>,
  pub question: String,
  pub answer: String,
  pub category: CategoryId,
  #[serde(default)] pub difficulty: Option<u8>,
}

impl QuizConfig {
  pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
    toml::from_str::<QuizConfig>(s)
  }

  /// Env values take priority over the file.
  pub fn apply_overrides(&mut self, base_url: Option<String>, timeout_secs: Option<String>) {
    if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
      self.api.base_url = Some(url.trim().to_string());
    }
    if let Some(raw) = timeout_secs {
      match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => self.api.timeout_secs = secs,
        _ => warn!(target: "trivia_quiz_backend", value = %raw, "Ignoring invalid TRIVIA_API_TIMEOUT_SECS"),
      }
    }
  }
}

/// Build the effective config: QUIZ_CONFIG_PATH (if any) plus env overrides.
pub fn load_quiz_config_from_env() -> QuizConfig {
  let mut cfg = load_quiz_config_file().unwrap_or_default();
  cfg.apply_overrides(
    std::env::var("TRIVIA_API_BASE_URL").ok(),
    std::env::var("TRIVIA_API_TIMEOUT_SECS").ok(),
  );
  cfg
}

/// Attempt to load `QuizConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
fn load_quiz_config_file() -> Option<QuizConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match QuizConfig::parse(&s) {
      Ok(cfg) => {
        info!(target: "trivia_quiz_backend", %path, categories = cfg.categories.len(), questions = cfg.questions.len(), "Loaded quiz config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "trivia_quiz_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "trivia_quiz_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
