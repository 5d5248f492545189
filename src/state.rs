//! Application state: the session, the history store, prompts, and the
//! optional Gemini client.
//!
//! This module owns:
//!   - the single session (what the UI currently displays)
//!   - the durable history repository (JSON file by default)
//!   - the prompts struct (from TOML or defaults)
//!   - the optional Gemini client

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::config::{load_app_config_from_env, Prompts};
use crate::domain::{MathProblem, Status};
use crate::gemini::Gemini;
use crate::history::{HistoryRepository, JsonFileHistory};

/// What the UI needs to render: the current status plus displayed content.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub status: Status,
    pub original_text: String,
    pub problems: Vec<MathProblem>,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<Session>>,
    pub history: Arc<dyn HistoryRepository>,
    pub gemini: Option<Gemini>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from env: load prompts, open the history file, init Gemini.
    pub fn new() -> Self {
        let prompts = load_app_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();

        let history = Arc::new(JsonFileHistory::from_env());

        let gemini = Gemini::from_env();
        if let Some(g) = &gemini {
            info!(target: "imath_backend", base_url = %g.base_url, model = %g.model, "Gemini enabled.");
        } else {
            info!(target: "imath_backend", "Gemini disabled (no GEMINI_API_KEY). Generation requests will fail.");
        }

        Self {
            session: Arc::new(RwLock::new(Session::default())),
            history,
            gemini,
            prompts,
        }
    }

    /// Test construction over an injected repository; no Gemini client.
    #[cfg(test)]
    pub fn for_tests(history: Arc<dyn HistoryRepository>) -> Self {
        Self {
            session: Arc::new(RwLock::new(Session::default())),
            history,
            gemini: None,
            prompts: Prompts::default(),
        }
    }
}
