//! Session state transitions shared by the HTTP handlers.
//!
//! The lifecycle is Idle -> Loading -> Success | Error, driven only by an
//! explicit submit and by the resolution of the generation call. Submits
//! are rejected while a generation is in flight, which keeps at most one
//! request running against the session at a time.

use tracing::{error, info, instrument, warn};

use crate::domain::{
  GeneratedResult, GenerationError, GenerationInput, HistoryItem, ProblemConfig, Status,
};
use crate::gemini::GENERATION_ERROR_MSG;
use crate::history::HistoryRepository;
use crate::state::{AppState, Session};

/// Placeholder shown while the service extracts text from an attachment.
pub const EXTRACTING_PLACEHOLDER: &str = "Đang trích xuất nội dung từ file...";

/// Inline rejection: surfaced to the caller, session state untouched.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitRejection {
  /// A generation is already running; the submit affordance is disabled.
  Busy,
  /// Input failed validation before any network call.
  Invalid(String),
}

fn validate(input: &GenerationInput, config: &ProblemConfig) -> Result<(), SubmitRejection> {
  if config.total() == 0 {
    return Err(SubmitRejection::Invalid("Vui lòng chọn ít nhất 1 câu hỏi.".into()));
  }
  match input {
    GenerationInput::Text(t) if t.trim().is_empty() => {
      Err(SubmitRejection::Invalid("Vui lòng nhập đề bài hoặc chọn file.".into()))
    }
    GenerationInput::Attachment { mime_type, .. }
      if !(mime_type.starts_with("image/") || mime_type == "application/pdf") =>
    {
      Err(SubmitRejection::Invalid("Vui lòng chọn file ảnh hoặc PDF".into()))
    }
    _ => Ok(()),
  }
}

/// Validate a submit and enter Loading. No network happens here.
#[instrument(level = "info", skip(state, input), fields(total = config.total(), attachment = input.is_attachment()))]
pub async fn begin_generation(
  state: &AppState,
  input: &GenerationInput,
  config: &ProblemConfig,
) -> Result<(), SubmitRejection> {
  validate(input, config)?;

  if let GenerationInput::Attachment { mime_type, bytes, file_name } = input {
    info!(
      target: "generation",
      file = file_name.as_deref().unwrap_or("(pasted)"),
      mime = %mime_type,
      size_kb = bytes.len() / 1024,
      "Attachment submitted"
    );
  }

  let mut session = state.session.write().await;
  if session.status == Status::Loading {
    warn!(target: "generation", "Submit rejected: a generation is already in flight");
    return Err(SubmitRejection::Busy);
  }
  session.status = Status::Loading;
  session.error = None;
  session.problems.clear();
  // Typed text shows immediately; attachment text exists only service-side.
  session.original_text = match input {
    GenerationInput::Text(t) => t.clone(),
    GenerationInput::Attachment { .. } => EXTRACTING_PLACEHOLDER.into(),
  };
  Ok(())
}

/// Run one full generation: validate, call the model, apply the outcome.
#[instrument(level = "info", skip_all, fields(total = config.total(), attachment = input.is_attachment()))]
pub async fn run_generation(
  state: &AppState,
  input: GenerationInput,
  config: ProblemConfig,
  extra: Option<String>,
) -> Result<Session, SubmitRejection> {
  begin_generation(state, &input, &config).await?;

  let outcome = match &state.gemini {
    Some(g) => {
      g.generate_similar_problems(&state.prompts, &input, &config, extra.as_deref())
        .await
    }
    None => {
      error!(target: "generation", "GEMINI_API_KEY not set; cannot generate");
      Err(GenerationError(GENERATION_ERROR_MSG.into()))
    }
  };

  match outcome {
    Ok(result) => Ok(complete_generation(state, result, &config).await),
    Err(e) => Ok(fail_generation(state, &input, e.to_string()).await),
  }
}

/// Success: publish results and persist one history entry.
pub async fn complete_generation(
  state: &AppState,
  result: GeneratedResult,
  config: &ProblemConfig,
) -> Session {
  let item = state.history.save(HistoryItem::new(
    result.original_text.clone(),
    result.problems.clone(),
    *config,
  ));
  info!(target: "generation", id = %item.id, problems = result.problems.len(), "Generation succeeded");

  let mut session = state.session.write().await;
  session.status = Status::Success;
  session.original_text = result.original_text;
  session.problems = result.problems;
  session.error = None;
  session.clone()
}

/// Failure: restore the typed input (attachments reset to empty) and expose
/// the localized message. Nothing is persisted.
pub async fn fail_generation(state: &AppState, input: &GenerationInput, message: String) -> Session {
  error!(target: "generation", error = %message, "Generation failed");

  let mut session = state.session.write().await;
  session.status = Status::Error;
  session.original_text = match input {
    GenerationInput::Text(t) => t.clone(),
    GenerationInput::Attachment { .. } => String::new(),
  };
  session.problems.clear();
  session.error = Some(message);
  session.clone()
}

/// Reload a past generation into the session (round-trip identity).
#[instrument(level = "info", skip(state), fields(%id))]
pub async fn load_history_item(state: &AppState, id: &str) -> Option<Session> {
  let item = state.history.get(id)?;
  info!(target: "history", %id, "History entry loaded into session");

  let mut session = state.session.write().await;
  session.status = Status::Success;
  session.original_text = item.original_text;
  session.problems = item.problems;
  session.error = None;
  Some(session.clone())
}

/// Read-only snapshot of the session.
pub async fn snapshot(state: &AppState) -> Session {
  state.session.read().await.clone()
}
