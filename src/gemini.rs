//! Minimal Gemini client for our single use-case.
//!
//! We only call `generateContent` and always request a strict JSON reply
//! constrained by a response schema. Calls are instrumented and log model
//! names, latencies, token usage, and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::{GeneratedResult, GenerationError, GenerationInput, MathProblem, ProblemConfig};
use crate::util::{fill_template, trunc_for_log};

/// Fixed user-facing failure message; the UI shows this verbatim.
pub const GENERATION_ERROR_MSG: &str =
  "Đã có lỗi xảy ra khi xử lý yêu cầu. Vui lòng kiểm tra lại file hoặc API Key.";

/// Shown as the original text when the service could not read an attachment back.
pub const EXTRACTION_FAILED_MSG: &str = "Không thể trích xuất đề bài gốc";

#[derive(Clone)]
pub struct Gemini {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl Gemini {
  /// Construct the client if we find GEMINI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("GEMINI_API_KEY").ok()?;
    let base_url = std::env::var("GEMINI_BASE_URL")
      .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into());
    let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into());

    // No total timeout: a submitted generation runs to completion or
    // transport failure; the application enforces no deadline of its own.
    let client = reqwest::Client::builder().build().ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// Low-level generateContent call. Returns the raw text of the first
  /// candidate, which the schema constrains to be a JSON document.
  #[instrument(level = "info", skip(self, system, parts), fields(model = %self.model, part_count = parts.len()))]
  async fn generate_content(&self, system: &str, parts: Vec<Part>) -> Result<String, String> {
    let url = format!(
      "{}/models/{}:generateContent?key={}",
      self.base_url, self.model, self.api_key
    );
    let req = GenerateContentRequest {
      system_instruction: Content { role: None, parts: vec![Part::text(system)] },
      contents: vec![Content { role: Some("user".into()), parts }],
      generation_config: GenerationConfig {
        response_mime_type: "application/json".into(),
        response_schema: response_schema(),
      },
    };

    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "imath-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&req)
      .send()
      .await
      .map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_gemini_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      return Err(format!("Gemini HTTP {}: {}", status, msg));
    }

    let body: GenerateContentResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage_metadata {
      info!(prompt_tokens = ?usage.prompt_token_count, candidate_tokens = ?usage.candidates_token_count, total_tokens = ?usage.total_token_count, "Gemini usage");
    }
    let text = body
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
      .unwrap_or_default();

    if text.trim().is_empty() {
      return Err("Không nhận được phản hồi từ AI.".into());
    }
    Ok(text)
  }

  /// Build the request for `input` + `config` and return the parsed problem
  /// set. All-or-nothing: any transport or shape failure maps to one opaque
  /// `GenerationError`; no partial results, no retries, no streaming.
  #[instrument(
    level = "info",
    skip(self, prompts, input, extra),
    fields(model = %self.model, total = config.total(), attachment = input.is_attachment())
  )]
  pub async fn generate_similar_problems(
    &self,
    prompts: &Prompts,
    input: &GenerationInput,
    config: &ProblemConfig,
    extra: Option<&str>,
  ) -> Result<GeneratedResult, GenerationError> {
    let total = config.total().to_string();
    let system = fill_template(&prompts.system_instruction, &[("total_questions", &total)]);
    let request_details = fill_template(
      &prompts.request_details_template,
      &[
        ("total_questions", &total),
        ("level1", &config.level1.to_string()),
        ("level2", &config.level2.to_string()),
        ("level3", &config.level3.to_string()),
      ],
    );
    let extra_note = match extra {
      Some(s) if !s.trim().is_empty() => fill_template(&prompts.extra_note_template, &[("extra", s)]),
      _ => String::new(),
    };

    let parts = match input {
      GenerationInput::Attachment { mime_type, bytes, .. } => vec![
        Part::inline_data(mime_type, BASE64.encode(bytes)),
        Part::text(&fill_template(
          &prompts.attachment_user_template,
          &[
            ("total_questions", &total),
            ("request_details", &request_details),
            ("extra_note", &extra_note),
          ],
        )),
      ],
      GenerationInput::Text(text) => vec![Part::text(&fill_template(
        &prompts.text_user_template,
        &[
          ("input", text),
          ("request_details", &request_details),
          ("extra_note", &extra_note),
        ],
      ))],
    };

    let start = std::time::Instant::now();
    let result = self.generate_content(&system, parts).await;
    let elapsed = start.elapsed();

    let raw = match result {
      Ok(t) => {
        info!(?elapsed, reply_len = t.len(), "Model response received");
        t
      }
      Err(e) => {
        error!(?elapsed, error = %e, "Model call failed during problem generation");
        return Err(GenerationError(GENERATION_ERROR_MSG.into()));
      }
    };

    match parse_generated(&raw, input) {
      Ok(r) => Ok(r),
      Err(e) => {
        error!(error = %e, reply = %trunc_for_log(&raw, 300), "Model reply failed validation");
        Err(GenerationError(GENERATION_ERROR_MSG.into()))
      }
    }
  }
}

/// Parse the model's JSON reply. `problems` is mandatory; a missing or empty
/// `original_text` falls back to the typed input, or to a fixed placeholder
/// for attachments (extraction happened on the service side and failed).
fn parse_generated(raw: &str, input: &GenerationInput) -> Result<GeneratedResult, String> {
  #[derive(Deserialize)]
  struct Reply {
    #[serde(default)]
    original_text: Option<String>,
    problems: Vec<MathProblem>,
  }

  let reply: Reply = serde_json::from_str(raw).map_err(|e| format!("JSON parse error: {}", e))?;
  let original_text = match reply.original_text {
    Some(t) if !t.is_empty() => t,
    _ => match input {
      GenerationInput::Text(t) => t.clone(),
      GenerationInput::Attachment { .. } => EXTRACTION_FAILED_MSG.into(),
    },
  };
  Ok(GeneratedResult { original_text, problems: reply.problems })
}

/// The JSON schema the model must answer with.
fn response_schema() -> serde_json::Value {
  serde_json::json!({
    "type": "OBJECT",
    "properties": {
      "original_text": {
        "type": "STRING",
        "description": "Nội dung đề bài gốc đã được định dạng chuẩn LaTeX ${ }$"
      },
      "problems": {
        "type": "ARRAY",
        "items": {
          "type": "OBJECT",
          "properties": {
            "question": {
              "type": "STRING",
              "description": "Nội dung đề bài toán mới (chuẩn LaTeX ${ })"
            },
            "solution": {
              "type": "STRING",
              "description": "Đáp án hoặc lời giải ngắn gọn (chuẩn LaTeX ${ })"
            }
          },
          "required": ["question", "solution"]
        }
      }
    },
    "required": ["problems"]
  })
}

// --- generateContent DTOs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
  system_instruction: Content,
  contents: Vec<Content>,
  generation_config: GenerationConfig,
}
#[derive(Serialize)]
struct Content {
  #[serde(skip_serializing_if = "Option::is_none")]
  role: Option<String>,
  parts: Vec<Part>,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
  #[serde(skip_serializing_if = "Option::is_none")]
  text: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  inline_data: Option<InlineData>,
}
impl Part {
  fn text(s: &str) -> Self {
    Part { text: Some(s.to_string()), inline_data: None }
  }
  fn inline_data(mime: &str, data: String) -> Self {
    Part { text: None, inline_data: Some(InlineData { mime_type: mime.to_string(), data }) }
  }
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
  mime_type: String,
  data: String,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  response_mime_type: String,
  response_schema: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
  #[serde(default)]
  usage_metadata: Option<UsageMetadata>,
}
#[derive(Deserialize)]
struct Candidate {
  content: Option<CandidateContent>,
}
#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}
#[derive(Deserialize)]
struct CandidatePart {
  text: Option<String>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)]
  prompt_token_count: Option<u32>,
  #[serde(default)]
  candidates_token_count: Option<u32>,
  #[serde(default)]
  total_token_count: Option<u32>,
}

/// Try to extract a clean error message from a Gemini error body.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn text_input(s: &str) -> GenerationInput {
    GenerationInput::Text(s.to_string())
  }

  fn attachment_input() -> GenerationInput {
    GenerationInput::Attachment {
      mime_type: "image/png".into(),
      bytes: vec![1, 2, 3],
      file_name: Some("de.png".into()),
    }
  }

  #[test]
  fn parse_keeps_service_original_text() {
    let raw = r#"{"original_text":"Giải ${3x=9}$","problems":[{"question":"q","solution":"s"}]}"#;
    let out = parse_generated(raw, &text_input("input")).unwrap();
    assert_eq!(out.original_text, "Giải ${3x=9}$");
    assert_eq!(out.problems.len(), 1);
  }

  #[test]
  fn parse_falls_back_to_typed_input_when_original_text_missing() {
    let raw = r#"{"problems":[{"question":"Solve 3x+5=11","solution":"x=2"},{"question":"Solve 5x-2=8","solution":"x=2"}]}"#;
    let out = parse_generated(raw, &text_input("Solve 2x+3=7")).unwrap();
    assert_eq!(out.original_text, "Solve 2x+3=7");
    assert_eq!(out.problems.len(), 2);
  }

  #[test]
  fn parse_treats_empty_original_text_as_missing() {
    let raw = r#"{"original_text":"","problems":[]}"#;
    let out = parse_generated(raw, &text_input("đề gốc")).unwrap();
    assert_eq!(out.original_text, "đề gốc");
  }

  #[test]
  fn parse_uses_placeholder_for_attachments() {
    let raw = r#"{"problems":[{"question":"q","solution":"s"}]}"#;
    let out = parse_generated(raw, &attachment_input()).unwrap();
    assert_eq!(out.original_text, EXTRACTION_FAILED_MSG);
  }

  #[test]
  fn parse_rejects_missing_problems_field() {
    assert!(parse_generated(r#"{"original_text":"x"}"#, &text_input("x")).is_err());
  }

  #[test]
  fn parse_rejects_non_json_reply() {
    assert!(parse_generated("not json at all", &text_input("x")).is_err());
  }

  #[test]
  fn request_serializes_with_camel_case_wire_names() {
    let req = GenerateContentRequest {
      system_instruction: Content { role: None, parts: vec![Part::text("sys")] },
      contents: vec![Content {
        role: Some("user".into()),
        parts: vec![Part::inline_data("image/png", "aGk=".into()), Part::text("u")],
      }],
      generation_config: GenerationConfig {
        response_mime_type: "application/json".into(),
        response_schema: response_schema(),
      },
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(json.contains("\"systemInstruction\""));
    assert!(json.contains("\"generationConfig\""));
    assert!(json.contains("\"responseMimeType\""));
    assert!(json.contains("\"inlineData\""));
    assert!(json.contains("\"mimeType\":\"image/png\""));
    // text parts must not serialize an inlineData key at all
    assert!(!json.contains("\"inlineData\":null"));
  }
}
