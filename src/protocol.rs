//! Public request/response DTOs for the HTTP API (serde ready).
//! Wire names are camelCase to match the frontend. Keep this small and
//! stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{MathProblem, ProblemConfig, Status};
use crate::state::Session;

/// Generation submit payload. Exactly one of `text`/`attachment` carries the
/// sample problem; with an attachment present, `text` is ignored in favor of
/// `additionalInstructions`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateIn {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachment: Option<AttachmentIn>,
    pub config: ProblemConfig,
    #[serde(default)]
    pub additional_instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentIn {
    #[serde(default)]
    pub file_name: Option<String>,
    pub mime_type: String,
    pub data_base64: String,
}

/// Session snapshot returned by generate/session/load endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
    pub status: Status,
    pub original_text: String,
    pub problems: Vec<MathProblem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Convert the internal session to the public DTO.
pub fn to_out(s: &Session) -> SessionOut {
    SessionOut {
        status: s.status,
        original_text: s.original_text.clone(),
        problems: s.problems.clone(),
        error: s.error.clone(),
    }
}

/// Source data for both document exports.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportIn {
    pub original_text: String,
    #[serde(default)]
    pub problems: Vec<MathProblem>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_in_accepts_frontend_payload() {
        let body = r#"{
            "text": "Solve 2x+3=7",
            "config": { "level1": 2, "level2": 0, "level3": 0 },
            "additionalInstructions": "ngắn gọn"
        }"#;
        let parsed: GenerateIn = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.text.as_deref(), Some("Solve 2x+3=7"));
        assert!(parsed.attachment.is_none());
        assert_eq!(parsed.config.total(), 2);
        assert_eq!(parsed.additional_instructions.as_deref(), Some("ngắn gọn"));
    }

    #[test]
    fn attachment_payload_uses_camel_case_names() {
        let body = r#"{
            "attachment": { "fileName": "de.pdf", "mimeType": "application/pdf", "dataBase64": "aGk=" },
            "config": { "level1": 1, "level2": 0, "level3": 0 }
        }"#;
        let parsed: GenerateIn = serde_json::from_str(body).unwrap();
        let att = parsed.attachment.unwrap();
        assert_eq!(att.mime_type, "application/pdf");
        assert_eq!(att.data_base64, "aGk=");
    }

    #[test]
    fn session_out_serializes_status_snake_case() {
        let out = SessionOut {
            status: Status::Loading,
            original_text: "x".into(),
            problems: vec![],
            error: None,
        };
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains("\"status\":\"loading\""));
        assert!(json.contains("\"originalText\""));
        assert!(!json.contains("\"error\""));
    }
}
