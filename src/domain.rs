//! Domain models used by the backend: difficulty configuration, generated
//! problems, history entries, and the session status.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// How many problems to generate per difficulty tier.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemConfig {
    /// Nhận biết / cơ bản (swap numbers, keep the structure).
    #[serde(default)]
    pub level1: u32,
    /// Thông hiểu / vận dụng (small context changes).
    #[serde(default)]
    pub level2: u32,
    /// Vận dụng cao / nâng cao (extended, harder variants).
    #[serde(default)]
    pub level3: u32,
}

impl ProblemConfig {
    /// Total requested questions. Generation requires this to be >= 1.
    pub fn total(&self) -> u32 {
        self.level1 + self.level2 + self.level3
    }
}

/// One generated problem. Question and solution are opaque formatted strings
/// (they may embed `${ }$` LaTeX markup) and pass through the backend untouched.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MathProblem {
    pub question: String,
    pub solution: String,
}

/// The atomic outcome of one generation call.
#[derive(Clone, Debug)]
pub struct GeneratedResult {
    pub original_text: String,
    pub problems: Vec<MathProblem>,
}

/// What the user submitted: typed text, or a binary attachment (image/PDF).
#[derive(Clone, Debug)]
pub enum GenerationInput {
    Text(String),
    Attachment {
        mime_type: String,
        bytes: Vec<u8>,
        file_name: Option<String>,
    },
}

impl GenerationInput {
    pub fn is_attachment(&self) -> bool {
        matches!(self, GenerationInput::Attachment { .. })
    }
}

/// Opaque generation failure carrying only the user-facing message.
/// Concrete causes are logged where they happen, never exposed.
#[derive(Clone, Debug)]
pub struct GenerationError(pub String);

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One persisted past generation. Created on success, deleted individually,
/// never mutated in place. Wire and storage format share the same shape.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryItem {
    pub id: String,
    /// Epoch milliseconds at save time.
    pub timestamp: u64,
    #[serde(rename = "originalText")]
    pub original_text: String,
    pub problems: Vec<MathProblem>,
    pub config: ProblemConfig,
}

impl HistoryItem {
    /// Build a fresh entry with a time-derived id. The store bumps the id
    /// if two saves land on the same millisecond.
    pub fn new(original_text: String, problems: Vec<MathProblem>, config: ProblemConfig) -> Self {
        let now = now_millis();
        Self {
            id: now.to_string(),
            timestamp: now,
            original_text,
            problems,
            config,
        }
    }
}

/// Session lifecycle: Idle -> Loading -> Success | Error.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_total_sums_all_tiers() {
        let cfg = ProblemConfig { level1: 4, level2: 4, level3: 2 };
        assert_eq!(cfg.total(), 10);
        assert_eq!(ProblemConfig::default().total(), 0);
    }

    #[test]
    fn history_item_id_matches_timestamp() {
        let item = HistoryItem::new("x".into(), vec![], ProblemConfig::default());
        assert_eq!(item.id, item.timestamp.to_string());
    }

    #[test]
    fn history_item_storage_shape_is_stable() {
        let item = HistoryItem {
            id: "1".into(),
            timestamp: 1,
            original_text: "Giải ${2x+3=7}$".into(),
            problems: vec![MathProblem { question: "q".into(), solution: "s".into() }],
            config: ProblemConfig { level1: 2, level2: 0, level3: 0 },
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"originalText\""));
        let back: HistoryItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }
}
