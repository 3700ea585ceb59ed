use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::ids::new_note_id;

pub type NoteId = String;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub body: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub pinned: bool,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ImportError {
    #[error("Invalid JSON file.")]
    InvalidJson,
    #[error("JSON does not contain a valid notes array.")]
    NotNotesArray,
}

/// Fields a caller may change on an existing note. Pin state is not
/// patchable here; it only moves through `NoteStore::toggle_pinned`.
#[derive(Debug, Default, Clone)]
pub struct NotePatch {
    pub title: Option<String>,
    pub body: Option<String>,
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

impl Note {
    pub fn new(title: impl Into<String>) -> Self {
        let now = now_ms();
        Note {
            id: new_note_id(),
            title: title.into(),
            body: String::new(),
            created_at: now,
            updated_at: now,
            pinned: false,
        }
    }

    /// Total normalizer: any JSON value, however malformed, becomes a
    /// well-formed note. This is the only gate through which untrusted
    /// data (persisted or imported) enters the collection.
    pub fn from_value(raw: &Value) -> Self {
        let now = now_ms();
        let id = match raw.get("id").and_then(Value::as_str) {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => new_note_id(),
        };
        let created_at = coerce_timestamp(raw.get("createdAt"), now);
        let updated_at = coerce_timestamp(raw.get("updatedAt"), now).max(created_at);
        Note {
            id,
            title: coerce_text(raw.get("title")),
            body: coerce_text(raw.get("body")),
            created_at,
            updated_at,
            pinned: coerce_pinned(raw.get("pinned")),
        }
    }

    /// Re-assert the invariants that can drift on an already-typed note:
    /// non-empty id, `updated_at >= created_at`.
    pub fn renormalized(mut self) -> Self {
        if self.id.trim().is_empty() {
            self.id = new_note_id();
        }
        self.updated_at = self.updated_at.max(self.created_at);
        self
    }
}

fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

fn coerce_timestamp(value: Option<&Value>, fallback: i64) -> i64 {
    match value.and_then(Value::as_f64) {
        Some(ms) if ms.is_finite() => ms as i64,
        _ => fallback,
    }
}

fn coerce_pinned(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => text.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(number)) => number.as_f64() == Some(1.0),
        _ => false,
    }
}
