use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::ids::new_note_id;
use crate::model::{now_ms, Note};

pub const SCHEMA_VERSION: u32 = 1;

/// The unit of persistence: a versioned container around the note
/// collection. Every note inside is fully normalized.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub version: u32,
    pub notes: Vec<Note>,
}

/// Map an already-parsed JSON value to an envelope. Accepts the current
/// `{version, notes}` shape and the legacy bare-array shape; anything
/// else is `None` so callers can tell "unusable" apart from "empty".
pub fn envelope_from_value(value: &Value) -> Option<Envelope> {
    let records = match value {
        Value::Array(records) => records,
        Value::Object(map) => match map.get("notes") {
            Some(Value::Array(records)) => records,
            _ => return None,
        },
        _ => return None,
    };
    Some(Envelope {
        version: SCHEMA_VERSION,
        notes: records.iter().map(Note::from_value).collect(),
    })
}

/// Decode the persisted value. Never fails: absent, unparsable, or
/// foreign-shaped input self-heals to a freshly seeded envelope.
pub fn decode(raw: Option<&str>) -> Envelope {
    let Some(text) = raw else {
        return seed_envelope();
    };
    match serde_json::from_str::<Value>(text) {
        Ok(value) => envelope_from_value(&value).unwrap_or_else(|| {
            warn!("persisted notes had an unrecognized shape, reseeding");
            seed_envelope()
        }),
        Err(error) => {
            warn!(%error, "persisted notes were not valid JSON, reseeding");
            seed_envelope()
        }
    }
}

/// Canonical serialized form: pretty-printed JSON, notes re-normalized
/// so in-memory drift never reaches disk.
pub fn encode(envelope: &Envelope) -> serde_json::Result<String> {
    let canonical = Envelope {
        version: SCHEMA_VERSION,
        notes: envelope
            .notes
            .iter()
            .cloned()
            .map(Note::renormalized)
            .collect(),
    };
    serde_json::to_string_pretty(&canonical)
}

pub fn seed_envelope() -> Envelope {
    let now = now_ms();
    let body = "Ocean Notes keeps everything on this machine.\n\n\
                - Create a note with `new`\n\
                - Edit titles and bodies with `edit`\n\
                - Check the **Markdown** output with `preview`\n\n\
                ```\nocean-notes list\n```";
    let welcome = Note {
        id: new_note_id(),
        title: "Welcome to Ocean Notes".to_string(),
        body: body.to_string(),
        created_at: now - 4 * 60 * 60 * 1000,
        updated_at: now - 18 * 60 * 1000,
        pinned: false,
    };
    Envelope {
        version: SCHEMA_VERSION,
        notes: vec![welcome],
    }
}
