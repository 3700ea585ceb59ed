use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::codec::{self, Envelope};
use crate::model::{now_ms, ImportError, Note, NotePatch};
use crate::storage::{slugify, KeyValue};

pub const STORAGE_KEY: &str = "ocean-notes:v1";
pub const APP_NAME: &str = "Ocean Notes";

/// Owns the canonical note collection. Every mutation renormalizes the
/// touched record and writes the whole envelope back to storage before
/// returning; storage failures are logged and the in-memory state kept.
pub struct NoteStore<S: KeyValue> {
    storage: S,
    envelope: Envelope,
}

impl<S: KeyValue> NoteStore<S> {
    /// Decode whatever is currently persisted (self-healing on corrupt
    /// or foreign state) and write the healed envelope back.
    pub fn load(storage: S) -> Self {
        let raw = storage.get(STORAGE_KEY);
        let envelope = codec::decode(raw.as_deref());
        let mut store = NoteStore { storage, envelope };
        store.persist();
        store
    }

    pub fn notes(&self) -> &[Note] {
        &self.envelope.notes
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Note> {
        self.envelope.notes.iter().find(|note| note.id == id)
    }

    pub fn create(&mut self) -> Note {
        let note = Note::new("Untitled note");
        self.envelope.notes.insert(0, note.clone());
        self.persist();
        note
    }

    /// Merge `patch` into the note, stamp `updated_at`. The id and
    /// `created_at` survive any patch. No-op on an unknown id.
    pub fn update(&mut self, id: &str, patch: &NotePatch) -> bool {
        let Some(note) = self.envelope.notes.iter_mut().find(|note| note.id == id) else {
            return false;
        };
        if let Some(title) = &patch.title {
            note.title = title.clone();
        }
        if let Some(body) = &patch.body {
            note.body = body.clone();
        }
        note.updated_at = now_ms();
        *note = note.clone().renormalized();
        self.persist();
        true
    }

    /// Flip pin state without touching `updated_at`: pinning must not
    /// perturb recency ordering or "last edited" semantics.
    pub fn toggle_pinned(&mut self, id: &str) -> bool {
        let Some(note) = self.envelope.notes.iter_mut().find(|note| note.id == id) else {
            return false;
        };
        note.pinned = !note.pinned;
        *note = note.clone().renormalized();
        self.persist();
        true
    }

    pub fn duplicate(&mut self, id: &str) -> Option<Note> {
        let source = self.get_by_id(id)?.clone();
        let trimmed = source.title.trim();
        let base = if trimmed.is_empty() {
            "Untitled note"
        } else {
            trimmed
        };
        let mut copy = Note::new(format!("Copy of {base}"));
        copy.body = source.body;
        self.envelope.notes.insert(0, copy.clone());
        self.persist();
        Some(copy)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.envelope.notes.len();
        self.envelope.notes.retain(|note| note.id != id);
        if self.envelope.notes.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Pinned notes first, then most recently updated first. The sort is
    /// stable, so ties keep the underlying collection order.
    pub fn sorted_view(&self) -> Vec<Note> {
        let mut notes = self.envelope.notes.clone();
        notes.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then(b.updated_at.cmp(&a.updated_at))
        });
        notes
    }

    /// Case-insensitive substring match over title or body. A blank
    /// query is the full sorted view.
    pub fn search(&self, query: &str) -> Vec<Note> {
        let needle = query.trim().to_lowercase();
        let sorted = self.sorted_view();
        if needle.is_empty() {
            return sorted;
        }
        sorted
            .into_iter()
            .filter(|note| {
                note.title.to_lowercase().contains(&needle)
                    || note.body.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn export_to_text(&self) -> serde_json::Result<String> {
        codec::encode(&self.envelope)
    }

    /// Replace the whole collection with the parsed import, deduplicated
    /// by id: the later record in the input wins, the earlier one keeps
    /// its position.
    pub fn import_from_text(&mut self, text: &str) -> Result<usize, ImportError> {
        let value: Value = serde_json::from_str(text).map_err(|error| {
            warn!(%error, "import rejected: unparsable JSON");
            ImportError::InvalidJson
        })?;
        let envelope = codec::envelope_from_value(&value).ok_or_else(|| {
            warn!("import rejected: no usable notes array");
            ImportError::NotNotesArray
        })?;
        let mut deduped: Vec<Note> = Vec::with_capacity(envelope.notes.len());
        let mut slots: HashMap<String, usize> = HashMap::new();
        for note in envelope.notes {
            match slots.get(&note.id) {
                Some(&slot) => deduped[slot] = note,
                None => {
                    slots.insert(note.id.clone(), deduped.len());
                    deduped.push(note);
                }
            }
        }
        let count = deduped.len();
        self.envelope = Envelope {
            version: codec::SCHEMA_VERSION,
            notes: deduped,
        };
        self.persist();
        Ok(count)
    }

    fn persist(&mut self) {
        match codec::encode(&self.envelope) {
            Ok(text) => match self.storage.set(STORAGE_KEY, &text) {
                Ok(()) => debug!(count = self.envelope.notes.len(), "persisted notes"),
                Err(error) => {
                    warn!(%error, "failed to persist notes, keeping in-memory state");
                }
            },
            Err(error) => warn!(%error, "failed to serialize notes"),
        }
    }
}

/// `<slug>-<YYYY-MM-DD>.json`, slug derived from the app name.
pub fn export_file_name(today: NaiveDate) -> String {
    format!("{}-{}.json", slugify(APP_NAME), today.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};

    fn empty_store() -> NoteStore<MemoryStore> {
        let mut store = NoteStore::load(MemoryStore::new());
        let seeded: Vec<String> = store.notes().iter().map(|n| n.id.clone()).collect();
        for id in seeded {
            store.delete(&id);
        }
        store
    }

    fn store_with(records: &str) -> NoteStore<MemoryStore> {
        let mut store = empty_store();
        store.import_from_text(records).expect("test fixture import");
        store
    }

    #[test]
    fn first_load_seeds_a_welcome_note() {
        let store = NoteStore::load(MemoryStore::new());
        assert_eq!(store.notes().len(), 1);
        assert_eq!(store.notes()[0].title, "Welcome to Ocean Notes");
    }

    #[test]
    fn create_prepends_an_untitled_note() {
        let mut store = NoteStore::load(MemoryStore::new());
        let note = store.create();
        assert_eq!(note.title, "Untitled note");
        assert_eq!(note.body, "");
        assert!(!note.pinned);
        assert_eq!(note.created_at, note.updated_at);
        assert_eq!(store.notes()[0].id, note.id);
        assert_eq!(store.notes().len(), 2);
    }

    #[test]
    fn update_merges_and_stamps_recency() {
        let mut store = store_with(r#"[{"id":"a","title":"old","createdAt":1,"updatedAt":1}]"#);
        let patch = NotePatch {
            title: Some("new".to_string()),
            ..Default::default()
        };
        assert!(store.update("a", &patch));
        let note = store.get_by_id("a").expect("note");
        assert_eq!(note.title, "new");
        assert_eq!(note.created_at, 1);
        assert!(note.updated_at > 1);
        assert!(!store.update("missing", &patch));
    }

    #[test]
    fn toggle_pinned_leaves_recency_alone() {
        let mut store = store_with(r#"[{"id":"a","title":"t","createdAt":1,"updatedAt":7}]"#);
        assert!(store.toggle_pinned("a"));
        let note = store.get_by_id("a").expect("note");
        assert!(note.pinned);
        assert_eq!(note.updated_at, 7);
        assert!(store.toggle_pinned("a"));
        assert!(!store.get_by_id("a").expect("note").pinned);
        assert!(!store.toggle_pinned("missing"));
    }

    #[test]
    fn duplicate_copies_body_with_fresh_identity() {
        let mut store = store_with(
            r#"[{"id":"a","title":"Hello","body":"text","createdAt":1,"updatedAt":1,"pinned":true}]"#,
        );
        let before = now_ms();
        let copy = store.duplicate("a").expect("copy");
        assert_eq!(copy.title, "Copy of Hello");
        assert_eq!(copy.body, "text");
        assert!(!copy.pinned);
        assert_ne!(copy.id, "a");
        assert_eq!(copy.created_at, copy.updated_at);
        assert!(copy.created_at >= before);
        assert_eq!(store.notes()[0].id, copy.id);
        assert_eq!(store.duplicate("missing"), None);
    }

    #[test]
    fn duplicate_of_a_blank_title_falls_back_to_untitled() {
        let mut store = store_with(r#"[{"id":"a","title":"   "}]"#);
        let copy = store.duplicate("a").expect("copy");
        assert_eq!(copy.title, "Copy of Untitled note");
    }

    #[test]
    fn delete_removes_and_ignores_unknown_ids() {
        let mut store = store_with(r#"[{"id":"a"},{"id":"b"}]"#);
        assert!(store.delete("a"));
        assert_eq!(store.notes().len(), 1);
        assert!(!store.delete("a"));
        assert_eq!(store.notes().len(), 1);
    }

    #[test]
    fn sorted_view_puts_pinned_first_then_recency() {
        let store = store_with(
            r#"[{"id":"A","updatedAt":100,"createdAt":1},
                {"id":"B","updatedAt":50,"createdAt":1,"pinned":true},
                {"id":"C","updatedAt":200,"createdAt":1}]"#,
        );
        let view = store.sorted_view();
        let ids: Vec<&str> = view.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "C", "A"]);
    }

    #[test]
    fn sorted_view_breaks_ties_by_collection_order() {
        let store = store_with(
            r#"[{"id":"x","updatedAt":5,"createdAt":1},{"id":"y","updatedAt":5,"createdAt":1}]"#,
        );
        let view = store.sorted_view();
        let ids: Vec<&str> = view.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn search_is_case_insensitive_substring_over_title_and_body() {
        let store = store_with(
            r#"[{"id":"a","title":"Alpha","body":"nothing","createdAt":1,"updatedAt":1},
                {"id":"b","title":"Beta note","body":"Contains KEYWORD in body","createdAt":1,"updatedAt":2},
                {"id":"c","title":"Gamma","body":"other","createdAt":1,"updatedAt":3}]"#,
        );
        let hits = store.search("keyword");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
        assert_eq!(store.search("  "), store.sorted_view());
        assert_eq!(store.search("beta").len(), 1);
        assert_eq!(store.search("zzz").len(), 0);
    }

    #[test]
    fn import_dedupes_by_id_with_the_later_record_winning() {
        let mut store = empty_store();
        let count = store
            .import_from_text(r#"[{"id":"x","title":"old"},{"id":"x","title":"new"}]"#)
            .expect("import");
        assert_eq!(count, 1);
        assert_eq!(store.notes().len(), 1);
        assert_eq!(store.get_by_id("x").expect("note").title, "new");
    }

    #[test]
    fn import_replaces_the_whole_collection() {
        let mut store = store_with(r#"[{"id":"keepme","title":"pre"}]"#);
        let count = store
            .import_from_text(r#"{"version":1,"notes":[{"id":"fresh","title":"post"}]}"#)
            .expect("import");
        assert_eq!(count, 1);
        assert!(store.get_by_id("keepme").is_none());
        assert!(store.get_by_id("fresh").is_some());
    }

    #[test]
    fn import_surfaces_exactly_two_errors() {
        let mut store = empty_store();
        let parse = store.import_from_text("{not json").expect_err("parse error");
        assert_eq!(parse.to_string(), "Invalid JSON file.");
        let shape = store.import_from_text(r#"{"foo":1}"#).expect_err("shape error");
        assert_eq!(shape.to_string(), "JSON does not contain a valid notes array.");
    }

    #[test]
    fn export_text_parses_back_to_the_same_collection() {
        let store = store_with(r#"[{"id":"a","title":"T","body":"B","createdAt":3,"updatedAt":9}]"#);
        let text = store.export_to_text().expect("export");
        assert!(text.contains("\"version\": 1"));
        let mut other = empty_store();
        other.import_from_text(&text).expect("reimport");
        assert_eq!(other.notes(), store.notes());
    }

    #[test]
    fn mutations_survive_a_reload_from_the_same_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let id = {
            let mut store = NoteStore::load(FileStore::open(dir.path()));
            let note = store.create();
            store.update(
                &note.id,
                &NotePatch {
                    body: Some("durable".to_string()),
                    ..Default::default()
                },
            );
            note.id
        };
        let reloaded = NoteStore::load(FileStore::open(dir.path()));
        let note = reloaded.get_by_id(&id).expect("note survived");
        assert_eq!(note.body, "durable");
    }

    #[test]
    fn export_file_name_is_slug_and_date() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).expect("date");
        assert_eq!(export_file_name(day), "ocean-notes-2025-01-02.json");
    }
}
