use crate::markdown::render_markdown;
use crate::model::{Note, NotePatch};
use crate::storage::{FileStore, KeyValue};
use crate::store::{self, NoteStore};
use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use std::fs;
use std::path::PathBuf;

pub fn new_note(store_dir: Option<PathBuf>, title: Option<String>) -> Result<()> {
    let mut store = open_store(store_dir)?;
    let note = store.create();
    if let Some(title) = title {
        store.update(
            &note.id,
            &NotePatch {
                title: Some(title),
                ..Default::default()
            },
        );
    }
    println!("Created note {}", note.id);
    Ok(())
}

pub fn list(store_dir: Option<PathBuf>) -> Result<()> {
    let store = open_store(store_dir)?;
    let notes = store.sorted_view();
    if notes.is_empty() {
        println!("(no notes)");
        return Ok(());
    }
    for note in &notes {
        print_note_line(note);
    }
    Ok(())
}

pub fn search(store_dir: Option<PathBuf>, query: String) -> Result<()> {
    let store = open_store(store_dir)?;
    let notes = store.search(&query);
    if notes.is_empty() {
        println!("(no matches)");
        return Ok(());
    }
    for note in &notes {
        print_note_line(note);
    }
    Ok(())
}

pub fn show(store_dir: Option<PathBuf>, note_id: String) -> Result<()> {
    let store = open_store(store_dir)?;
    let Some(note) = store.get_by_id(&note_id) else {
        bail!("note {} not found", note_id);
    };
    println!("{}", note.title);
    println!("id:      {}", note.id);
    println!("created: {}", format_timestamp(note.created_at));
    println!("updated: {}", format_timestamp(note.updated_at));
    println!("pinned:  {}", note.pinned);
    if !note.body.is_empty() {
        println!();
        println!("{}", note.body);
    }
    Ok(())
}

pub fn edit(
    store_dir: Option<PathBuf>,
    note_id: String,
    title: Option<String>,
    body: Option<String>,
) -> Result<()> {
    if title.is_none() && body.is_none() {
        bail!("nothing to update (pass --title and/or --body)");
    }
    let mut store = open_store(store_dir)?;
    let patch = NotePatch { title, body };
    if !store.update(&note_id, &patch) {
        bail!("note {} not found", note_id);
    }
    println!("Updated note {}", note_id);
    Ok(())
}

pub fn pin(store_dir: Option<PathBuf>, note_id: String) -> Result<()> {
    let mut store = open_store(store_dir)?;
    if !store.toggle_pinned(&note_id) {
        bail!("note {} not found", note_id);
    }
    let pinned = store.get_by_id(&note_id).map(|n| n.pinned).unwrap_or(false);
    println!(
        "{} note {}",
        if pinned { "Pinned" } else { "Unpinned" },
        note_id
    );
    Ok(())
}

pub fn duplicate(store_dir: Option<PathBuf>, note_id: String) -> Result<()> {
    let mut store = open_store(store_dir)?;
    match store.duplicate(&note_id) {
        Some(copy) => {
            println!("Created note {} ({})", copy.id, copy.title);
            Ok(())
        }
        None => bail!("note {} not found", note_id),
    }
}

pub fn delete(store_dir: Option<PathBuf>, note_id: String) -> Result<()> {
    let mut store = open_store(store_dir)?;
    if !store.delete(&note_id) {
        bail!("note {} not found", note_id);
    }
    println!("Deleted note {}", note_id);
    Ok(())
}

pub fn preview(store_dir: Option<PathBuf>, note_id: String) -> Result<()> {
    let store = open_store(store_dir)?;
    let Some(note) = store.get_by_id(&note_id) else {
        bail!("note {} not found", note_id);
    };
    println!("{}", render_markdown(&note.body));
    Ok(())
}

pub fn export(store_dir: Option<PathBuf>, out: Option<PathBuf>) -> Result<()> {
    let store = open_store(store_dir)?;
    let text = store.export_to_text().context("serializing notes")?;
    let path = out
        .unwrap_or_else(|| PathBuf::from(store::export_file_name(Utc::now().date_naive())));
    fs::write(&path, text).with_context(|| format!("writing {:?}", path))?;
    println!("Exported {} notes to {}", store.notes().len(), path.display());
    Ok(())
}

pub fn import(store_dir: Option<PathBuf>, path: PathBuf) -> Result<()> {
    let text = fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
    let mut store = open_store(store_dir)?;
    match store.import_from_text(&text) {
        Ok(count) => {
            println!("Imported {} notes", count);
            Ok(())
        }
        Err(error) => bail!("{error}"),
    }
}

pub fn reset(store_dir: Option<PathBuf>) -> Result<()> {
    let mut storage = open_storage(store_dir)?;
    storage
        .clear(store::STORAGE_KEY)
        .context("clearing notes")?;
    println!("Cleared all notes");
    Ok(())
}

fn open_storage(store_dir: Option<PathBuf>) -> Result<FileStore> {
    match store_dir {
        Some(dir) => Ok(FileStore::open(dir)),
        None => FileStore::open_default(),
    }
}

fn open_store(store_dir: Option<PathBuf>) -> Result<NoteStore<FileStore>> {
    Ok(NoteStore::load(open_storage(store_dir)?))
}

fn print_note_line(note: &Note) {
    let marker = if note.pinned { "*" } else { "-" };
    let title = if note.title.trim().is_empty() {
        "(untitled)"
    } else {
        note.title.trim()
    };
    println!(
        "{} {}  {}  (updated {})",
        marker,
        note.id,
        title,
        format_timestamp(note.updated_at)
    );
}

fn format_timestamp(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M").to_string(),
        None => ms.to_string(),
    }
}
