use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ocean-notes", version, about = "Local-first notes with markdown preview")]
pub struct Cli {
    /// Override the notes data directory
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new note
    New {
        /// Title for the new note (defaults to "Untitled note")
        #[arg(long)]
        title: Option<String>,
    },
    /// List notes, pinned first, most recently edited first
    List,
    /// List only notes whose title or body contains the query
    Search {
        /// Case-insensitive substring to look for
        query: String,
    },
    /// Show one note in full
    Show {
        /// Note id to show
        note_id: String,
    },
    /// Edit an existing note
    Edit {
        /// Note id to edit
        note_id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New body
        #[arg(long)]
        body: Option<String>,
    },
    /// Pin or unpin a note
    Pin {
        /// Note id to toggle
        note_id: String,
    },
    /// Create a copy of a note
    Duplicate {
        /// Note id to copy
        note_id: String,
    },
    /// Delete a note
    Delete {
        /// Note id to delete
        note_id: String,
    },
    /// Render a note body as HTML
    Preview {
        /// Note id to render
        note_id: String,
    },
    /// Write all notes to a JSON file
    Export {
        /// Output path (defaults to ocean-notes-<date>.json in the current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace all notes with the contents of a JSON file
    Import {
        /// Path to a previously exported JSON file
        path: PathBuf,
    },
    /// Delete every note; the next run starts from the welcome note
    Reset,
}
