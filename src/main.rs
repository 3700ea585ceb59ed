mod cli;
mod codec;
mod commands;
mod debounce;
mod ids;
mod markdown;
mod model;
mod storage;
mod store;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let args = cli::Cli::parse();
    let command = args.command.unwrap_or(cli::Command::List);
    match command {
        cli::Command::New { title } => commands::new_note(args.store_dir, title),
        cli::Command::List => commands::list(args.store_dir),
        cli::Command::Search { query } => commands::search(args.store_dir, query),
        cli::Command::Show { note_id } => commands::show(args.store_dir, note_id),
        cli::Command::Edit {
            note_id,
            title,
            body,
        } => commands::edit(args.store_dir, note_id, title, body),
        cli::Command::Pin { note_id } => commands::pin(args.store_dir, note_id),
        cli::Command::Duplicate { note_id } => commands::duplicate(args.store_dir, note_id),
        cli::Command::Delete { note_id } => commands::delete(args.store_dir, note_id),
        cli::Command::Preview { note_id } => commands::preview(args.store_dir, note_id),
        cli::Command::Export { out } => commands::export(args.store_dir, out),
        cli::Command::Import { path } => commands::import(args.store_dir, path),
        cli::Command::Reset => commands::reset(args.store_dir),
    }
}
