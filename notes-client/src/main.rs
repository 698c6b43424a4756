//! notes-client: command-line front end for the notes backend.
//!
//! Lists, creates, updates and deletes notes, bulk-imports notes from a JSON
//! file, rebuilds the search index and asks questions against the collection.
//! `ask` without a question reads questions from stdin until `quit`.
//!
//! Default backend: http://127.0.0.1:8000

use clap::{Parser, Subcommand};
use notes_client::config::defaults;
use notes_client::types::{HealthStatus, Note, NoteDraft, NoteId};
use notes_client::{
    ClientConfig, NotesApp, NotesHttpClient, RemoteError, RemoteNotesService, UpdateOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Note {0} not found")]
    NoteNotFound(NoteId),

    #[error("Failed to read {}: {source}", .path.display())]
    ReadImport {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not a JSON array of {{title, content}} objects: {source}", .path.display())]
    ImportFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to read a question from stdin: {0}")]
    Stdin(std::io::Error),
}

#[derive(Parser)]
#[command(name = "notes-client", version, about = "Manage and query notes on a notes backend")]
struct Cli {
    /// Backend base URL (overrides NOTES_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all notes
    List,
    /// Create a note
    Create {
        #[arg(long, default_value = defaults::NEW_NOTE_TITLE)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Change a note's title and/or content
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a note
    Delete { id: String },
    /// Create one note per entry of a JSON array of {title, content} objects
    Import { path: PathBuf },
    /// Rebuild the backend's search index
    RebuildIndex,
    /// Rebuild the index, then ask a question against the notes.
    /// Without a question, reads questions from stdin until quit/exit/q.
    Ask {
        question: Option<String>,
        /// Number of references to retrieve (overrides NOTES_QUERY_TOP_K)
        #[arg(long)]
        k: Option<u32>,
    },
    /// Check that the backend is up
    Health,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let mut config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };
    if let Some(url) = cli.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Command::Ask { k: Some(k), .. } = &cli.command {
        config.query_top_k = Some(*k);
    }

    let client = match NotesHttpClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("Using notes backend at {}", client.base_url());

    if let Err(e) = run(cli.command, &config, Arc::new(client)).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(
    command: Command,
    config: &ClientConfig,
    remote: Arc<dyn RemoteNotesService>,
) -> Result<(), CliError> {
    let app = NotesApp::new(config, remote.clone());

    match command {
        Command::List => {
            app.store().load_all().await?;
            for note in app.notes() {
                println!("{}\t{}", note.id, note.title);
            }
        }
        Command::Create { title, content } => {
            let note = app.create_note(&title, &content).await?;
            println!("Created note {} ({})", note.id, note.title);
        }
        Command::Update { id, title, content } => {
            app.store().load_all().await?;
            let id = NoteId::new(id);
            let draft = updated_draft(app.store().note(&id).as_ref(), &id, title, content)?;
            match app.store().update(&id, &draft).await? {
                UpdateOutcome::Saved(note) => println!("Saved note {}", note.id),
                UpdateOutcome::Unchanged => println!("Note {} unchanged", id),
            }
        }
        Command::Delete { id } => {
            app.delete_note(&NoteId::new(id.clone())).await?;
            println!("Deleted note {}", id);
        }
        Command::Import { path } => {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| CliError::ReadImport {
                    path: path.clone(),
                    source,
                })?;
            let drafts = parse_import(&raw).map_err(|source| CliError::ImportFormat {
                path: path.clone(),
                source,
            })?;
            let imported = app.import_notes(&drafts).await?;
            println!("Imported {} notes from {}", imported, path.display());
        }
        Command::RebuildIndex => {
            let ack = remote.rebuild_index().await?;
            println!("{}", ack.message.unwrap_or_else(|| "Index rebuilt".to_string()));
        }
        Command::Ask {
            question: Some(question),
            ..
        } => {
            ask_and_print(&app, &question).await?;
        }
        Command::Ask { question: None, .. } => {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            println!("Enter your question (or 'quit' to exit):");
            while let Some(line) = lines.next_line().await.map_err(CliError::Stdin)? {
                let question = line.trim();
                if is_quit(question) {
                    break;
                }
                if question.is_empty() {
                    continue;
                }
                if let Err(e) = ask_and_print(&app, question).await {
                    log::error!("{}", e);
                }
                println!("\nEnter another question (or 'quit' to exit):");
            }
        }
        Command::Health => {
            let health = remote.health().await?;
            println!("{}", health_line(&health));
            if !health.is_healthy() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn ask_and_print(app: &NotesApp, question: &str) -> Result<(), RemoteError> {
    let session = app.ask(question).await?;
    println!("Query: {}\n", session.last_question);
    println!("{}", session.answer);
    if !session.references.is_empty() {
        println!("\nRelevant notes:");
        for reference in &session.references {
            println!(
                "- {} [{}]\n  {}",
                reference.title,
                reference.id,
                reference.preview(defaults::REFERENCE_PREVIEW_CHARS)
            );
        }
    }
    Ok(())
}

/// Fill the fields not given on the command line from the note as loaded.
/// A note that is not in the collection is an error rather than a blank patch.
fn updated_draft(
    current: Option<&Note>,
    id: &NoteId,
    title: Option<String>,
    content: Option<String>,
) -> Result<NoteDraft, CliError> {
    let current = current.ok_or_else(|| CliError::NoteNotFound(id.clone()))?;
    Ok(NoteDraft {
        title: title.unwrap_or_else(|| current.title.clone()),
        content: content.unwrap_or_else(|| current.content.clone()),
    })
}

fn health_line(health: &HealthStatus) -> String {
    match health.message.as_deref() {
        Some(message) => format!("{}: {}", health.status, message),
        None => health.status.clone(),
    }
}

fn parse_import(raw: &str) -> Result<Vec<NoteDraft>, serde_json::Error> {
    serde_json::from_str(raw)
}

fn is_quit(line: &str) -> bool {
    matches!(line.to_lowercase().as_str(), "quit" | "exit" | "q")
}
