//! Client-side state core for a personal notes tool.
//!
//! Keeps an in-memory note collection consistent with the notes backend,
//! autosaves the open note after a quiet period, and answers questions
//! against the collection by rebuilding the backend index and querying it.

pub mod app;
pub mod ask;
pub mod config;
pub mod error;
pub mod notes;
pub mod remote;

pub use app::NotesApp;
pub use ask::{AskOrdering, AskPhase, AskSession, QueryCoordinator};
pub use config::ClientConfig;
pub use error::{ConfigError, RemoteError, RemoteResult};
pub use notes::{AutosaveConfig, AutosaveScheduler, NoteStore, UpdateOutcome};
pub use remote::{NotesHttpClient, RemoteNotesService};

pub use notes_types as types;
