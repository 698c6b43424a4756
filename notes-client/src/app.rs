//! NotesApp: the application session.
//!
//! Owns the note store, the autosave scheduler and the query coordinator for
//! the lifetime of the session, and routes presentation intents to them so the
//! editor always tracks the current selection.

use crate::ask::{AskSession, QueryCoordinator};
use crate::config::{ClientConfig, defaults};
use crate::error::RemoteResult;
use crate::notes::{AutosaveConfig, AutosaveScheduler, NoteStore};
use crate::remote::RemoteNotesService;
use notes_types::{Note, NoteDraft, NoteId};
use std::sync::Arc;

pub struct NotesApp {
    store: Arc<NoteStore>,
    autosave: AutosaveScheduler,
    coordinator: QueryCoordinator,
}

impl NotesApp {
    /// Wire the components without touching the backend
    pub fn new(config: &ClientConfig, remote: Arc<dyn RemoteNotesService>) -> Self {
        let store = Arc::new(NoteStore::new(remote.clone()));
        let autosave = AutosaveScheduler::new(
            store.clone(),
            AutosaveConfig {
                quiet_period: config.autosave_quiet_period,
            },
        );
        let coordinator =
            QueryCoordinator::new(remote, config.ask_ordering).with_top_k(config.query_top_k);

        Self {
            store,
            autosave,
            coordinator,
        }
    }

    /// Start a session: wire the components and load the collection once.
    /// A failed load is logged and leaves the collection empty.
    pub async fn init(config: &ClientConfig, remote: Arc<dyn RemoteNotesService>) -> Self {
        let app = Self::new(config, remote);
        if let Err(e) = app.store.load_all().await {
            log::error!("[NOTES] Initial load failed, starting with no notes: {}", e);
        }
        app
    }

    /// Open `id` in the editor (or close it with `None`)
    pub fn select(&self, id: Option<NoteId>) {
        let already_open = id.is_some() && self.autosave.tracked_note_id() == id;
        self.store.select(id);
        if !already_open {
            self.autosave.open(self.store.current_note().as_ref());
        }
    }

    /// Create a note and open it in the editor
    pub async fn create_note(&self, title: &str, content: &str) -> RemoteResult<Note> {
        let note = self.store.create(title, content).await?;
        self.autosave.open(Some(&note));
        Ok(note)
    }

    /// Create an empty note with the default title
    pub async fn new_note(&self) -> RemoteResult<Note> {
        self.create_note(defaults::NEW_NOTE_TITLE, "").await
    }

    /// Create one note per draft, in order. Stops at the first failure; the
    /// notes created before it stay. The last created note ends up open.
    pub async fn import_notes(&self, drafts: &[NoteDraft]) -> RemoteResult<usize> {
        for (imported, draft) in drafts.iter().enumerate() {
            if let Err(e) = self.create_note(&draft.title, &draft.content).await {
                log::error!("[NOTES] Import stopped after {} of {} notes", imported, drafts.len());
                return Err(e);
            }
        }
        log::info!("[NOTES] Imported {} notes", drafts.len());
        Ok(drafts.len())
    }

    /// Delete a note; the editor is closed whichever note was open
    pub async fn delete_note(&self, id: &NoteId) -> RemoteResult<()> {
        self.store.delete(id).await?;
        self.autosave.close();
        Ok(())
    }

    pub fn edit_title(&self, title: impl Into<String>) -> bool {
        self.autosave.edit_title(title)
    }

    pub fn edit_content(&self, content: impl Into<String>) -> bool {
        self.autosave.edit_content(content)
    }

    pub async fn ask(&self, question: &str) -> RemoteResult<AskSession> {
        self.coordinator.ask(question).await
    }

    pub fn notes(&self) -> Vec<Note> {
        self.store.notes()
    }

    pub fn current_note(&self) -> Option<Note> {
        self.store.current_note()
    }

    /// What the editor shows: the in-progress draft of the open note
    pub fn draft(&self) -> Option<NoteDraft> {
        self.autosave.draft()
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn autosave(&self) -> &AutosaveScheduler {
        &self.autosave
    }

    pub fn coordinator(&self) -> &QueryCoordinator {
        &self.coordinator
    }
}
