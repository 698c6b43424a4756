//! NoteStore: the canonical in-memory note collection and current selection.
//!
//! Every mutating command performs exactly one remote call and only touches
//! local state once the response is in. Nothing is applied optimistically,
//! and a failed call leaves the collection and selection untouched.

use crate::error::RemoteResult;
use crate::remote::RemoteNotesService;
use notes_types::{CreateNoteRequest, Note, NoteDraft, NoteId, UpdateNoteRequest};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Result of an update command
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Title and content already matched the synced note; nothing was sent
    Unchanged,
    /// The backend accepted the update and returned its stored representation
    Saved(Note),
}

#[derive(Debug, Default)]
struct StoreState {
    notes: Vec<Note>,
    current_note_id: Option<NoteId>,
}

impl StoreState {
    fn position(&self, id: &NoteId) -> Option<usize> {
        self.notes.iter().position(|n| &n.id == id)
    }
}

pub struct NoteStore {
    remote: Arc<dyn RemoteNotesService>,
    state: RwLock<StoreState>,
}

impl NoteStore {
    pub fn new(remote: Arc<dyn RemoteNotesService>) -> Self {
        Self {
            remote,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Replace the collection with the backend's current set of notes.
    /// On failure the collection keeps whatever it held before.
    pub async fn load_all(&self) -> RemoteResult<usize> {
        let fetched = self.remote.list_notes().await?;

        let mut seen = HashSet::new();
        let mut notes = Vec::with_capacity(fetched.len());
        for note in fetched {
            if seen.insert(note.id.clone()) {
                notes.push(note);
            } else {
                log::warn!("[NOTES] Backend listed note {} more than once, keeping the first", note.id);
            }
        }

        let count = notes.len();
        self.state.write().notes = notes;
        log::info!("[NOTES] Loaded {} notes", count);
        Ok(count)
    }

    /// Create a note on the backend, append it and select it.
    pub async fn create(&self, title: &str, content: &str) -> RemoteResult<Note> {
        let req = CreateNoteRequest {
            title: title.to_string(),
            content: content.to_string(),
        };
        let created = self.remote.create_note(&req).await?;

        let mut state = self.state.write();
        match state.position(&created.id) {
            Some(idx) => {
                log::warn!("[NOTES] Backend returned existing id {} for a new note", created.id);
                state.notes[idx] = created.clone();
            }
            None => state.notes.push(created.clone()),
        }
        state.current_note_id = Some(created.id.clone());
        log::debug!("[NOTES] Created note {}", created.id);

        Ok(created)
    }

    /// Persist `draft` for note `id`, sending only the fields that differ from
    /// the last-synced values. Sends nothing when both already match.
    pub async fn update(&self, id: &NoteId, draft: &NoteDraft) -> RemoteResult<UpdateOutcome> {
        let synced = self.note(id).map(|n| n.draft());
        let Some(req) = UpdateNoteRequest::between(synced.as_ref(), draft) else {
            return Ok(UpdateOutcome::Unchanged);
        };

        let saved = self.remote.update_note(id, &req).await?;

        let mut state = self.state.write();
        match state.position(&saved.id) {
            Some(idx) => state.notes[idx] = saved.clone(),
            None => log::debug!("[NOTES] Note {} is gone locally, dropping its update", saved.id),
        }

        Ok(UpdateOutcome::Saved(saved))
    }

    /// Delete a note on the backend and remove it locally.
    ///
    /// Any successful delete clears the selection, including when a different
    /// note than the deleted one was selected.
    pub async fn delete(&self, id: &NoteId) -> RemoteResult<()> {
        self.remote.delete_note(id).await?;

        let mut state = self.state.write();
        state.notes.retain(|n| &n.id != id);
        state.current_note_id = None;
        log::debug!("[NOTES] Deleted note {}", id);

        Ok(())
    }

    /// Set the selection without checking that the note exists
    pub fn select(&self, id: Option<NoteId>) {
        self.state.write().current_note_id = id;
    }

    pub fn current_note_id(&self) -> Option<NoteId> {
        self.state.read().current_note_id.clone()
    }

    /// The selected note, or `None` when nothing is selected or the selection is stale
    pub fn current_note(&self) -> Option<Note> {
        let state = self.state.read();
        let id = state.current_note_id.as_ref()?;
        state.notes.iter().find(|n| &n.id == id).cloned()
    }

    pub fn note(&self, id: &NoteId) -> Option<Note> {
        self.state.read().notes.iter().find(|n| &n.id == id).cloned()
    }

    /// Snapshot of the collection in display order
    pub fn notes(&self) -> Vec<Note> {
        self.state.read().notes.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().notes.is_empty()
    }
}
