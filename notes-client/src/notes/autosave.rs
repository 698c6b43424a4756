//! Debounced autosave for the note open in the editor
//!
//! Edits to the open note restart a single quiet-period timer; only the draft
//! as it stands when the timer elapses is sent to the backend.
//!
//! Switching to another note (or closing the editor) cancels the timer
//! WITHOUT flushing. Edits made within the quiet period right before a switch
//! are never sent.

use super::store::{NoteStore, UpdateOutcome};
use notes_types::{Note, NoteDraft, NoteId};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Configuration for autosave
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// Quiet period after the last edit before the draft is persisted (default: 500ms)
    pub quiet_period: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(crate::config::defaults::AUTOSAVE_DEBOUNCE_MS),
        }
    }
}

/// Draft state for the note currently open in the editor
#[derive(Debug)]
struct PendingEdit {
    note_id: NoteId,
    draft: NoteDraft,
    /// Outstanding quiet-period timer, if an edit is waiting to be flushed
    timer: Option<CancellationToken>,
    /// Generation of the most recent edit; a firing timer must match it
    generation: u64,
}

#[derive(Debug, Default)]
struct SchedulerState {
    open: Option<PendingEdit>,
    last_generation: u64,
}

/// Turns rapid edits into infrequent `NoteStore::update` calls.
///
/// Tracks at most one note at a time. Cheap to clone; clones share state.
/// Edits spawn their timer on the ambient tokio runtime. Outside a runtime an
/// edit is refused and the draft is left as it was.
#[derive(Clone)]
pub struct AutosaveScheduler {
    config: AutosaveConfig,
    store: Arc<NoteStore>,
    state: Arc<Mutex<SchedulerState>>,
}

impl AutosaveScheduler {
    pub fn new(store: Arc<NoteStore>, config: AutosaveConfig) -> Self {
        Self {
            config,
            store,
            state: Arc::new(Mutex::new(SchedulerState::default())),
        }
    }

    /// Start tracking `note` (or nothing), dropping any unsent draft of the
    /// previously open note.
    pub fn open(&self, note: Option<&Note>) {
        let mut state = self.state.lock();

        if let Some(prev) = state.open.take() {
            if let Some(timer) = prev.timer {
                timer.cancel();
                log::debug!("[AUTOSAVE] Discarded unsaved edits to note {}", prev.note_id);
            }
        }

        state.open = note.map(|n| PendingEdit {
            note_id: n.id.clone(),
            draft: n.draft(),
            timer: None,
            generation: 0,
        });
    }

    /// Stop tracking the open note without flushing
    pub fn close(&self) {
        self.open(None);
    }

    /// Record a title edit. Returns false when no note is open.
    pub fn edit_title(&self, title: impl Into<String>) -> bool {
        let title = title.into();
        self.edit(move |draft| draft.title = title)
    }

    /// Record a content edit. Returns false when no note is open.
    pub fn edit_content(&self, content: impl Into<String>) -> bool {
        let content = content.into();
        self.edit(move |draft| draft.content = content)
    }

    /// Replace the whole draft. Returns false when no note is open.
    pub fn edit_draft(&self, draft: NoteDraft) -> bool {
        self.edit(move |d| *d = draft)
    }

    fn edit<F: FnOnce(&mut NoteDraft)>(&self, apply: F) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            log::error!("[AUTOSAVE] Edit ignored, no tokio runtime to schedule the save on");
            return false;
        };

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(pending) = state.open.as_mut() else {
            log::debug!("[AUTOSAVE] Edit ignored, no note is open");
            return false;
        };

        apply(&mut pending.draft);

        if let Some(timer) = pending.timer.take() {
            timer.cancel();
        }
        state.last_generation += 1;
        pending.generation = state.last_generation;

        let token = CancellationToken::new();
        pending.timer = Some(token.clone());

        let note_id = pending.note_id.clone();
        let generation = pending.generation;
        let deadline = Instant::now() + self.config.quiet_period;
        drop(guard);

        let scheduler = self.clone();
        runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    scheduler.flush(note_id, generation).await;
                }
            }
        });

        true
    }

    /// Timer elapsed: persist the draft if it still belongs to the latest edit
    /// and differs from what the store last synced.
    async fn flush(&self, note_id: NoteId, generation: u64) {
        let draft = {
            let mut state = self.state.lock();
            match state.open.as_mut() {
                Some(p) if p.note_id == note_id && p.generation == generation => {
                    p.timer = None;
                    p.draft.clone()
                }
                _ => return,
            }
        };

        let Some(synced) = self.store.note(&note_id) else {
            log::debug!("[AUTOSAVE] Note {} is no longer in the collection", note_id);
            return;
        };
        if synced.matches(&draft) {
            return;
        }

        match self.store.update(&note_id, &draft).await {
            Ok(UpdateOutcome::Saved(_)) => log::debug!("[AUTOSAVE] Saved note {}", note_id),
            Ok(UpdateOutcome::Unchanged) => {}
            Err(e) => log::warn!("[AUTOSAVE] Failed to save note {}: {}", note_id, e),
        }
    }

    /// Id of the note whose edits are being tracked
    pub fn tracked_note_id(&self) -> Option<NoteId> {
        self.state.lock().open.as_ref().map(|p| p.note_id.clone())
    }

    /// The draft as typed, regardless of what has been persisted
    pub fn draft(&self) -> Option<NoteDraft> {
        self.state.lock().open.as_ref().map(|p| p.draft.clone())
    }

    /// Whether a quiet-period timer is outstanding
    pub fn has_pending(&self) -> bool {
        self.state
            .lock()
            .open
            .as_ref()
            .is_some_and(|p| p.timer.is_some())
    }

    pub fn config(&self) -> &AutosaveConfig {
        &self.config
    }
}
