//! In-memory backend double that records every call with its (virtual) time.

use super::RemoteNotesService;
use crate::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use notes_types::{
    Acknowledgement, CreateNoteRequest, HealthStatus, Note, NoteId, QueryRequest, QueryResponse,
    UpdateNoteRequest,
};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RemoteCall {
    ListNotes,
    CreateNote(CreateNoteRequest),
    UpdateNote(NoteId, UpdateNoteRequest),
    DeleteNote(NoteId),
    RebuildStarted,
    RebuildFinished,
    QueryStarted(String),
    QueryFinished(String),
    Health,
}

impl RemoteCall {
    /// Completion markers are bookkeeping, not requests
    fn is_request(&self) -> bool {
        !matches!(self, Self::RebuildFinished | Self::QueryFinished(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    List,
    Create,
    Update,
    Delete,
    Rebuild,
    Query,
}

type Rewrite = Box<dyn Fn(&mut Note) + Send + Sync>;

#[derive(Default)]
struct MockState {
    notes: Vec<Note>,
    next_id: usize,
    forced_create_ids: VecDeque<NoteId>,
    calls: Vec<(RemoteCall, Instant)>,
    failing: HashSet<Op>,
    rebuild_delays: VecDeque<Duration>,
    query_delays: VecDeque<Duration>,
    query_responses: VecDeque<QueryResponse>,
    update_rewrite: Option<Rewrite>,
}

#[derive(Default)]
pub(crate) struct MockRemote {
    state: Mutex<MockState>,
}

pub(crate) fn note(id: &str, title: &str, content: &str) -> Note {
    Note {
        id: NoteId::new(id),
        title: title.to_string(),
        content: content.to_string(),
        created: None,
        updated: None,
    }
}

fn injected() -> RemoteError {
    RemoteError::Status {
        status: 500,
        body: "injected failure".to_string(),
    }
}

fn not_found() -> RemoteError {
    RemoteError::Status {
        status: 404,
        body: "Note not found".to_string(),
    }
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notes(notes: Vec<Note>) -> Self {
        let mock = Self::new();
        {
            let mut state = mock.state.lock();
            state.next_id = notes.len();
            state.notes = notes;
        }
        mock
    }

    pub fn fail(&self, op: Op) {
        self.state.lock().failing.insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.state.lock().failing.remove(&op);
    }

    /// Make the next create return `id` instead of a fresh one
    pub fn force_next_create_id(&self, id: &str) {
        self.state.lock().forced_create_ids.push_back(NoteId::new(id));
    }

    pub fn delay_next_rebuild(&self, delay: Duration) {
        self.state.lock().rebuild_delays.push_back(delay);
    }

    pub fn delay_next_query(&self, delay: Duration) {
        self.state.lock().query_delays.push_back(delay);
    }

    pub fn respond_to_next_query(&self, resp: QueryResponse) {
        self.state.lock().query_responses.push_back(resp);
    }

    /// Let the backend alter stored values on update (it is authoritative)
    pub fn rewrite_updates<F>(&self, f: F)
    where
        F: Fn(&mut Note) + Send + Sync + 'static,
    {
        self.state.lock().update_rewrite = Some(Box::new(f));
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().calls.iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(RemoteCall, Instant)> {
        self.state.lock().calls.clone()
    }

    /// Number of requests issued, excluding completion markers
    pub fn request_count(&self) -> usize {
        self.state.lock().calls.iter().filter(|(c, _)| c.is_request()).count()
    }

    pub fn updates(&self) -> Vec<(NoteId, UpdateNoteRequest, Instant)> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|(c, at)| match c {
                RemoteCall::UpdateNote(id, req) => Some((id.clone(), req.clone(), *at)),
                _ => None,
            })
            .collect()
    }

    pub fn server_notes(&self) -> Vec<Note> {
        self.state.lock().notes.clone()
    }

    fn record(&self, call: RemoteCall) {
        self.state.lock().calls.push((call, Instant::now()));
    }

    fn check(&self, op: Op) -> RemoteResult<()> {
        if self.state.lock().failing.contains(&op) {
            Err(injected())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteNotesService for MockRemote {
    async fn list_notes(&self) -> RemoteResult<Vec<Note>> {
        self.record(RemoteCall::ListNotes);
        self.check(Op::List)?;
        Ok(self.state.lock().notes.clone())
    }

    async fn create_note(&self, req: &CreateNoteRequest) -> RemoteResult<Note> {
        self.record(RemoteCall::CreateNote(req.clone()));
        self.check(Op::Create)?;

        let mut state = self.state.lock();
        let id = match state.forced_create_ids.pop_front() {
            Some(id) => id,
            None => {
                state.next_id += 1;
                NoteId::new(format!("n{}", state.next_id))
            }
        };
        let created = Note {
            id,
            ..note("", &req.title, &req.content)
        };
        match state.notes.iter().position(|n| n.id == created.id) {
            Some(idx) => state.notes[idx] = created.clone(),
            None => state.notes.push(created.clone()),
        }
        Ok(created)
    }

    async fn update_note(&self, id: &NoteId, req: &UpdateNoteRequest) -> RemoteResult<Note> {
        self.record(RemoteCall::UpdateNote(id.clone(), req.clone()));
        self.check(Op::Update)?;

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let stored = state
            .notes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(not_found)?;
        if let Some(title) = &req.title {
            stored.title = title.clone();
        }
        if let Some(content) = &req.content {
            stored.content = content.clone();
        }
        if let Some(rewrite) = &state.update_rewrite {
            rewrite(stored);
        }
        Ok(stored.clone())
    }

    async fn delete_note(&self, id: &NoteId) -> RemoteResult<Acknowledgement> {
        self.record(RemoteCall::DeleteNote(id.clone()));
        self.check(Op::Delete)?;

        let mut state = self.state.lock();
        let before = state.notes.len();
        state.notes.retain(|n| &n.id != id);
        if state.notes.len() == before {
            return Err(not_found());
        }
        Ok(Acknowledgement {
            message: Some("Note deleted successfully".to_string()),
            deleted_note_id: Some(id.clone()),
        })
    }

    async fn rebuild_index(&self) -> RemoteResult<Acknowledgement> {
        self.record(RemoteCall::RebuildStarted);
        let delay = self.state.lock().rebuild_delays.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check(Op::Rebuild)?;
        self.record(RemoteCall::RebuildFinished);
        Ok(Acknowledgement {
            message: Some("Index rebuilt successfully".to_string()),
            deleted_note_id: None,
        })
    }

    async fn query(&self, req: &QueryRequest) -> RemoteResult<QueryResponse> {
        self.record(RemoteCall::QueryStarted(req.question.clone()));
        let (delay, canned) = {
            let mut state = self.state.lock();
            (state.query_delays.pop_front(), state.query_responses.pop_front())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check(Op::Query)?;
        self.record(RemoteCall::QueryFinished(req.question.clone()));

        Ok(canned.unwrap_or_else(|| QueryResponse {
            answer: format!("answer: {}", req.question),
            references: Vec::new(),
        }))
    }

    async fn health(&self) -> RemoteResult<HealthStatus> {
        self.record(RemoteCall::Health);
        Ok(HealthStatus {
            status: "healthy".to_string(),
            message: None,
        })
    }
}
