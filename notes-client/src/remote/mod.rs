//! Request/response boundary to the notes backend.
//!
//! The state core only ever talks to the backend through [`RemoteNotesService`].
//! `NotesHttpClient` is the JSON-over-HTTP implementation; tests substitute an
//! in-memory double.

mod http_client;
#[cfg(test)]
pub(crate) mod mock;

pub use http_client::NotesHttpClient;

use crate::error::RemoteResult;
use async_trait::async_trait;
use notes_types::{
    Acknowledgement, CreateNoteRequest, HealthStatus, Note, NoteId, QueryRequest, QueryResponse,
    UpdateNoteRequest,
};

/// Note CRUD plus index rebuild and query. Implementations are stateless
/// from the caller's point of view; every call is one request.
#[async_trait]
pub trait RemoteNotesService: Send + Sync {
    /// GET /notes
    async fn list_notes(&self) -> RemoteResult<Vec<Note>>;

    /// POST /notes
    async fn create_note(&self, req: &CreateNoteRequest) -> RemoteResult<Note>;

    /// PATCH /notes/{id}
    async fn update_note(&self, id: &NoteId, req: &UpdateNoteRequest) -> RemoteResult<Note>;

    /// DELETE /notes/{id}
    async fn delete_note(&self, id: &NoteId) -> RemoteResult<Acknowledgement>;

    /// POST /rebuild-index
    async fn rebuild_index(&self) -> RemoteResult<Acknowledgement>;

    /// POST /query
    async fn query(&self, req: &QueryRequest) -> RemoteResult<QueryResponse>;

    /// GET /health
    async fn health(&self) -> RemoteResult<HealthStatus>;
}
