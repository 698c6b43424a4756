//! Typed HTTP client for the notes backend API.

use super::RemoteNotesService;
use crate::config::ClientConfig;
use crate::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use notes_types::{
    Acknowledgement, CreateNoteRequest, HealthStatus, Note, NoteId, QueryRequest, QueryResponse,
    UpdateNoteRequest,
};
use serde::de::DeserializeOwned;

pub struct NotesHttpClient {
    base_url: String,
    client: reqwest::Client,
}

impl NotesHttpClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Build a client with the configured base URL and request timeout
    pub fn from_config(config: &ClientConfig) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(&config.api_url, client))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Check the status, then decode the body.
/// An empty body decodes as JSON `null` so unit-like acknowledgements work.
async fn read_json<T: DeserializeOwned>(op: &str, resp: reqwest::Response) -> RemoteResult<T> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        log::warn!("[REMOTE] {} returned HTTP {}: {}", op, status, body);
        return Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let text = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str(text).map_err(|e| {
        log::warn!("[REMOTE] {} returned an unreadable body: {}", op, e);
        RemoteError::MalformedBody(e)
    })
}

/// Acknowledgement bodies are informational; `null` means a bare success
async fn read_ack(op: &str, resp: reqwest::Response) -> RemoteResult<Acknowledgement> {
    let ack: Option<Acknowledgement> = read_json(op, resp).await?;
    Ok(ack.unwrap_or_default())
}

#[async_trait]
impl RemoteNotesService for NotesHttpClient {
    async fn list_notes(&self) -> RemoteResult<Vec<Note>> {
        let resp = self.client.get(self.url("/notes")).send().await?;
        read_json("list notes", resp).await
    }

    async fn create_note(&self, req: &CreateNoteRequest) -> RemoteResult<Note> {
        let resp = self
            .client
            .post(self.url("/notes"))
            .json(req)
            .send()
            .await?;
        read_json("create note", resp).await
    }

    async fn update_note(&self, id: &NoteId, req: &UpdateNoteRequest) -> RemoteResult<Note> {
        let resp = self
            .client
            .patch(self.url(&format!("/notes/{}", id)))
            .json(req)
            .send()
            .await?;
        read_json("update note", resp).await
    }

    async fn delete_note(&self, id: &NoteId) -> RemoteResult<Acknowledgement> {
        let resp = self
            .client
            .delete(self.url(&format!("/notes/{}", id)))
            .send()
            .await?;
        read_ack("delete note", resp).await
    }

    async fn rebuild_index(&self) -> RemoteResult<Acknowledgement> {
        let resp = self.client.post(self.url("/rebuild-index")).send().await?;
        read_ack("rebuild index", resp).await
    }

    async fn query(&self, req: &QueryRequest) -> RemoteResult<QueryResponse> {
        let resp = self
            .client
            .post(self.url("/query"))
            .json(req)
            .send()
            .await?;
        read_json("query", resp).await
    }

    async fn health(&self) -> RemoteResult<HealthStatus> {
        let resp = self.client.get(self.url("/health")).send().await?;
        read_json("health", resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_notes_accepts_integer_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "title": "First", "content": "a",
                 "created": "2024-03-01T10:00:00", "updated": "2024-03-01T10:00:00"},
                {"id": "n2", "title": "Second", "content": "b"}
            ])))
            .mount(&server)
            .await;

        let client = NotesHttpClient::new(&format!("{}/", server.uri()));
        let notes = client.list_notes().await.unwrap();

        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, NoteId::new("1"));
        assert_eq!(notes[1].id, NoteId::new("n2"));
    }

    #[tokio::test]
    async fn test_create_posts_title_and_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notes"))
            .and(body_json(serde_json::json!({"title": "Untitled Note", "content": ""})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(
                {"id": "n1", "title": "Untitled Note", "content": ""}
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = NotesHttpClient::new(&server.uri());
        let note = client
            .create_note(&CreateNoteRequest {
                title: "Untitled Note".to_string(),
                content: String::new(),
            })
            .await
            .unwrap();

        assert_eq!(note.id, NoteId::new("n1"));
    }

    #[tokio::test]
    async fn test_update_sends_partial_patch() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/notes/42"))
            .and(body_json(serde_json::json!({"content": "new body"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(
                {"id": 42, "title": "Kept", "content": "new body"}
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = NotesHttpClient::new(&server.uri());
        let req = UpdateNoteRequest {
            title: None,
            content: Some("new body".to_string()),
        };
        let note = client.update_note(&NoteId::new("42"), &req).await.unwrap();

        assert_eq!(note.title, "Kept");
        assert_eq!(note.content, "new body");
    }

    #[tokio::test]
    async fn test_delete_and_rebuild_acknowledgements() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/notes/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(
                {"message": "Note deleted successfully", "deleted_note_id": 3}
            )))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rebuild-index"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = NotesHttpClient::new(&server.uri());

        let ack = client.delete_note(&NoteId::new("3")).await.unwrap();
        assert_eq!(ack.deleted_note_id, Some(NoteId::new("3")));

        let ack = client.rebuild_index().await.unwrap();
        assert_eq!(ack, Acknowledgement::default());
    }

    #[tokio::test]
    async fn test_query_without_references() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_json(serde_json::json!({"question": "trees?", "k": 3})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"answer": "No relevant notes found."})),
            )
            .mount(&server)
            .await;

        let client = NotesHttpClient::new(&server.uri());
        let resp = client
            .query(&QueryRequest {
                question: "trees?".to_string(),
                k: Some(3),
            })
            .await
            .unwrap();

        assert_eq!(resp.answer, "No relevant notes found.");
        assert!(resp.references.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Note not found"))
            .mount(&server)
            .await;

        let client = NotesHttpClient::new(&server.uri());
        let err = client
            .update_note(&NoteId::new("9"), &UpdateNoteRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("Note not found"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notes"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = NotesHttpClient::new(&server.uri());
        let err = client.list_notes().await.unwrap_err();

        assert!(matches!(err, RemoteError::MalformedBody(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported() {
        // Nothing listens on port 9 of the loopback interface
        let client = NotesHttpClient::new("http://127.0.0.1:9");
        let err = client.health().await.unwrap_err();

        assert!(matches!(err, RemoteError::Transport(_)));
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(
                {"status": "healthy", "message": "Notes Assistant API is running"}
            )))
            .mount(&server)
            .await;

        let client = NotesHttpClient::new(&server.uri());
        assert!(client.health().await.unwrap().is_healthy());
    }
}
