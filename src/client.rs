//! Foundry API client for backend communication.
//!
//! The HTTP client for the Foundry multi-agent backend: opening the
//! workflow event stream, the non-streaming execution fallback, and the
//! health check. Transport is injected via the [`HttpClient`] trait so
//! everything here is testable against a scripted mock.

use futures_util::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;

use crate::adapters::ReqwestHttpClient;
use crate::models::{WorkflowRequest, WorkflowResult, WorkflowStatus, WorkflowStep};
use crate::sse::{Frame, FrameBuffer};
use crate::traits::{ByteStream, Headers, HttpClient, TransportError};

/// Default base URL for a locally running backend.
pub const FOUNDRY_BASE_URL: &str = "http://localhost:8080";

/// A finite stream of frames decoded from one workflow response.
///
/// Ends when the transport closes; not restartable.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame, TransportError>> + Send>>;

/// Error type for client operations.
#[derive(Debug)]
pub enum ClientError {
    /// Transport-level failure
    Transport(TransportError),
    /// Response body was not the expected JSON
    Json(serde_json::Error),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Transport(e) => write!(f, "Transport error: {}", e),
            ClientError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Transport(e) => Some(e),
            ClientError::Json(e) => Some(e),
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        ClientError::Transport(e)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Json(e)
    }
}

/// Client for the Foundry backend API.
pub struct FoundryClient {
    /// Base URL for the backend
    base_url: String,
    /// Injected transport
    http: Arc<dyn HttpClient>,
}

impl FoundryClient {
    /// Create a client with the default base URL and the production
    /// reqwest transport.
    pub fn new() -> Self {
        Self::with_base_url(FOUNDRY_BASE_URL.to_string())
    }

    /// Create a client with a custom base URL.
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            base_url,
            http: Arc::new(ReqwestHttpClient::new()),
        }
    }

    /// Create a client with a custom transport (tests inject the mock
    /// through here).
    pub fn with_transport(base_url: String, http: Arc<dyn HttpClient>) -> Self {
        Self { base_url, http }
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Open the workflow event stream for a request.
    ///
    /// Sends the request with `Accept: text/event-stream` and returns a
    /// finite stream of frames: transport chunks are buffered and
    /// sliced on the blank-line terminator, so a frame is only ever
    /// yielded whole, no matter how the network fragmented it. When the
    /// transport closes cleanly any unterminated trailing block is
    /// flushed as a final frame.
    pub async fn open_stream(
        &self,
        request: &WorkflowRequest,
    ) -> Result<FrameStream, TransportError> {
        let url = format!("{}{}", self.base_url, request.endpoint);
        let headers = Self::stream_headers();

        tracing::debug!(%url, "opening workflow stream");
        let bytes = self.http.post_stream(&url, &request.body_string(), &headers).await?;

        struct State {
            bytes: ByteStream,
            buffer: FrameBuffer,
            pending: VecDeque<Frame>,
            done: bool,
        }

        let frames = stream::unfold(
            State {
                bytes,
                buffer: FrameBuffer::new(),
                pending: VecDeque::new(),
                done: false,
            },
            |mut st| async move {
                loop {
                    if let Some(frame) = st.pending.pop_front() {
                        return Some((Ok(frame), st));
                    }
                    if st.done {
                        // Clean close: flush a trailing unterminated
                        // frame, then end the sequence.
                        return st.buffer.finish().map(|frame| (Ok(frame), st));
                    }

                    match st.bytes.next().await {
                        Some(Ok(chunk)) => {
                            st.pending.extend(st.buffer.push_bytes(&chunk));
                        }
                        Some(Err(e)) => {
                            st.done = true;
                            return Some((Err(e), st));
                        }
                        None => {
                            st.done = true;
                        }
                    }
                }
            },
        );

        Ok(Box::pin(frames))
    }

    /// Execute a workflow without streaming.
    ///
    /// Fallback path for callers that do not need incremental updates:
    /// the backend runs the whole workflow and returns one JSON body,
    /// which is converted into a completed single-step result.
    pub async fn execute(
        &self,
        request: &WorkflowRequest,
        workflow_id: &str,
    ) -> Result<WorkflowResult, ClientError> {
        let url = format!("{}{}", self.base_url, request.endpoint);
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let response = self.http.post(&url, &request.body_string(), &headers).await?;
        if !response.is_success() {
            return Err(ClientError::Transport(TransportError::ServerError {
                status: response.status,
                message: response.text().unwrap_or_else(|_| "Unknown error".to_string()),
            }));
        }

        let body: serde_json::Value = response.json()?;
        Ok(convert_response(workflow_id, body))
    }

    /// Check if the backend is healthy and reachable.
    pub async fn health_check(&self) -> Result<bool, TransportError> {
        let url = format!("{}/health", self.base_url);
        let response = self.http.get(&url, &Headers::new()).await?;
        Ok(response.is_success())
    }

    fn stream_headers() -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "text/event-stream".to_string());
        headers
    }
}

impl Default for FoundryClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a non-streaming response body into a completed result.
fn convert_response(workflow_id: &str, body: serde_json::Value) -> WorkflowResult {
    let mut result = WorkflowResult::new(workflow_id);
    result.status = WorkflowStatus::Completed;
    result.progress = 100.0;
    result.ended_at = Some(chrono::Utc::now());

    let mut step = WorkflowStep::new(format!("{}-step", workflow_id), "multi_agent");
    step.description = "Workflow executed without streaming".to_string();
    step.apply_status(crate::models::StepStatus::InProgress);
    step.apply_status(crate::models::StepStatus::Completed);
    step.result = Some(body.clone());
    result.steps.push(step);

    result.results.insert("default".to_string(), body);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockHttpClient, MockResponse};
    use crate::traits::Response;
    use bytes::Bytes;
    use serde_json::json;

    fn request() -> WorkflowRequest {
        WorkflowRequest::new("/v1/workflow/stream", json!({"query": "analyze"}))
    }

    fn client_with_mock(mock: MockHttpClient) -> FoundryClient {
        FoundryClient::with_transport("http://test".to_string(), Arc::new(mock))
    }

    #[test]
    fn test_client_base_url() {
        let client = FoundryClient::new();
        assert_eq!(client.base_url(), FOUNDRY_BASE_URL);

        let client = FoundryClient::with_base_url("http://backend:9000".to_string());
        assert_eq!(client.base_url(), "http://backend:9000");
    }

    #[test]
    fn test_client_error_display_and_source() {
        let err = ClientError::Transport(TransportError::Cancelled);
        assert!(err.to_string().contains("cancelled"));
        assert!(std::error::Error::source(&err).is_some());

        let json_err = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let err: ClientError = json_err.into();
        assert!(matches!(err, ClientError::Json(_)));
    }

    #[tokio::test]
    async fn test_open_stream_sends_sse_headers() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://test/v1/workflow/stream",
            MockResponse::stream_chunks(["data: [DONE]\n\n"]),
        );
        let client = client_with_mock(mock.clone());

        let _ = client.open_stream(&request()).await.unwrap();

        let recorded = mock.requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(
            recorded[0].headers.get("Accept"),
            Some(&"text/event-stream".to_string())
        );
        assert_eq!(recorded[0].body.as_deref(), Some(r#"{"query":"analyze"}"#));
    }

    #[tokio::test]
    async fn test_open_stream_yields_frames() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://test/v1/workflow/stream",
            MockResponse::stream_chunks(["event: start\ndata: {}\n\nda", "ta: [DONE]\n\n"]),
        );
        let client = client_with_mock(mock);

        let mut frames = client.open_stream(&request()).await.unwrap();
        let first = frames.next().await.unwrap().unwrap();
        assert_eq!(first.as_str(), "event: start\ndata: {}");
        let second = frames.next().await.unwrap().unwrap();
        assert_eq!(second.as_str(), "data: [DONE]");
        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn test_open_stream_flushes_trailing_frame() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://test/v1/workflow/stream",
            MockResponse::stream_chunks(["data: a\n\ndata: unterminated"]),
        );
        let client = client_with_mock(mock);

        let mut frames = client.open_stream(&request()).await.unwrap();
        assert_eq!(frames.next().await.unwrap().unwrap().as_str(), "data: a");
        assert_eq!(
            frames.next().await.unwrap().unwrap().as_str(),
            "data: unterminated"
        );
        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn test_open_stream_surfaces_mid_stream_error() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://test/v1/workflow/stream",
            MockResponse::Stream(vec![
                Ok(Bytes::from("data: a\n\n")),
                Err(TransportError::Io("reset".to_string())),
            ]),
        );
        let client = client_with_mock(mock);

        let mut frames = client.open_stream(&request()).await.unwrap();
        assert!(frames.next().await.unwrap().is_ok());
        assert!(matches!(
            frames.next().await.unwrap(),
            Err(TransportError::Io(_))
        ));
        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn test_execute_converts_response() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://test/v1/workflow/execute",
            MockResponse::Success(Response::new(
                200,
                Bytes::from(r#"{"analysis": "looks promising"}"#),
            )),
        );
        let client = client_with_mock(mock);

        let request = WorkflowRequest::new("/v1/workflow/execute", json!({"query": "q"}));
        let result = client.execute(&request, "wf-9").await.unwrap();

        assert_eq!(result.id, "wf-9");
        assert_eq!(result.status, WorkflowStatus::Completed);
        assert_eq!(result.progress, 100.0);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].agent_id, "multi_agent");
        assert_eq!(
            result.results.get("default").unwrap()["analysis"],
            "looks promising"
        );
    }

    #[tokio::test]
    async fn test_execute_server_error() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://test/v1/workflow/execute",
            MockResponse::Success(Response::new(500, Bytes::from("boom"))),
        );
        let client = client_with_mock(mock);

        let request = WorkflowRequest::new("/v1/workflow/execute", json!({}));
        let err = client.execute(&request, "wf-9").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Transport(TransportError::ServerError { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_execute_invalid_json_body() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://test/v1/workflow/execute",
            MockResponse::Success(Response::new(200, Bytes::from("not json"))),
        );
        let client = client_with_mock(mock);

        let request = WorkflowRequest::new("/v1/workflow/execute", json!({}));
        let err = client.execute(&request, "wf-9").await.unwrap_err();
        assert!(matches!(err, ClientError::Json(_)));
    }

    #[tokio::test]
    async fn test_health_check() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://test/health",
            MockResponse::Success(Response::new(200, Bytes::from("ok"))),
        );
        let client = client_with_mock(mock);
        assert!(client.health_check().await.unwrap());

        let mock = MockHttpClient::new();
        mock.set_response(
            "http://test/health",
            MockResponse::Success(Response::new(503, Bytes::new())),
        );
        let client = client_with_mock(mock);
        assert!(!client.health_check().await.unwrap());
    }
}
