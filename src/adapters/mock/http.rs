//! Mock HTTP transport for testing.
//!
//! Provides a configurable mock transport that can return canned
//! responses or scripted chunk sequences without network access.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::traits::{ByteStream, Headers, HttpClient, Response, TransportError};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method (GET or POST)
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body (for POST requests)
    pub body: Option<String>,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a canned response
    Success(Response),
    /// Fail the request itself
    Error(TransportError),
    /// Return a scripted chunk sequence; `Err` items surface as
    /// mid-stream transport failures, letting tests exercise abnormal
    /// closes at exact positions
    Stream(Vec<Result<Bytes, TransportError>>),
    /// Like `Stream`, but never closes after the scripted items:
    /// the connection stays open and silent (idle-timeout and
    /// cancellation tests)
    HangingStream(Vec<Result<Bytes, TransportError>>),
}

impl MockResponse {
    /// Convenience constructor: script a stream from plain text chunks.
    pub fn stream_chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MockResponse::Stream(
            chunks
                .into_iter()
                .map(|c| Ok(Bytes::from(c.into())))
                .collect(),
        )
    }
}

/// Mock HTTP transport.
///
/// Configure responses per URL (exact match) plus an optional default,
/// then hand the client to the code under test. Every request is
/// recorded for later verification.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    default_response: Arc<Mutex<Option<MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock transport with no configured responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response for a specific URL (matched exactly).
    pub fn set_response(&self, url: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        *self.default_response.lock().unwrap() = Some(response);
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record_request(&self, method: &str, url: &str, headers: &Headers, body: Option<String>) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
    }

    fn lookup(&self, url: &str) -> Option<MockResponse> {
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .or_else(|| self.default_response.lock().unwrap().clone())
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, TransportError> {
        self.record_request("GET", url, headers, None);

        match self.lookup(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Stream(_)) | Some(MockResponse::HangingStream(_)) => {
                Err(TransportError::Other(
                    "stream response configured for non-streaming request".to_string(),
                ))
            }
            None => Err(TransportError::ConnectionFailed(format!(
                "no mock response for {}",
                url
            ))),
        }
    }

    async fn post(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<Response, TransportError> {
        self.record_request("POST", url, headers, Some(body.to_string()));

        match self.lookup(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Stream(_)) | Some(MockResponse::HangingStream(_)) => {
                Err(TransportError::Other(
                    "stream response configured for non-streaming request".to_string(),
                ))
            }
            None => Err(TransportError::ConnectionFailed(format!(
                "no mock response for {}",
                url
            ))),
        }
    }

    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, TransportError> {
        self.record_request("POST", url, headers, Some(body.to_string()));

        match self.lookup(url) {
            Some(MockResponse::Stream(items)) => Ok(Box::pin(futures::stream::iter(items))),
            Some(MockResponse::HangingStream(items)) => Ok(Box::pin(
                futures::stream::iter(items).chain(futures::stream::pending()),
            )),
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Success(_)) => Err(TransportError::Other(
                "non-streaming response configured for streaming request".to_string(),
            )),
            None => Err(TransportError::ConnectionFailed(format!(
                "no mock response for {}",
                url
            ))),
        }
    }
}
