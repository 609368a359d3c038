//! HTTP transport trait abstraction.
//!
//! Provides a trait-based abstraction over the HTTP transport, enabling
//! dependency injection and mocking in tests. The streaming POST operation
//! is the backbone of the workflow stream: the session never touches a
//! socket directly, only this trait.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// A stream of raw transport chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// HTTP response wrapper for the non-streaming operations.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, body: Bytes) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// Create a new response with headers.
    pub fn with_headers(status: u16, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body as a string.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Parse the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Connection-level transport failure.
///
/// Fatal to the session that observes it: parsing and interpretation
/// anomalies are recovered locally, but a transport error always
/// terminates the read loop.
#[derive(Debug, Clone)]
pub enum TransportError {
    /// Connection could not be established
    ConnectionFailed(String),
    /// Request or stream read timed out
    Timeout(String),
    /// Server returned an error status
    ServerError { status: u16, message: String },
    /// The transport was abandoned by the caller
    Cancelled,
    /// Mid-stream IO failure (abnormal close)
    Io(String),
    /// Invalid URL
    InvalidUrl(String),
    /// Other transport error
    Other(String),
}

impl TransportError {
    /// Check if this failure is likely transient and worth a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectionFailed(_)
                | TransportError::Timeout(_)
                | TransportError::Io(_)
        ) || matches!(self, TransportError::ServerError { status, .. } if *status >= 500)
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            TransportError::Timeout(msg) => write!(f, "Transport timeout: {}", msg),
            TransportError::ServerError { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            TransportError::Cancelled => write!(f, "Transport cancelled"),
            TransportError::Io(msg) => write!(f, "IO error: {}", msg),
            TransportError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            TransportError::Other(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Trait for HTTP transport operations.
///
/// Implementations include the production reqwest-based client and a
/// scriptable mock for tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request.
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, TransportError>;

    /// Perform a POST request with a JSON body.
    async fn post(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<Response, TransportError>;

    /// Perform a POST request and return the response body as a stream
    /// of chunks.
    ///
    /// This is the entry point for server-sent event streams: the body
    /// arrives incrementally, fragmented however the network chooses.
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, TransportError>;
}
