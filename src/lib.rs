//! Streaming workflow client for the Foundry multi-agent backend.
//!
//! Opens a long-lived server-sent event stream, decodes it into typed
//! workflow events despite arbitrary network chunking and the backend's
//! assorted framing conventions, and reconstructs a consistent,
//! monotonic [`WorkflowResult`] that callers can observe incrementally
//! and read as a final value.
//!
//! # Example
//!
//! ```ignore
//! use foundry_client::{FoundryClient, StreamSession, WorkflowRequest};
//! use serde_json::json;
//!
//! let client = FoundryClient::with_base_url("http://localhost:8080".into());
//! let session = StreamSession::new(client);
//! let request = WorkflowRequest::new(
//!     "/v1/workflow/stream",
//!     json!({"query": "analyze my startup", "isStream": "true"}),
//! );
//!
//! let result = session
//!     .run_with_observer(request, |update| {
//!         println!("{}: {:.0}%", update.kind, update.snapshot.progress);
//!     })
//!     .await?;
//! ```

pub mod adapters;
pub mod client;
pub mod config;
pub mod models;
pub mod session;
pub mod sse;
pub mod traits;
pub mod workflow;

pub use client::{ClientError, FoundryClient, FrameStream, FOUNDRY_BASE_URL};
pub use config::SessionConfig;
pub use models::{
    RequestError, StepStatus, WorkflowRequest, WorkflowResult, WorkflowStatus, WorkflowStep,
};
pub use session::{SessionError, SessionUpdate, StreamSession};
pub use sse::WorkflowEvent;
pub use traits::TransportError;
pub use workflow::WorkflowStateMachine;
