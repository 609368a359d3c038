//! Payload deserialization structs for the workflow stream.
//!
//! Internal structs used to decode the JSON data payloads. Field names
//! vary across backend versions, so aliases are accepted liberally; a
//! payload that decodes to all-`None` is still valid and simply
//! contributes nothing.

use serde::Deserialize;
use serde_json::Value;

/// `start` payload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StartPayload {
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, Value>,
}

/// `progress` payload. The step may be inlined (`step` object) or
/// flattened at the root, and the percent has gone by several names.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProgressPayload {
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "percent", alias = "percentage")]
    pub progress: Option<f64>,
    #[serde(default)]
    pub step: Option<StepPayload>,
    #[serde(default, alias = "agentId")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub partial_content: Option<String>,
}

/// Step object nested inside progress/result payloads.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StepPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "agentId")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// `stream` payload: one incremental text chunk.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StreamPayload {
    #[serde(
        default,
        alias = "content",
        alias = "text",
        alias = "data",
        alias = "token"
    )]
    pub chunk: Option<String>,
    #[serde(default)]
    pub chunk_index: Option<u64>,
}

/// `stream_complete` payload: the final accumulated text.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StreamCompletePayload {
    #[serde(default, alias = "final_text", alias = "content")]
    pub final_content: Option<String>,
}

/// `result` payload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResultPayload {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, alias = "agentId")]
    pub agent_id: Option<String>,
}

/// `complete` payload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CompletePayload {
    #[serde(default)]
    pub message: Option<String>,
}

/// `error` payload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(default, alias = "message", alias = "detail")]
    pub error: Option<String>,
}
