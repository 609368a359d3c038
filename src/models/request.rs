//! Workflow request descriptor.
//!
//! The request is an opaque HTTP-style call descriptor: the endpoint
//! path on the backend plus a JSON body. Building the body (query,
//! agent selection, output style, ...) is the caller's concern; the
//! session only validates the descriptor and puts it on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Programmer errors in a request descriptor.
///
/// These fail the session immediately, before the read loop starts.
/// This is the only condition under which a caller sees an `Err`
/// instead of a `WorkflowResult`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request endpoint is empty")]
    EmptyEndpoint,
    #[error("request endpoint must be a path starting with '/', got '{0}'")]
    NotAPath(String),
    #[error("request body must be a JSON object, got {0}")]
    BodyNotAnObject(&'static str),
}

/// Call descriptor for one workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRequest {
    /// Endpoint path on the backend, e.g. `/v1/workflow/stream`.
    pub endpoint: String,
    /// JSON request body, passed through verbatim.
    pub body: Value,
}

impl WorkflowRequest {
    /// Create a request descriptor.
    pub fn new(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            endpoint: endpoint.into(),
            body,
        }
    }

    /// Validate the descriptor.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.endpoint.is_empty() {
            return Err(RequestError::EmptyEndpoint);
        }
        if !self.endpoint.starts_with('/') {
            return Err(RequestError::NotAPath(self.endpoint.clone()));
        }
        if !self.body.is_object() {
            return Err(RequestError::BodyNotAnObject(json_type_name(&self.body)));
        }
        Ok(())
    }

    /// The serialized body for the wire.
    pub fn body_string(&self) -> String {
        self.body.to_string()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_request() {
        let request = WorkflowRequest::new(
            "/v1/workflow/stream",
            json!({"query": "analyze my startup", "isStream": "true"}),
        );
        assert!(request.validate().is_ok());
        assert!(request.body_string().contains("analyze my startup"));
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let request = WorkflowRequest::new("", json!({}));
        assert_eq!(request.validate(), Err(RequestError::EmptyEndpoint));
    }

    #[test]
    fn test_non_path_endpoint_rejected() {
        let request = WorkflowRequest::new("v1/stream", json!({}));
        assert_eq!(
            request.validate(),
            Err(RequestError::NotAPath("v1/stream".to_string()))
        );
    }

    #[test]
    fn test_non_object_body_rejected() {
        let request = WorkflowRequest::new("/v1/stream", json!("just a string"));
        assert_eq!(
            request.validate(),
            Err(RequestError::BodyNotAnObject("a string"))
        );

        let request = WorkflowRequest::new("/v1/stream", json!([1, 2]));
        assert_eq!(
            request.validate(),
            Err(RequestError::BodyNotAnObject("an array"))
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RequestError::EmptyEndpoint.to_string(),
            "request endpoint is empty"
        );
        assert!(RequestError::NotAPath("x".to_string())
            .to_string()
            .contains("'x'"));
    }

    #[test]
    fn test_request_serde_round_trip() {
        let request = WorkflowRequest::new("/v1/workflow/stream", json!({"query": "q"}));
        let json = serde_json::to_string(&request).unwrap();
        let back: WorkflowRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
