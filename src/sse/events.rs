//! Domain events decoded from the workflow stream.
//!
//! `WorkflowEvent` is the closed set of everything the backend can say.
//! New upstream event kinds must be added here and handled exhaustively
//! in the interpreter and the state machine; unknown payloads degrade
//! to [`WorkflowEvent::Unclassified`] rather than a silent fallthrough.

use serde_json::Value;

/// A classified, immutable unit of meaning extracted from one frame.
///
/// Created by the interpreter, consumed exactly once by the state
/// machine (and, optionally, reported to the session observer).
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    /// The workflow started; carries free-form start metadata.
    Start {
        message: Option<String>,
        metadata: serde_json::Map<String, Value>,
    },
    /// A step made progress.
    Progress {
        step_id: Option<String>,
        agent_id: Option<String>,
        description: Option<String>,
        /// Overall percent-complete, already clamped to `[0, 100]`.
        /// Absent when the backend sent no numeric progress.
        percent: Option<f64>,
    },
    /// Incremental text produced by the active agent.
    StreamChunk { text: String },
    /// The backend finished streaming text and supplied the final form.
    StreamComplete { text: Option<String> },
    /// A step produced its result payload.
    Result {
        agent_id: Option<String>,
        data: Value,
    },
    /// The whole workflow completed.
    Complete { message: Option<String> },
    /// The backend reported a failure.
    Error { message: String },
    /// Keepalive noise; dropped before it reaches the state machine's
    /// observers.
    Heartbeat,
    /// End-of-stream sentinel (`[DONE]` and friends).
    Done,
    /// A payload the interpreter could not classify; the raw text is
    /// carried forward for accumulation.
    Unclassified { text: String },
}

impl WorkflowEvent {
    /// The event kind name, for logging and observer callbacks.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowEvent::Start { .. } => "start",
            WorkflowEvent::Progress { .. } => "progress",
            WorkflowEvent::StreamChunk { .. } => "stream",
            WorkflowEvent::StreamComplete { .. } => "stream_complete",
            WorkflowEvent::Result { .. } => "result",
            WorkflowEvent::Complete { .. } => "complete",
            WorkflowEvent::Error { .. } => "error",
            WorkflowEvent::Heartbeat => "heartbeat",
            WorkflowEvent::Done => "done",
            WorkflowEvent::Unclassified { .. } => "unclassified",
        }
    }

    /// Whether this event is keepalive noise with no domain meaning.
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, WorkflowEvent::Heartbeat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_names() {
        assert_eq!(
            WorkflowEvent::Start {
                message: None,
                metadata: serde_json::Map::new(),
            }
            .kind(),
            "start"
        );
        assert_eq!(
            WorkflowEvent::StreamChunk {
                text: "".to_string()
            }
            .kind(),
            "stream"
        );
        assert_eq!(WorkflowEvent::Heartbeat.kind(), "heartbeat");
        assert_eq!(WorkflowEvent::Done.kind(), "done");
        assert_eq!(
            WorkflowEvent::Unclassified {
                text: "".to_string()
            }
            .kind(),
            "unclassified"
        );
    }

    #[test]
    fn test_is_heartbeat() {
        assert!(WorkflowEvent::Heartbeat.is_heartbeat());
        assert!(!WorkflowEvent::Done.is_heartbeat());
    }
}
