//! Event interpretation: `(event_type, data)` to a typed [`WorkflowEvent`].
//!
//! Classification order:
//! 1. end-of-stream sentinels (`[DONE]`, `DONE`, bare `done`/`complete`)
//! 2. heartbeats (empty data or the keepalive sentinels)
//! 3. structured decode of a complete JSON object/array, discriminated
//!    by the payload's `type` field (the framing event type is the
//!    fallback discriminant)
//! 4. everything else degrades to `Unclassified` raw text
//!
//! Decode failures on text that looked structurally complete are
//! recovered locally: logged at debug, carried forward as raw text,
//! never fatal.

use serde_json::Value;

use super::events::WorkflowEvent;
use super::payloads::{
    CompletePayload, ErrorPayload, ProgressPayload, ResultPayload, StartPayload,
    StreamCompletePayload, StreamPayload,
};

/// End-of-stream sentinels seen across backend versions.
const DONE_SENTINELS: &[&str] = &["[DONE]", "DONE"];

/// Keepalive sentinels: the backend's SSE utility emits a literal
/// `heartbeat` data line; older gateways sent `ping`.
const HEARTBEAT_SENTINELS: &[&str] = &["heartbeat", "ping"];

/// Classify one parsed frame into a domain event.
pub fn interpret(event_type: &str, data: &str) -> WorkflowEvent {
    let data = data.trim();

    if DONE_SENTINELS.contains(&data) {
        return WorkflowEvent::Done;
    }
    if matches!(event_type, "done" | "complete")
        && (data.is_empty() || DONE_SENTINELS.contains(&data))
    {
        return WorkflowEvent::Done;
    }

    if data.is_empty() || HEARTBEAT_SENTINELS.contains(&data) {
        return WorkflowEvent::Heartbeat;
    }
    if matches!(event_type, "heartbeat" | "ping") {
        return WorkflowEvent::Heartbeat;
    }

    if looks_structured(data) {
        match serde_json::from_str::<Value>(data) {
            Ok(value) => return interpret_structured(event_type, data, value),
            Err(err) => {
                // Structurally complete but undecodable: recovered by
                // falling through to raw-text accumulation.
                tracing::debug!(%err, "frame payload looked structured but failed to decode");
            }
        }
    }

    WorkflowEvent::Unclassified {
        text: data.to_string(),
    }
}

/// A payload is worth a structured decode attempt when it is a
/// syntactically complete object or array.
fn looks_structured(data: &str) -> bool {
    (data.starts_with('{') && data.ends_with('}'))
        || (data.starts_with('[') && data.ends_with(']'))
}

fn interpret_structured(event_type: &str, raw: &str, value: Value) -> WorkflowEvent {
    // The embedded discriminant wins over the framing event type: the
    // backend kept the `type` field accurate through both conventions.
    let discriminant = value
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| event_type.to_string());

    let decoded = match discriminant.as_str() {
        "start" => decode_start(&value),
        "progress" => decode_progress(&value),
        "stream" | "chunk" | "delta" => decode_stream(&value),
        "stream_complete" => decode_stream_complete(&value),
        "result" => decode_result(&value),
        "complete" => decode_complete(&value),
        "error" => decode_error(&value),
        "heartbeat" | "ping" => Some(WorkflowEvent::Heartbeat),
        "done" => Some(WorkflowEvent::Done),
        other => {
            tracing::debug!(kind = other, "unrecognized event discriminant");
            None
        }
    };

    decoded.unwrap_or_else(|| WorkflowEvent::Unclassified {
        text: raw.to_string(),
    })
}

fn decode_start(value: &Value) -> Option<WorkflowEvent> {
    let mut value = value.clone();
    if let Some(map) = value.as_object_mut() {
        map.remove("type");
    }
    let payload: StartPayload = serde_json::from_value(value).ok()?;
    Some(WorkflowEvent::Start {
        message: payload.message,
        metadata: payload.metadata,
    })
}

fn decode_progress(value: &Value) -> Option<WorkflowEvent> {
    let payload: ProgressPayload = serde_json::from_value(value.clone()).ok()?;

    let (step_id, step_agent, step_description) = match payload.step {
        Some(step) => (step.id, step.agent_id, step.description),
        None => (None, None, None),
    };

    // Progress percents are clamped on entry so the state machine only
    // ever sees values in range.
    let percent = payload.progress.map(|p| p.clamp(0.0, 100.0));

    let description = step_description.or_else(|| match (payload.stage, payload.message) {
        (Some(stage), Some(message)) => Some(format!("[{}] {}", stage, message)),
        (Some(stage), None) => Some(stage),
        (None, Some(message)) => Some(message),
        (None, None) => payload.partial_content,
    });

    Some(WorkflowEvent::Progress {
        step_id,
        agent_id: step_agent.or(payload.agent_id),
        description,
        percent,
    })
}

fn decode_stream(value: &Value) -> Option<WorkflowEvent> {
    let payload: StreamPayload = serde_json::from_value(value.clone()).ok()?;
    Some(WorkflowEvent::StreamChunk {
        text: payload.chunk.unwrap_or_default(),
    })
}

fn decode_stream_complete(value: &Value) -> Option<WorkflowEvent> {
    let payload: StreamCompletePayload = serde_json::from_value(value.clone()).ok()?;
    Some(WorkflowEvent::StreamComplete {
        text: payload.final_content,
    })
}

fn decode_result(value: &Value) -> Option<WorkflowEvent> {
    let payload: ResultPayload = serde_json::from_value(value.clone()).ok()?;
    Some(WorkflowEvent::Result {
        agent_id: payload.agent_id,
        data: payload.data.unwrap_or(Value::Null),
    })
}

fn decode_complete(value: &Value) -> Option<WorkflowEvent> {
    let payload: CompletePayload = serde_json::from_value(value.clone()).ok()?;
    Some(WorkflowEvent::Complete {
        message: payload.message,
    })
}

fn decode_error(value: &Value) -> Option<WorkflowEvent> {
    let payload: ErrorPayload = serde_json::from_value(value.clone()).ok()?;
    Some(WorkflowEvent::Error {
        message: payload
            .error
            .unwrap_or_else(|| "unknown backend error".to_string()),
    })
}
