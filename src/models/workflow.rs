//! Workflow domain state.
//!
//! `WorkflowResult` is the observable state one session reconstructs
//! from the stream: overall status, monotonic percent-complete, the
//! ordered step list, and the accumulated agent text. Serialization
//! matches the backend's wire shape (camelCase steps, kebab-case step
//! statuses) so snapshots round-trip through the surrounding services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Workflow-level lifecycle status. Terminal once `Completed`/`Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl WorkflowStatus {
    /// Whether this status absorbs all further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Failed)
    }
}

/// Per-step lifecycle status.
///
/// Ordered: `Waiting < InProgress < {Completed, Failed}`. Transitions
/// are monotonic; a step never moves backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    Waiting,
    InProgress,
    Completed,
    Failed,
}

impl StepStatus {
    /// Monotonic rank; equal-rank re-application is a no-op.
    pub fn rank(&self) -> u8 {
        match self {
            StepStatus::Waiting => 0,
            StepStatus::InProgress => 1,
            StepStatus::Completed | StepStatus::Failed => 2,
        }
    }

    /// Whether the step has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        self.rank() == 2
    }
}

/// One agent sub-task within a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    /// Step identifier, assigned by the backend or synthesized locally.
    pub id: String,
    /// The agent executing this step.
    pub agent_id: String,
    /// Human-readable description of what the step is doing.
    pub description: String,
    /// Current status; transitions monotonically.
    pub status: StepStatus,
    /// When the step was first seen.
    pub started_at: DateTime<Utc>,
    /// When the step reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Accumulated step output (progress text and/or result payload).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl WorkflowStep {
    /// Create a step in `Waiting` status.
    pub fn new(id: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agent_id: agent_id.into(),
            description: String::new(),
            status: StepStatus::Waiting,
            started_at: Utc::now(),
            ended_at: None,
            result: None,
        }
    }

    /// Apply a status monotonically.
    ///
    /// Downgrades and same-rank re-applications are silently ignored:
    /// `completed` can never be overwritten by `in-progress`, and a
    /// second terminal status is a no-op rather than an error.
    pub fn apply_status(&mut self, status: StepStatus) {
        if status.rank() <= self.status.rank() {
            return;
        }
        self.status = status;
        if status.is_terminal() && self.ended_at.is_none() {
            self.ended_at = Some(Utc::now());
        }
    }

    /// Append descriptive text to the step's running result.
    pub fn append_result_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match &mut self.result {
            Some(Value::String(existing)) => {
                if !existing.is_empty() {
                    existing.push('\n');
                }
                existing.push_str(text);
            }
            Some(_) => {
                // A structured result already landed; descriptive text
                // never overwrites it.
            }
            None => self.result = Some(Value::String(text.to_string())),
        }
    }
}

/// The reconstructed state of one workflow session.
///
/// Owned exclusively by the session's state machine; observers and the
/// final caller receive owned clones, never the live instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult {
    /// Workflow identifier for this session.
    pub id: String,
    /// Overall lifecycle status.
    pub status: WorkflowStatus,
    /// Percent-complete in `[0, 100]`, non-decreasing over a session.
    pub progress: f64,
    /// Steps ordered by first appearance; never removed.
    pub steps: Vec<WorkflowStep>,
    /// Per-agent result payloads.
    pub results: BTreeMap<String, Value>,
    /// Concatenated streamed/unclassified text.
    pub accumulated_text: String,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// When the workflow reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Failure description, when `status == Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowResult {
    /// Create a pending result with the given workflow id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: WorkflowStatus::Pending,
            progress: 0.0,
            steps: Vec::new(),
            results: BTreeMap::new(),
            accumulated_text: String::new(),
            started_at: Utc::now(),
            ended_at: None,
            error: None,
        }
    }

    /// Look up a step by id.
    pub fn step(&self, id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Whether the workflow has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_status_terminal() {
        assert!(!WorkflowStatus::Pending.is_terminal());
        assert!(!WorkflowStatus::Running.is_terminal());
        assert!(WorkflowStatus::Completed.is_terminal());
        assert!(WorkflowStatus::Failed.is_terminal());
    }

    #[test]
    fn test_step_status_ranks() {
        assert!(StepStatus::Waiting.rank() < StepStatus::InProgress.rank());
        assert!(StepStatus::InProgress.rank() < StepStatus::Completed.rank());
        assert_eq!(StepStatus::Completed.rank(), StepStatus::Failed.rank());
    }

    #[test]
    fn test_step_apply_status_forward() {
        let mut step = WorkflowStep::new("s1", "canvas_agent");
        step.apply_status(StepStatus::InProgress);
        assert_eq!(step.status, StepStatus::InProgress);
        assert!(step.ended_at.is_none());

        step.apply_status(StepStatus::Completed);
        assert_eq!(step.status, StepStatus::Completed);
        assert!(step.ended_at.is_some());
    }

    #[test]
    fn test_step_apply_status_never_regresses() {
        let mut step = WorkflowStep::new("s1", "canvas_agent");
        step.apply_status(StepStatus::Completed);
        let ended = step.ended_at;

        step.apply_status(StepStatus::InProgress);
        assert_eq!(step.status, StepStatus::Completed);

        step.apply_status(StepStatus::Waiting);
        assert_eq!(step.status, StepStatus::Completed);

        // Re-applying a terminal status is a no-op, not an error.
        step.apply_status(StepStatus::Failed);
        assert_eq!(step.status, StepStatus::Completed);
        assert_eq!(step.ended_at, ended);
    }

    #[test]
    fn test_step_append_result_text() {
        let mut step = WorkflowStep::new("s1", "swot_agent");
        step.append_result_text("first");
        step.append_result_text("second");
        assert_eq!(
            step.result,
            Some(Value::String("first\nsecond".to_string()))
        );

        step.append_result_text("");
        assert_eq!(
            step.result,
            Some(Value::String("first\nsecond".to_string()))
        );
    }

    #[test]
    fn test_step_text_never_overwrites_structured_result() {
        let mut step = WorkflowStep::new("s1", "swot_agent");
        step.result = Some(serde_json::json!({"score": 4}));
        step.append_result_text("late text");
        assert_eq!(step.result, Some(serde_json::json!({"score": 4})));
    }

    #[test]
    fn test_workflow_result_new() {
        let result = WorkflowResult::new("wf-1");
        assert_eq!(result.id, "wf-1");
        assert_eq!(result.status, WorkflowStatus::Pending);
        assert_eq!(result.progress, 0.0);
        assert!(result.steps.is_empty());
        assert!(result.accumulated_text.is_empty());
        assert!(!result.is_terminal());
    }

    #[test]
    fn test_step_lookup() {
        let mut result = WorkflowResult::new("wf-1");
        result.steps.push(WorkflowStep::new("s1", "a"));
        result.steps.push(WorkflowStep::new("s2", "b"));
        assert_eq!(result.step("s2").unwrap().agent_id, "b");
        assert!(result.step("s3").is_none());
    }

    #[test]
    fn test_serialization_wire_shape() {
        let mut result = WorkflowResult::new("wf-1");
        let mut step = WorkflowStep::new("s1", "canvas_agent");
        step.apply_status(StepStatus::InProgress);
        result.steps.push(step);
        result.status = WorkflowStatus::Running;

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["steps"][0]["agentId"], "canvas_agent");
        assert_eq!(json["steps"][0]["status"], "in-progress");
        assert!(json["steps"][0].get("endedAt").is_none());
        assert_eq!(json["accumulatedText"], "");

        let back: WorkflowResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
