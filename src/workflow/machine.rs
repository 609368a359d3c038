//! Workflow state reconstruction.
//!
//! `WorkflowStateMachine` owns the authoritative [`WorkflowResult`] for
//! one session and applies each decoded event as a state transition.
//! The rules it enforces, regardless of what the stream says:
//!
//! - workflow status only moves `pending -> running -> {completed|failed}`
//!   and terminal states absorb every later event
//! - step statuses never regress
//! - percent-complete never decreases
//!
//! The machine is a plain constructor-injected value: no globals, no
//! shared registries, snapshots handed out by clone.

use serde_json::Value;
use uuid::Uuid;

use crate::models::{StepStatus, WorkflowResult, WorkflowStatus, WorkflowStep};
use crate::sse::WorkflowEvent;

/// Step id used to surface unclassified payload text as forward motion.
const RAW_OUTPUT_STEP_ID: &str = "raw-output";

/// Applies decoded events to a [`WorkflowResult`].
#[derive(Debug)]
pub struct WorkflowStateMachine {
    result: WorkflowResult,
    /// Id of the most recently active step; the target for
    /// `result`/`complete`/`error` transitions.
    active_step: Option<String>,
    /// Free-form metadata merged from `start` events.
    start_metadata: serde_json::Map<String, Value>,
}

impl WorkflowStateMachine {
    /// Create a machine with a generated workflow id.
    pub fn new() -> Self {
        Self::with_id(format!("wf-{}", Uuid::new_v4()))
    }

    /// Create a machine for a caller-assigned workflow id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            result: WorkflowResult::new(id),
            active_step: None,
            start_metadata: serde_json::Map::new(),
        }
    }

    /// The live result owned by this machine.
    pub fn result(&self) -> &WorkflowResult {
        &self.result
    }

    /// Metadata merged from `start` events.
    pub fn start_metadata(&self) -> &serde_json::Map<String, Value> {
        &self.start_metadata
    }

    /// An owned immutable snapshot for observers.
    pub fn snapshot(&self) -> WorkflowResult {
        self.result.clone()
    }

    /// Consume the machine, yielding the final result.
    pub fn into_result(self) -> WorkflowResult {
        self.result
    }

    /// Apply one event.
    ///
    /// Once the workflow is terminal every further event is absorbed
    /// without effect, which makes repeated `complete`/`done` signals
    /// idempotent by construction.
    pub fn apply(&mut self, event: &WorkflowEvent) {
        if self.result.is_terminal() {
            return;
        }

        match event {
            WorkflowEvent::Heartbeat => {}

            WorkflowEvent::Start { message, metadata } => {
                self.ensure_running();
                for (key, value) in metadata {
                    self.start_metadata.insert(key.clone(), value.clone());
                }
                if let Some(message) = message {
                    tracing::debug!(%message, workflow = %self.result.id, "workflow started");
                }
            }

            WorkflowEvent::Progress {
                step_id,
                agent_id,
                description,
                percent,
            } => {
                self.ensure_running();
                let id = self.resolve_step_id(step_id.clone(), agent_id.clone());
                let step = self.upsert_step(&id, agent_id.as_deref());
                step.apply_status(StepStatus::InProgress);
                if let Some(description) = description {
                    if !description.is_empty() {
                        step.description = description.clone();
                        step.append_result_text(description);
                    }
                }
                self.active_step = Some(id);
                if let Some(percent) = percent {
                    self.raise_progress(*percent);
                }
            }

            WorkflowEvent::StreamChunk { text } => {
                self.ensure_running();
                self.result.accumulated_text.push_str(text);
            }

            WorkflowEvent::StreamComplete { text } => {
                self.ensure_running();
                if let Some(text) = text {
                    if !text.is_empty() {
                        self.result.accumulated_text = text.clone();
                    }
                }
            }

            WorkflowEvent::Result { agent_id, data } => {
                self.ensure_running();
                if let Some(id) = self.active_step.clone() {
                    if let Some(step) = self.step_mut(&id) {
                        step.apply_status(StepStatus::Completed);
                        if !data.is_null() {
                            step.result = Some(data.clone());
                        }
                    }
                }
                if !data.is_null() {
                    let key = agent_id
                        .clone()
                        .or_else(|| self.active_agent_id())
                        .unwrap_or_else(|| "default".to_string());
                    self.result.results.insert(key, data.clone());
                }
            }

            WorkflowEvent::Complete { message } => {
                self.ensure_running();
                if let Some(message) = message {
                    tracing::debug!(%message, workflow = %self.result.id, "workflow complete");
                }
                self.complete_active_step();
                self.result.status = WorkflowStatus::Completed;
                self.result.progress = 100.0;
                self.stamp_ended();
            }

            WorkflowEvent::Error { message } => {
                self.ensure_running();
                if let Some(id) = self.active_step.clone() {
                    if let Some(step) = self.step_mut(&id) {
                        step.apply_status(StepStatus::Failed);
                    }
                }
                self.result.status = WorkflowStatus::Failed;
                self.result.error = Some(message.clone());
                self.stamp_ended();
            }

            WorkflowEvent::Done => {
                self.finalize();
            }

            WorkflowEvent::Unclassified { text } => {
                self.ensure_running();
                if !self.result.accumulated_text.is_empty() {
                    self.result.accumulated_text.push('\n');
                }
                self.result.accumulated_text.push_str(text);

                // Surface the raw payload as a synthetic step so
                // observers see forward motion even for output the
                // interpreter could not classify.
                let step = self.upsert_step(RAW_OUTPUT_STEP_ID, Some("unknown"));
                if step.description.is_empty() {
                    step.description = "Unrecognized backend output".to_string();
                }
                step.apply_status(StepStatus::InProgress);
                step.append_result_text(text);
                if self.active_step.is_none() {
                    self.active_step = Some(RAW_OUTPUT_STEP_ID.to_string());
                }
            }
        }
    }

    /// Safety-net transition: force a terminal state at end-of-stream.
    ///
    /// Promotes `pending` as well as `running` so heartbeat-only
    /// streams still end `completed`.
    pub fn finalize(&mut self) {
        if self.result.is_terminal() {
            return;
        }
        self.complete_active_step();
        self.result.status = WorkflowStatus::Completed;
        self.result.progress = 100.0;
        self.stamp_ended();
    }

    /// Mark the workflow failed without touching step state.
    ///
    /// Used for session-level failures (transport loss, cancellation):
    /// partial step and progress state is preserved as-is.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.result.is_terminal() {
            return;
        }
        self.result.status = WorkflowStatus::Failed;
        self.result.error = Some(error.into());
        self.stamp_ended();
    }

    fn ensure_running(&mut self) {
        if self.result.status == WorkflowStatus::Pending {
            self.result.status = WorkflowStatus::Running;
        }
    }

    /// Accept a new progress value only if it does not regress.
    fn raise_progress(&mut self, percent: f64) {
        let percent = percent.clamp(0.0, 100.0);
        if percent > self.result.progress {
            self.result.progress = percent;
        }
    }

    fn resolve_step_id(&mut self, step_id: Option<String>, agent_id: Option<String>) -> String {
        if let Some(id) = step_id {
            return id;
        }
        // Progress for a named agent maps to one stable step per agent.
        if let Some(agent) = agent_id {
            return format!("step-{}", agent);
        }
        if let Some(active) = &self.active_step {
            return active.clone();
        }
        format!("step-{}", Uuid::new_v4())
    }

    fn upsert_step(&mut self, id: &str, agent_id: Option<&str>) -> &mut WorkflowStep {
        let index = match self.result.steps.iter().position(|s| s.id == id) {
            Some(index) => index,
            None => {
                let step = WorkflowStep::new(id, agent_id.unwrap_or("unknown"));
                self.result.steps.push(step);
                self.result.steps.len() - 1
            }
        };
        &mut self.result.steps[index]
    }

    fn step_mut(&mut self, id: &str) -> Option<&mut WorkflowStep> {
        self.result.steps.iter_mut().find(|s| s.id == id)
    }

    fn active_agent_id(&self) -> Option<String> {
        let id = self.active_step.as_deref()?;
        self.result.step(id).map(|s| s.agent_id.clone())
    }

    fn complete_active_step(&mut self) {
        if let Some(id) = self.active_step.clone() {
            if let Some(step) = self.step_mut(&id) {
                step.apply_status(StepStatus::Completed);
            }
        }
    }

    fn stamp_ended(&mut self) {
        if self.result.ended_at.is_none() {
            self.result.ended_at = Some(chrono::Utc::now());
        }
    }
}

impl Default for WorkflowStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
