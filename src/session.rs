//! Streaming workflow session.
//!
//! One `StreamSession` drives the whole pipeline for one request:
//! frames are pulled from the transport, parsed, interpreted, and
//! applied to the state machine, with an observer callback invoked
//! after every applied event. All of that happens on a single
//! cooperative task; the only suspension point is waiting for the next
//! transport chunk, so observers always see a fully-consistent
//! snapshot.
//!
//! The session never lets a transport failure, idle timeout, or
//! cancellation escape as an error: the caller always gets back the
//! best-effort `WorkflowResult` accumulated so far, marked failed. The
//! single exception is an invalid request descriptor, which fails
//! before the loop starts.

use futures_util::StreamExt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::client::{FoundryClient, FrameStream};
use crate::config::SessionConfig;
use crate::models::{RequestError, WorkflowRequest, WorkflowResult};
use crate::sse::{interpret, parse_frame, Frame};
use crate::traits::TransportError;
use crate::workflow::WorkflowStateMachine;

/// Observer payload: the kind of the event just applied plus an owned
/// immutable snapshot of the workflow state after applying it.
///
/// Observers never receive the live state; mutating a snapshot has no
/// effect on the session.
#[derive(Debug, Clone)]
pub struct SessionUpdate {
    /// Kind name of the applied event (`start`, `progress`, ...).
    pub kind: &'static str,
    /// The workflow state after the event was applied.
    pub snapshot: WorkflowResult,
}

/// Error type at the session boundary.
///
/// Only [`SessionError::InvalidRequest`] is ever returned to the
/// caller; the other variants are folded into the failed
/// `WorkflowResult` they produce.
#[derive(Debug)]
pub enum SessionError {
    /// The request descriptor failed validation (programmer error).
    InvalidRequest(RequestError),
    /// The transport failed or closed abnormally.
    Transport(TransportError),
    /// No frame arrived within the configured idle window.
    IdleTimeout(Duration),
    /// The caller cancelled the session.
    Cancelled,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidRequest(e) => write!(f, "Invalid request: {}", e),
            SessionError::Transport(e) => write!(f, "Transport failure: {}", e),
            SessionError::IdleTimeout(d) => {
                write!(f, "Idle timeout: no data for {} seconds", d.as_secs())
            }
            SessionError::Cancelled => write!(f, "Cancelled by caller"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::InvalidRequest(e) => Some(e),
            SessionError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RequestError> for SessionError {
    fn from(e: RequestError) -> Self {
        SessionError::InvalidRequest(e)
    }
}

/// What the read loop got when it asked for the next frame.
enum NextFrame {
    Frame(Frame),
    End,
    Failed(TransportError),
    IdleTimeout(Duration),
}

/// One streaming workflow session.
///
/// Owns its state machine and transport handle exclusively for the
/// duration of one run; concurrent sessions share nothing. Not
/// restartable: `run` consumes the session.
pub struct StreamSession {
    client: FoundryClient,
    config: SessionConfig,
    cancel: CancellationToken,
}

impl StreamSession {
    /// Create a session with the default configuration.
    pub fn new(client: FoundryClient) -> Self {
        Self::with_config(client, SessionConfig::default())
    }

    /// Create a session with a custom configuration.
    pub fn with_config(client: FoundryClient, config: SessionConfig) -> Self {
        Self {
            client,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// A handle the caller can use to cancel the session at any time.
    ///
    /// Cancelling stops the read loop at its next suspension point,
    /// releases the transport, and yields the accumulated result
    /// marked failed.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the session to completion without an observer.
    pub async fn run(self, request: WorkflowRequest) -> Result<WorkflowResult, SessionError> {
        self.run_with_observer(request, |_| {}).await
    }

    /// Run the session, invoking `on_event` after every applied event.
    ///
    /// The observer is called with [`SessionUpdate`] snapshots in
    /// strict event-arrival order; heartbeats are dropped before they
    /// reach it. Returns when the stream ends, the workflow reaches a
    /// terminal status, the transport fails, the idle timeout expires,
    /// or the caller cancels, whichever comes first. The transport is
    /// released on every exit path, even if unread frames remain.
    pub async fn run_with_observer<F>(
        self,
        request: WorkflowRequest,
        mut on_event: F,
    ) -> Result<WorkflowResult, SessionError>
    where
        F: FnMut(SessionUpdate),
    {
        request.validate()?;

        let mut machine = WorkflowStateMachine::new();
        tracing::info!(
            workflow = %machine.result().id,
            endpoint = %request.endpoint,
            "starting workflow session"
        );

        let mut frames = match self.client.open_stream(&request).await {
            Ok(frames) => frames,
            Err(err) => {
                tracing::warn!(%err, "failed to open workflow stream");
                machine.fail(SessionError::Transport(err).to_string());
                return Ok(machine.into_result());
            }
        };

        let failure = loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break Some(SessionError::Cancelled),
                next = next_frame(&mut frames, self.config.idle_timeout) => next,
            };

            match next {
                NextFrame::Frame(frame) => {
                    let (event_type, data) = parse_frame(&frame);
                    let event = interpret(&event_type, &data);
                    if event.is_heartbeat() {
                        continue;
                    }

                    machine.apply(&event);
                    on_event(SessionUpdate {
                        kind: event.kind(),
                        snapshot: machine.snapshot(),
                    });

                    if machine.result().is_terminal() {
                        break None;
                    }
                }
                NextFrame::End => break None,
                NextFrame::Failed(err) => break Some(SessionError::Transport(err)),
                NextFrame::IdleTimeout(d) => break Some(SessionError::IdleTimeout(d)),
            }
        };

        // The transport is released here on every path; unread frames
        // after an early exit are abandoned with it.
        drop(frames);

        match failure {
            Some(err) => {
                tracing::warn!(workflow = %machine.result().id, %err, "workflow session failed");
                machine.fail(err.to_string());
            }
            None => {
                // End-of-stream without a terminal event still ends
                // terminal: the safety net forces completion.
                machine.finalize();
                tracing::info!(
                    workflow = %machine.result().id,
                    status = ?machine.result().status,
                    "workflow session finished"
                );
            }
        }

        Ok(machine.into_result())
    }
}

/// Await the next frame, bounded by the idle timeout when configured.
async fn next_frame(frames: &mut FrameStream, idle: Option<Duration>) -> NextFrame {
    let item = match idle {
        Some(window) => match tokio::time::timeout(window, frames.next()).await {
            Ok(item) => item,
            Err(_) => return NextFrame::IdleTimeout(window),
        },
        None => frames.next().await,
    };

    match item {
        Some(Ok(frame)) => NextFrame::Frame(frame),
        Some(Err(err)) => NextFrame::Failed(err),
        None => NextFrame::End,
    }
}
