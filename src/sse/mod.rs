//! Workflow stream decoding.
//!
//! Turns the raw transport byte stream into typed [`WorkflowEvent`]s in
//! three stages, each tolerant of the quirks the backend has shipped:
//!
//! - `frame` - slices blank-line-terminated frames out of arbitrarily
//!   fragmented chunks
//! - `parser` - extracts `(event_type, data)` from a frame, accepting
//!   both the plain and the legacy double-wrapped line conventions
//! - `interpreter` - classifies the pair into the closed event set,
//!   degrading unknown or malformed payloads to raw text
//!
//! `payloads` holds the internal serde structs for the data payloads.

mod events;
mod frame;
mod interpreter;
mod parser;
mod payloads;

pub use events::WorkflowEvent;
pub use frame::{Frame, FrameBuffer};
pub use interpreter::interpret;
pub use parser::parse_frame;
