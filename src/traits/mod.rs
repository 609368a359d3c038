//! Trait abstractions for external collaborators.
//!
//! The session and client are written against these traits so that the
//! transport can be swapped for a mock in tests.

mod http;

pub use http::{ByteStream, Headers, HttpClient, Response, TransportError};
