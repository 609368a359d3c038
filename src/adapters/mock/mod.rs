//! Test doubles for the trait abstractions.

mod http;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
