//! Concrete implementations of the trait abstractions.
//!
//! - [`ReqwestHttpClient`] - production transport using reqwest
//! - [`mock::MockHttpClient`] - scriptable transport for tests

pub mod mock;
pub mod reqwest_http;

pub use mock::{MockHttpClient, MockResponse};
pub use reqwest_http::ReqwestHttpClient;
