//! REST API client module for the calculator service.
//!
//! This module provides the `ApiClient`, which wraps a `Transport` and the
//! client `Session`. Authenticated calls carry the session's bearer token;
//! a 401 from the server ends the session.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{ApiClient, FetchOptions};
pub use error::ApiError;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
