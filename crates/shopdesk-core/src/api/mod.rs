//! REST API module for the store backend.
//!
//! This module provides the `ApiGateway`, the one channel screens use to
//! talk to the backend. Every request carries the session's bearer token
//! and every response is classified into an `ApiError` variant; a 401 from
//! any endpoint logs the user out and sends them back to the login screen.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{ApiGateway, Navigator};
pub use error::ApiError;
pub use transport::{
    ApiRequest, ApiResponse, HttpTransport, RequestBody, Transport, DEFAULT_BASE_URL,
};
