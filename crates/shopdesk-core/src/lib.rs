//! Core library for shopdesk, an admin console for a small retail backend.
//!
//! - [`auth`]: the session lifecycle (startup validation, login, logout)
//! - [`api`]: the gateway every screen uses to reach the backend
//! - [`models`]: products, orders and the signed-in identity
//! - [`dashboard`]: totals for the dashboard screen
//! - [`config`]: persisted console settings

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, ApiGateway, HttpTransport, Navigator};
pub use auth::{LoginFailure, RouteAccess, SessionManager};
pub use config::Config;
pub use dashboard::DashboardSummary;
