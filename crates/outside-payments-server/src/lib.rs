//! HTTP relay in front of the payment core.
//!
//! # Modules
//!
//! - [`config`]: Environment configuration ([`ServerConfig`](config::ServerConfig))
//! - [`routes`]: Checkout, confirmation, webhook, health and metrics endpoints
//! - [`state`]: Shared [`AppState`](state::AppState) with one entry per configured provider
//! - [`error`]: HTTP mapping of relay errors
//! - [`cors`]: Origin allow-list
//! - [`metrics`]: Prometheus counters for checkouts and notifications
//! - [`rate_limit`]: Per-IP limiter for the checkout routes

pub mod config;
pub mod cors;
pub mod error;
pub mod metrics;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use rate_limit::{rate_limit, RateLimit};
pub use state::{AppState, ProviderRoutes};
