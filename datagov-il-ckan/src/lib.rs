//! Resilient access to the action API of a CKAN portal (data.gov.il by
//! default).
//!
//! - [`ConnectionManager`] owns the single shared HTTP client.
//! - [`CkanClient`] issues actions through it with bounded retries and maps
//!   every failure onto [`GatewayError`].
//! - [`models`] holds the action descriptor, the response envelope and the
//!   typed parameter sets of the supported actions.

pub mod client;
pub mod connection;
pub mod models;
pub mod retry;

// Re-export the ergonomic client and configuration for easy access
pub use client::{
    ApiKey, CkanClient, Configuration, DEFAULT_BASE_PATH, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
    GatewayError,
};
pub use connection::{ClientHandle, ConnectionManager, ConnectionSettings};
pub use models::{CatalogAction, CatalogResponse, HttpMethod};
pub use retry::{RetryPolicy, should_retry};
