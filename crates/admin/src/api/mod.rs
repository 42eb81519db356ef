//! Back-office client for the FreshCatch REST backend.
//!
//! # Architecture
//!
//! - Every request carries the service key (`x-api-key`) and the acting
//!   admin's id (`x-admin-id`) so the backend can audit changes
//! - Nothing is cached: admins must see the backend's current state
//! - Status changes the backend refuses come back as
//!   [`AdminApiError::TransitionRejected`] and are never retried

mod client;
pub mod types;

use freshcatch_core::{EndpointError, OrderStatus};
use thiserror::Error;

pub use client::AdminClient;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum AdminApiError {
    /// HTTP request failed (connection refused, timeout, TLS...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A request URL could not be built.
    #[error("URL error: {0}")]
    Url(#[from] EndpointError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused an order status change.
    #[error("Cannot move order to {requested}: {message}")]
    TransitionRejected {
        /// Status the admin asked for.
        requested: OrderStatus,
        /// Reason given by the backend.
        message: String,
    },

    /// The backend refused the request.
    #[error("Rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the backend, if it sent one.
        message: String,
    },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}
