//! FreshCatch REST backend client.
//!
//! # Architecture
//!
//! - The backend is the source of truth - no local persistence
//! - Requests carry the service key (`x-api-key`) and, for user-scoped
//!   resources, the caller's id (`x-user-id`)
//! - Catalogue reads are cached in-memory via `moka` (5 minute TTL)
//!
//! The cart and order operations are also exposed as the [`CartApi`] and
//! [`OrderApi`] traits so the cart store and checkout can run against a fake
//! in tests.

mod cache;
mod client;
pub mod types;

use std::future::Future;

use freshcatch_core::{
    Cart, CartItem, CartItemId, EndpointError, Order, OrderId, OrderSubmission, ProductId,
    Quantity, UserId,
};
use thiserror::Error;

pub use client::RestClient;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
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

impl ApiError {
    /// Whether asking again later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::Parse(_) | Self::Url(_) | Self::NotFound(_) => false,
        }
    }
}

/// Remote cart operations.
pub trait CartApi: Send + Sync {
    /// The backend's copy of the cart.
    fn fetch_cart(&self, owner: &UserId) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    /// Add `quantity` portions of a product; the backend merges into an
    /// existing line for the same product. Returns the resulting line.
    fn add_item(
        &self,
        owner: &UserId,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<CartItem, ApiError>> + Send;

    /// Set the quantity of a line. Returns the updated line.
    fn update_item(
        &self,
        owner: &UserId,
        item_id: &CartItemId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<CartItem, ApiError>> + Send;

    /// Delete a line.
    fn remove_item(
        &self,
        owner: &UserId,
        item_id: &CartItemId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Delete every line.
    fn clear_cart(&self, owner: &UserId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Remote order operations for the signed-in customer.
pub trait OrderApi: Send + Sync {
    /// Create an order from a checkout submission.
    fn create_order(
        &self,
        owner: &UserId,
        submission: &OrderSubmission,
    ) -> impl Future<Output = Result<Order, ApiError>> + Send;

    /// The customer's orders, newest first.
    fn list_orders(&self, owner: &UserId) -> impl Future<Output = Result<Vec<Order>, ApiError>> + Send;

    /// One of the customer's orders.
    fn get_order(
        &self,
        owner: &UserId,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<Order, ApiError>> + Send;
}
