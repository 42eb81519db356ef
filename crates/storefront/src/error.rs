//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every response body is JSON:
//!
//! ```text
//! { "error": "validation", "fields": { "phone": ["..."] } }
//! { "error": "not_found", "message": "..." }
//! ```

use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use freshcatch_core::{AccessError, ValidationErrors};
use serde_json::json;
use thiserror::Error;

use crate::api::ApiError;
use crate::cart::StoreError;
use crate::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed validation.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// No valid identity token.
    #[error("Authentication required")]
    Unauthenticated,

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The backend could not be reached or failed.
    #[error("Backend error: {0}")]
    Upstream(#[source] Arc<ApiError>),

    /// The backend refused the request for a reason the shopper can act on.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Unauthenticated => "authentication",
            Self::Forbidden(_) => "authorization",
            Self::Upstream(_) => "network",
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Upstream(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let kind = self.kind();

        // Don't expose internal error details to clients
        let body = match self {
            Self::Validation(fields) => json!({ "error": kind, "fields": fields }),
            Self::Internal(_) => json!({ "error": kind, "message": "Internal server error" }),
            Self::Upstream(_) => json!({
                "error": kind,
                "message": "The shop is not reachable right now, please try again",
            }),
            Self::Unauthenticated => json!({ "error": kind, "message": "Please sign in" }),
            Self::Forbidden(message) | Self::BadRequest(message) | Self::NotFound(message) => {
                json!({ "error": kind, "message": message })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<Arc<ApiError>> for AppError {
    fn from(err: Arc<ApiError>) -> Self {
        match &*err {
            ApiError::NotFound(what) => Self::NotFound(what.clone()),
            ApiError::Rejected { status, message } if (400..500).contains(status) => {
                Self::BadRequest(message.clone())
            }
            _ => Self::Upstream(err),
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        Arc::new(err).into()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(fields) => Self::Validation(fields),
            StoreError::NotFound(id) => Self::NotFound(format!("cart item {id}")),
            StoreError::Network(err) => err.into(),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Validation(fields) => Self::Validation(fields),
            CheckoutError::Network(err) => err.into(),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        Self::Validation(err)
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthenticated => Self::Unauthenticated,
            forbidden @ AccessError::Forbidden { .. } => Self::Forbidden(forbidden.to_string()),
        }
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        Self::Internal(format!("template: {err}"))
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "pomfret")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
