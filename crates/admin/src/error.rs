//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Bodies are JSON, in the same
//! shape the storefront uses:
//!
//! ```text
//! { "error": "validation", "fields": { "price": ["..."] } }
//! { "error": "transition_rejected", "message": "..." }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use freshcatch_core::{AccessError, ValidationErrors};
use serde_json::json;
use thiserror::Error;

use crate::api::AdminApiError;

/// Application-level error type for the back-office.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed validation.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// No valid identity token.
    #[error("Authentication required")]
    Unauthenticated,

    /// Authenticated but not an admin.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The backend refused a status change.
    #[error("Transition rejected: {0}")]
    TransitionRejected(String),

    /// The backend refused the request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The backend could not be reached or failed.
    #[error("Backend error: {0}")]
    Upstream(#[source] AdminApiError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::TransitionRejected(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Unauthenticated => "authentication",
            Self::Forbidden(_) => "authorization",
            Self::TransitionRejected(_) => "transition_rejected",
            Self::BadRequest(_) => "bad_request",
            Self::Upstream(_) => "network",
            Self::NotFound(_) => "not_found",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Upstream(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let kind = self.kind();

        let body = match self {
            Self::Validation(fields) => json!({ "error": kind, "fields": fields }),
            Self::Upstream(_) => json!({
                "error": kind,
                "message": "The backend is not reachable right now, please try again",
            }),
            Self::Unauthenticated => json!({ "error": kind, "message": "Please sign in" }),
            Self::Forbidden(message)
            | Self::TransitionRejected(message)
            | Self::BadRequest(message)
            | Self::NotFound(message) => json!({ "error": kind, "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<AdminApiError> for AppError {
    fn from(err: AdminApiError) -> Self {
        match err {
            AdminApiError::NotFound(what) => Self::NotFound(what),
            rejected @ AdminApiError::TransitionRejected { .. } => {
                Self::TransitionRejected(rejected.to_string())
            }
            AdminApiError::Rejected { status, message } if (400..500).contains(&status) => {
                Self::BadRequest(message)
            }
            other => Self::Upstream(other),
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

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context to the acting admin.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
