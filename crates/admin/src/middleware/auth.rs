//! Authentication extractor for admin.
//!
//! Tokens come from the same identity provider as the storefront. A valid
//! token is not enough here: the session must also hold
//! [`Capability::Administer`].

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use freshcatch_core::identity::Identity;
use freshcatch_core::{AccessError, Capability, SessionContext};

use crate::error::set_sentry_user;
use crate::state::AppState;

/// Extractor that requires an admin session.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.user_id)
/// }
/// ```
pub struct RequireAdmin(pub Identity);

/// Error returned when a request is not from an admin.
#[derive(Debug, PartialEq, Eq)]
pub enum AdminRejection {
    /// Missing or invalid token.
    Unauthorized,
    /// Valid token without the admin role.
    Forbidden,
}

impl From<AccessError> for AdminRejection {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthenticated => Self::Unauthorized,
            AccessError::Forbidden { .. } => Self::Forbidden,
        }
    }
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn authorize(parts: &Parts, state: &AppState) -> Result<Identity, AccessError> {
    let token = bearer_token(parts).ok_or(AccessError::Unauthenticated)?;
    let identity = state.verifier().verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected identity token");
        AccessError::Unauthenticated
    })?;

    identity.require(Capability::Administer).inspect_err(|_| {
        tracing::warn!(user_id = %identity.user_id, "Non-admin tried to use the back-office");
    })?;

    Ok(identity)
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = authorize(parts, state)?;

        set_sentry_user(&identity.user_id);
        tracing::Span::current().record("user_id", identity.user_id.as_str());

        Ok(Self(identity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;
    use freshcatch_core::Role;

    use super::*;

    #[test]
    fn test_rejections() {
        assert_eq!(
            AdminRejection::from(AccessError::Unauthenticated),
            AdminRejection::Unauthorized
        );
        let forbidden = AccessError::Forbidden {
            role: Role::User,
            capability: Capability::Administer,
        };
        assert_eq!(AdminRejection::from(forbidden), AdminRejection::Forbidden);
        assert_eq!(
            AdminRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_bearer_token() {
        let parts = Request::builder()
            .header(AUTHORIZATION, "Bearer t0k")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        assert_eq!(bearer_token(&parts), Some("t0k"));
    }
}
