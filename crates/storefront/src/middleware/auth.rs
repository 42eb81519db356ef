//! Authentication extractors.
//!
//! The identity provider issues a signed token; the browser sends it as
//! `Authorization: Bearer <token>`. Handlers never look at claims directly,
//! they receive an [`Identity`] and ask it for capabilities.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use freshcatch_core::identity::Identity;
use freshcatch_core::{AccessError, Capability, SessionContext};

use crate::error::set_sentry_user;
use crate::state::AppState;

/// Extractor for a signed-in shopper.
///
/// API requests without a valid token get 401; page requests are redirected
/// to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn show_cart(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("cart for {}", user.user_id)
/// }
/// ```
pub struct RequireUser(pub Identity);

/// Error returned when a request lacks the required session.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Signed in but not allowed (for API requests).
    Forbidden,
    /// Signed in but not allowed; back to the home page.
    RedirectHome,
}

impl AuthRejection {
    fn for_error(err: &AccessError, is_api: bool) -> Self {
        match (err, is_api) {
            (AccessError::Unauthenticated, true) => Self::Unauthorized,
            (AccessError::Unauthenticated, false) => Self::RedirectToLogin,
            (AccessError::Forbidden { .. }, true) => Self::Forbidden,
            (AccessError::Forbidden { .. }, false) => Self::RedirectHome,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
            Self::RedirectHome => Redirect::to("/").into_response(),
        }
    }
}

/// The `Bearer` token of a request, if any.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Whether the request targets the JSON API. Nested routers see a stripped
/// path, so the original URI wins when present.
fn is_api_request(parts: &Parts) -> bool {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path(), |original| original.0.path())
        .starts_with("/api/")
}

/// Verify the request's token, if it carries one.
fn identify(parts: &Parts, state: &AppState) -> Result<Identity, AccessError> {
    let token = bearer_token(parts).ok_or(AccessError::Unauthenticated)?;
    state.verifier().verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected identity token");
        AccessError::Unauthenticated
    })
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let is_api = is_api_request(parts);

        let identity = identify(parts, state)
            .and_then(|identity| identity.require(Capability::Shop).map(|()| identity))
            .map_err(|e| AuthRejection::for_error(&e, is_api))?;

        set_sentry_user(&identity.user_id);
        tracing::Span::current().record("user_id", identity.user_id.as_str());

        Ok(Self(identity))
    }
}

/// Extractor that optionally gets the current shopper.
///
/// Unlike `RequireUser`, this does not reject the request if the token is
/// missing or invalid.
pub struct OptionalUser(pub Option<Identity>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(identify(parts, state).ok()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;
    use freshcatch_core::Role;

    use super::*;

    fn parts(uri: &str, auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts("/api/cart", Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts("/api/cart", Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts("/api/cart", Some("Bearer  "))), None);
        assert_eq!(bearer_token(&parts("/api/cart", None)), None);
    }

    #[test]
    fn test_original_uri_decides_api_requests() {
        let mut nested = parts("/cart", None);
        nested
            .extensions
            .insert(OriginalUri("/api/cart".parse().unwrap()));
        assert!(is_api_request(&nested));
        assert!(!is_api_request(&parts("/account", None)));
    }

    #[test]
    fn test_rejection_depends_on_request_kind() {
        let forbidden = AccessError::Forbidden {
            role: Role::User,
            capability: Capability::Administer,
        };
        assert_eq!(
            AuthRejection::for_error(&AccessError::Unauthenticated, true),
            AuthRejection::Unauthorized
        );
        assert_eq!(
            AuthRejection::for_error(&AccessError::Unauthenticated, false),
            AuthRejection::RedirectToLogin
        );
        assert_eq!(AuthRejection::for_error(&forbidden, true), AuthRejection::Forbidden);
        assert_eq!(AuthRejection::for_error(&forbidden, false), AuthRejection::RedirectHome);
        assert_eq!(
            AuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
