//! Application state shared across handlers.

use std::sync::Arc;

use freshcatch_core::identity::{IdentityError, TokenVerifier};

use crate::api::{AdminApiError, AdminClient};
use crate::config::AdminConfig;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Api(#[from] AdminApiError),
    #[error("identity key: {0}")]
    Identity(#[from] IdentityError),
}

/// Application state shared across all handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    api: AdminClient,
    verifier: TokenVerifier,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity key is not a valid RSA public key or
    /// the HTTP client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, StateError> {
        let verifier = TokenVerifier::rsa_pem(&config.identity_public_key)?;
        Self::with_verifier(config, verifier)
    }

    /// Create application state with an explicit token verifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_verifier(config: AdminConfig, verifier: TokenVerifier) -> Result<Self, StateError> {
        let api = AdminClient::new(&config.backend)?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                verifier,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the back-office client.
    #[must_use]
    pub fn api(&self) -> &AdminClient {
        &self.inner.api
    }

    #[must_use]
    pub fn verifier(&self) -> &TokenVerifier {
        &self.inner.verifier
    }
}
