//! Application state shared across handlers.

use std::sync::Arc;

use freshcatch_core::ServiceArea;
use freshcatch_core::identity::{IdentityError, TokenVerifier};

use crate::api::{ApiError, RestClient};
use crate::cart::CartRegistry;
use crate::config::StorefrontConfig;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Api(#[from] ApiError),
    #[error("identity key: {0}")]
    Identity(#[from] IdentityError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the backend client, token verifier and per-user carts.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: RestClient,
    verifier: TokenVerifier,
    carts: CartRegistry<RestClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity key is not a valid RSA public key or
    /// the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let verifier = TokenVerifier::rsa_pem(&config.identity_public_key)?;
        Self::with_verifier(config, verifier)
    }

    /// Create application state with an explicit token verifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_verifier(
        config: StorefrontConfig,
        verifier: TokenVerifier,
    ) -> Result<Self, StateError> {
        let api = RestClient::new(&config.backend)?;
        let carts = CartRegistry::new(api.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                verifier,
                carts,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn api(&self) -> &RestClient {
        &self.inner.api
    }

    #[must_use]
    pub fn verifier(&self) -> &TokenVerifier {
        &self.inner.verifier
    }

    /// Get a reference to the per-user cart stores.
    #[must_use]
    pub fn carts(&self) -> &CartRegistry<RestClient> {
        &self.inner.carts
    }

    #[must_use]
    pub fn service_area(&self) -> &ServiceArea {
        &self.inner.config.service_area
    }
}
