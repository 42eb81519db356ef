//! Identity-token verification.
//!
//! The identity provider signs a JWT for each signed-in user. Binaries verify
//! it here and work with the resulting [`Identity`] through
//! [`SessionContext`], never with provider-specific claims.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Role, SessionContext, UserId};

/// Errors from loading a key or verifying a token.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The configured public key is not valid PEM.
    #[error("invalid identity public key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
    /// Signature, expiry or shape check failed.
    #[error("invalid identity token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
}

/// Claims read from the provider's session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Backend user id.
    pub sub: String,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
    /// Role from the provider's public metadata. Absent means `user`.
    #[serde(default)]
    pub role: Option<Role>,
    /// Whether the user completed verification.
    #[serde(default)]
    pub verified: bool,
}

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
    pub verified: bool,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: UserId::new(claims.sub),
            role: claims.role.unwrap_or_default(),
            verified: claims.verified,
        }
    }
}

impl SessionContext for Identity {
    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    fn role(&self) -> Role {
        self.role
    }
}

/// Verifies provider tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl TokenVerifier {
    /// Verifier for RS256 tokens signed by the provider.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidKey`] if `pem` is not an RSA public key.
    pub fn rsa_pem(pem: &SecretString) -> Result<Self, IdentityError> {
        let key = DecodingKey::from_rsa_pem(pem.expose_secret().as_bytes())
            .map_err(IdentityError::InvalidKey)?;
        Ok(Self {
            key,
            validation: Validation::new(Algorithm::RS256),
        })
    }

    /// Verifier for HS256 tokens with a shared secret.
    #[must_use]
    pub fn hmac(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify `token` and return the caller.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidToken`] for a bad signature, an expired
    /// token or missing claims.
    pub fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| Identity::from(data.claims))
            .map_err(IdentityError::InvalidToken)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;
    use crate::types::Capability;

    const SECRET: &[u8] = b"k3y-for-tests-only-9f8e7d6c5b4a";

    fn token(claims: &Claims) -> String {
        encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn far_future() -> u64 {
        4_102_444_800 // 2100-01-01
    }

    #[test]
    fn test_verify_admin_token() {
        let claims = Claims {
            sub: "user_7".to_owned(),
            exp: far_future(),
            role: Some(Role::Admin),
            verified: true,
        };
        let identity = TokenVerifier::hmac(SECRET).verify(&token(&claims)).unwrap();

        assert_eq!(identity.user_id.as_str(), "user_7");
        assert!(identity.require(Capability::Administer).is_ok());
    }

    #[test]
    fn test_missing_role_defaults_to_user() {
        let claims = Claims {
            sub: "user_8".to_owned(),
            exp: far_future(),
            role: None,
            verified: false,
        };
        let identity = TokenVerifier::hmac(SECRET).verify(&token(&claims)).unwrap();

        assert_eq!(identity.role, Role::User);
        assert!(identity.require(Capability::Administer).is_err());
    }

    #[test]
    fn test_rejects_expired_and_forged_tokens() {
        let expired = Claims {
            sub: "user_9".to_owned(),
            exp: 1_000,
            role: None,
            verified: false,
        };
        assert!(TokenVerifier::hmac(SECRET).verify(&token(&expired)).is_err());

        let valid = Claims {
            exp: far_future(),
            ..expired
        };
        assert!(TokenVerifier::hmac(b"another-secret").verify(&token(&valid)).is_err());
    }

    #[test]
    fn test_rsa_pem_rejects_garbage() {
        let pem = SecretString::from("not a pem");
        assert!(matches!(
            TokenVerifier::rsa_pem(&pem),
            Err(IdentityError::InvalidKey(_))
        ));
    }
}
