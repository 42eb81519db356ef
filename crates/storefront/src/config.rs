//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FRESHCATCH_API_BASE_URL` - Base URL of the REST backend
//! - `FRESHCATCH_API_KEY` - Service key sent to the backend (high entropy)
//! - `FRESHCATCH_IDENTITY_PUBLIC_KEY` - PEM public key of the identity provider
//! - `FRESHCATCH_WHATSAPP_NUMBER` - Business WhatsApp number, digits with country code
//! - `FRESHCATCH_PAYMENT_LINK` - Hosted Razorpay payment link (https)
//!
//! ## Optional
//! - `FRESHCATCH_ENV` - `development` or `production` (default: development)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `FRESHCATCH_SERVICE_CITY` - Delivery city (default: Mumbai)
//! - `FRESHCATCH_SERVICE_STATE` - Delivery state (default: Maharashtra)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use freshcatch_core::{ApiBaseUrl, Environment, ServiceArea};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Development or production
    pub environment: Environment,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// REST backend connection
    pub backend: BackendConfig,
    /// PEM public key used to verify identity tokens
    pub identity_public_key: SecretString,
    /// Checkout contact and payment settings
    pub checkout: CheckoutConfig,
    /// Fixed delivery city/state
    pub service_area: ServiceArea,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// REST backend connection settings.
///
/// Implements `Debug` manually to redact the service key.
#[derive(Clone)]
pub struct BackendConfig {
    pub base_url: ApiBaseUrl,
    pub api_key: SecretString,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Where customers are sent to confirm and pay.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// WhatsApp number in international form, digits only
    pub whatsapp_number: String,
    /// Hosted payment link
    pub payment_link: Url,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming every absent required variable,
    /// or the first invalid value found.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut env = EnvReader::new(lookup);

        let api_base_url = env.required("FRESHCATCH_API_BASE_URL");
        let api_key = env.required("FRESHCATCH_API_KEY");
        let identity_public_key = env.required("FRESHCATCH_IDENTITY_PUBLIC_KEY");
        let whatsapp_number = env.required("FRESHCATCH_WHATSAPP_NUMBER");
        let payment_link = env.required("FRESHCATCH_PAYMENT_LINK");
        env.finish()?;

        // finish() guarantees every required value is present
        let (
            Some(api_base_url),
            Some(api_key),
            Some(identity_public_key),
            Some(whatsapp_number),
            Some(payment_link),
        ) = (api_base_url, api_key, identity_public_key, whatsapp_number, payment_link)
        else {
            return Err(ConfigError::Missing(Vec::new()));
        };

        let environment = env
            .or_default("FRESHCATCH_ENV", "development")
            .parse::<Environment>()
            .map_err(|e| ConfigError::InvalidEnvVar("FRESHCATCH_ENV".to_string(), e))?;
        let host = env
            .or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = env
            .or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;

        let base_url = ApiBaseUrl::parse(&api_base_url, environment).map_err(|e| {
            ConfigError::InvalidEnvVar("FRESHCATCH_API_BASE_URL".to_string(), e.to_string())
        })?;
        validate_secret_strength(&api_key, "FRESHCATCH_API_KEY")?;

        let checkout = CheckoutConfig {
            whatsapp_number: parse_whatsapp_number(&whatsapp_number)?,
            payment_link: parse_payment_link(&payment_link)?,
        };

        let service_area = ServiceArea::new(
            env.or_default("FRESHCATCH_SERVICE_CITY", "Mumbai"),
            env.or_default("FRESHCATCH_SERVICE_STATE", "Maharashtra"),
        );

        Ok(Self {
            environment,
            host,
            port,
            backend: BackendConfig {
                base_url,
                api_key: SecretString::from(api_key),
            },
            identity_public_key: SecretString::from(identity_public_key),
            checkout,
            service_area,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Reads variables and remembers which required ones were absent.
struct EnvReader<F> {
    lookup: F,
    missing: Vec<String>,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    const fn new(lookup: F) -> Self {
        Self {
            lookup,
            missing: Vec::new(),
        }
    }

    /// Get a required variable; blank values count as missing.
    fn required(&mut self, key: &str) -> Option<String> {
        let value = self.optional(key);
        if value.is_none() {
            self.missing.push(key.to_string());
        }
        value
    }

    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Fail with every missing name collected so far.
    fn finish(&mut self) -> Result<(), ConfigError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(std::mem::take(&mut self.missing)))
        }
    }
}

/// Digits only, country code included (e.g. 919876543210).
fn parse_whatsapp_number(raw: &str) -> Result<String, ConfigError> {
    let digits = raw.trim().trim_start_matches('+');
    if !(10..=15).contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::InvalidEnvVar(
            "FRESHCATCH_WHATSAPP_NUMBER".to_string(),
            "must be 10-15 digits including country code".to_string(),
        ));
    }
    Ok(digits.to_string())
}

fn parse_payment_link(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("FRESHCATCH_PAYMENT_LINK".to_string(), reason);
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "https" {
        return Err(invalid("must be an https link".to_string()));
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated key."
            ),
        ));
    }

    Ok(())
}
