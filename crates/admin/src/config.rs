//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FRESHCATCH_API_BASE_URL` - Base URL of the REST backend
//! - `FRESHCATCH_API_KEY` - Service key sent to the backend (high entropy)
//! - `FRESHCATCH_IDENTITY_PUBLIC_KEY` - PEM public key of the identity provider
//!
//! ## Optional
//! - `FRESHCATCH_ENV` - `development` or `production` (default: development)
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use freshcatch_core::{ApiBaseUrl, Environment};
use secrecy::SecretString;
use thiserror::Error;

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

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub environment: Environment,
    pub host: IpAddr,
    pub port: u16,
    /// REST backend connection
    pub backend: BackendConfig,
    /// PEM public key used to verify identity tokens
    pub identity_public_key: SecretString,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

/// REST backend connection settings.
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

impl AdminConfig {
    /// Load configuration from environment variables.
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
    /// Same as [`AdminConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut env = EnvReader::new(lookup);

        let api_base_url = env.required("FRESHCATCH_API_BASE_URL");
        let api_key = env.required("FRESHCATCH_API_KEY");
        let identity_public_key = env.required("FRESHCATCH_IDENTITY_PUBLIC_KEY");
        env.finish()?;

        // finish() guarantees every required value is present
        let (Some(api_base_url), Some(api_key), Some(identity_public_key)) =
            (api_base_url, api_key, identity_public_key)
        else {
            return Err(ConfigError::Missing(Vec::new()));
        };

        let environment = env
            .or_default("FRESHCATCH_ENV", "development")
            .parse::<Environment>()
            .map_err(|e| ConfigError::InvalidEnvVar("FRESHCATCH_ENV".to_string(), e))?;
        let host = env
            .or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = env
            .or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;

        let base_url = ApiBaseUrl::parse(&api_base_url, environment).map_err(|e| {
            ConfigError::InvalidEnvVar("FRESHCATCH_API_BASE_URL".to_string(), e.to_string())
        })?;
        validate_secret_strength(&api_key, "FRESHCATCH_API_KEY")?;

        Ok(Self {
            environment,
            host,
            port,
            backend: BackendConfig {
                base_url,
                api_key: SecretString::from(api_key),
            },
            identity_public_key: SecretString::from(identity_public_key),
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

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
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
            format!("entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"),
        ));
    }

    Ok(())
}
