//! Runtime environment and backend URL rules.
//!
//! Production builds must talk to the backend over HTTPS on a public host.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::{Host, Url};

/// Where the binary is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("expected development or production, got {other:?}")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

/// Why a backend URL was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EndpointError {
    #[error("not a valid URL: {0}")]
    Invalid(String),
    #[error("scheme must be http or https, got {0}")]
    UnsupportedScheme(String),
    #[error("production requires https")]
    InsecureScheme,
    #[error("production cannot use a local host ({0})")]
    LocalHost(String),
}

/// A validated base URL for the REST backend, always ending in `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBaseUrl(Url);

impl ApiBaseUrl {
    /// Parse and check a base URL for `environment`.
    ///
    /// # Errors
    ///
    /// Returns an [`EndpointError`] if the URL does not parse, uses a scheme
    /// other than http(s), or - in production - is plain http or points at a
    /// loopback/unspecified host.
    pub fn parse(raw: &str, environment: Environment) -> Result<Self, EndpointError> {
        let mut url = Url::parse(raw.trim()).map_err(|e| EndpointError::Invalid(e.to_string()))?;

        match url.scheme() {
            "https" => {}
            "http" if environment.is_production() => return Err(EndpointError::InsecureScheme),
            "http" => {}
            other => return Err(EndpointError::UnsupportedScheme(other.to_owned())),
        }

        if environment.is_production() && is_local(&url) {
            return Err(EndpointError::LocalHost(
                url.host_str().unwrap_or_default().to_owned(),
            ));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self(url))
    }

    /// Join a relative path such as `cart/items`.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Invalid`] if `path` cannot be joined.
    pub fn join(&self, path: &str) -> Result<Url, EndpointError> {
        self.0
            .join(path.trim_start_matches('/'))
            .map_err(|e| EndpointError::Invalid(e.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

fn is_local(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => ip.is_loopback() || ip.is_unspecified(),
        Some(Host::Ipv6(ip)) => ip.is_loopback() || ip.is_unspecified(),
        None => true,
    }
}
