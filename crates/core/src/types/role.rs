//! Roles and capability checks.
//!
//! Route gating never inspects identity-provider claims directly. Handlers ask
//! the current session whether it holds a [`Capability`].

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A shopper.
    #[default]
    User,
    /// Back-office staff: users, products and order status.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Something a session may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Cart, checkout, order history and profile.
    Shop,
    /// Dashboard, user, product and order management.
    Administer,
}

/// Why a capability check failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No authenticated session.
    #[error("authentication required")]
    Unauthenticated,
    /// Authenticated, but the role does not grant the capability.
    #[error("{role} accounts cannot {capability:?}")]
    Forbidden {
        /// Role of the session.
        role: Role,
        /// Capability that was requested.
        capability: Capability,
    },
}

/// The authenticated caller of a request.
///
/// Implemented by whatever the binary derives from a verified identity token.
pub trait SessionContext {
    /// Backend id of the user.
    fn user_id(&self) -> &UserId;

    /// Role claim of the user.
    fn role(&self) -> Role;

    /// Whether the session holds `capability`.
    fn can(&self, capability: Capability) -> bool {
        match capability {
            Capability::Shop => true,
            Capability::Administer => self.role() == Role::Admin,
        }
    }

    /// Require `capability`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Forbidden`] if the role does not grant it.
    fn require(&self, capability: Capability) -> Result<(), AccessError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AccessError::Forbidden {
                role: self.role(),
                capability,
            })
        }
    }
}
