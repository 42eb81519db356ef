//! User profile and delivery address.

use serde::{Deserialize, Serialize};

use crate::types::{Email, Phone, Pincode, Role, UserId};

/// The city and state the business delivers to.
///
/// Addresses always carry these values; users cannot edit them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceArea {
    pub city: String,
    pub state: String,
}

impl ServiceArea {
    /// Build a service area.
    #[must_use]
    pub fn new(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
        }
    }
}

/// A delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: Pincode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
}

impl Address {
    /// Build an address inside `area`.
    #[must_use]
    pub fn within(
        area: &ServiceArea,
        street: impl Into<String>,
        pincode: Pincode,
        landmark: Option<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: area.city.clone(),
            state: area.state.clone(),
            pincode,
            landmark: landmark.filter(|l| !l.trim().is_empty()),
        }
    }

    /// Force city and state back to the service area.
    #[must_use]
    pub fn pinned_to(mut self, area: &ServiceArea) -> Self {
        self.city.clone_from(&area.city);
        self.state.clone_from(&area.state);
        self
    }

    /// One-line rendering for messages and receipts.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.street.as_str()];
        if let Some(landmark) = &self.landmark {
            parts.push(landmark);
        }
        parts.push(&self.city);
        parts.push(&self.state);
        format!("{} - {}", parts.join(", "), self.pincode)
    }
}

/// A user's profile as held by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub phone: Option<Phone>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub address: Option<Address>,
}
