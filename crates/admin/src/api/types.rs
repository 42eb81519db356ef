//! Request and response bodies exchanged with the backend.

use freshcatch_core::{OrderStatus, Price, Role};
use serde::{Deserialize, Serialize};

/// `GET admin/stats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub revenue: Price,
    pub total_users: u64,
    pub total_products: u64,
}

/// `PATCH admin/users/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl UserUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.role.is_none() && self.verified.is_none()
    }
}

/// `PUT admin/orders/{id}/status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// Error body the backend sends with 4xx/5xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// The most useful message in the body, if any.
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_update_skips_absent_fields() {
        let update = UserUpdate {
            role: Some(Role::Admin),
            verified: None,
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"role":"admin"}"#);
        assert!(UserUpdate::default().is_empty());
    }

    #[test]
    fn test_stats_revenue_parses_decimal_string() {
        let stats: DashboardStats = serde_json::from_value(serde_json::json!({
            "total_orders": 12,
            "pending_orders": 3,
            "revenue": "18450.5",
            "total_users": 40,
            "total_products": 9
        }))
        .unwrap();
        assert_eq!(stats.revenue.display(), "₹18450.50");
    }
}
