//! Order status lifecycle and its display table.
//!
//! ```text
//! pending -> confirmed -> out-for-delivery -> delivered
//!    \           \               \
//!     +-----------+---------------+--> cancelled
//! ```
//!
//! Transitions are advisory on this side: the back-office offers every status
//! and the backend decides legality.

use serde::{Deserialize, Serialize};

/// Delivery status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order. The admin UI offers all of them.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire name (`out-for-delivery`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::OutForDelivery => "out-for-delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse a wire name. Returns `None` for unknown values.
    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Delivered and cancelled orders never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    ///
    /// Used for hints only; the backend is authoritative.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Confirmed)
            | (Self::Confirmed, Self::OutForDelivery)
            | (Self::OutForDelivery, Self::Delivered) => true,
            (from, Self::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Static display configuration.
    #[must_use]
    pub const fn display(self) -> StatusDisplay {
        match self {
            Self::Pending => StatusDisplay {
                label: "Pending",
                color_class: "bg-yellow-100 text-yellow-800",
                icon: "clock",
            },
            Self::Confirmed => StatusDisplay {
                label: "Confirmed",
                color_class: "bg-blue-100 text-blue-800",
                icon: "check-circle",
            },
            Self::OutForDelivery => StatusDisplay {
                label: "Out for Delivery",
                color_class: "bg-purple-100 text-purple-800",
                icon: "truck",
            },
            Self::Delivered => StatusDisplay {
                label: "Delivered",
                color_class: "bg-green-100 text-green-800",
                icon: "package-check",
            },
            Self::Cancelled => StatusDisplay {
                label: "Cancelled",
                color_class: "bg-red-100 text-red-800",
                icon: "x-circle",
            },
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label, colour class and icon for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
    pub label: &'static str,
    pub color_class: &'static str,
    pub icon: &'static str,
}

/// A rendered status badge.
///
/// Unknown wire values render with the pending style. `recognized` stays
/// false for them so callers can log the bad value instead of hiding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub status: String,
    #[serde(flatten)]
    pub display: StatusDisplay,
    pub recognized: bool,
}

impl StatusBadge {
    /// Badge for a known status.
    #[must_use]
    pub fn for_status(status: OrderStatus) -> Self {
        Self {
            status: status.as_str().to_owned(),
            display: status.display(),
            recognized: true,
        }
    }

    /// Badge for a raw wire value, falling back to the pending style.
    #[must_use]
    pub fn for_raw(raw: &str) -> Self {
        match OrderStatus::from_wire(raw) {
            Some(status) => Self::for_status(status),
            None => Self {
                status: raw.to_owned(),
                display: OrderStatus::Pending.display(),
                recognized: false,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_serde() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(OrderStatus::from_wire(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_unknown_status_uses_pending_style() {
        let badge = StatusBadge::for_raw("lost-at-sea");
        assert_eq!(badge.display, OrderStatus::Pending.display());
        assert_eq!(badge.status, "lost-at-sea");
        assert!(!badge.recognized);
    }

    #[test]
    fn test_known_status_badge() {
        let badge = StatusBadge::for_raw("out-for-delivery");
        assert!(badge.recognized);
        assert_eq!(badge.display.label, "Out for Delivery");
        assert_eq!(badge.display.icon, "truck");
    }

    #[test]
    fn test_lifecycle() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(OutForDelivery));
        assert!(OutForDelivery.can_transition_to(Delivered));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(OutForDelivery.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Delivered));
    }

    #[test]
    fn test_terminal_states() {
        let terminal: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![OrderStatus::Delivered, OrderStatus::Cancelled]);
    }
}
