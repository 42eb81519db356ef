//! Orders and checkout submissions.
//!
//! An [`OrderSubmission`] copies the cart lines at checkout time. The copy is
//! owned, so later cart mutations cannot reach an order that was already
//! placed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartItem};
use crate::profile::Address;
use crate::types::{OrderId, OrderStatus, Phone, Price, StatusBadge};

/// How the customer will pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Confirm on WhatsApp, pay on delivery or by UPI.
    #[default]
    Whatsapp,
    /// Pay through the hosted Razorpay link.
    RazorpayLink,
}

impl PaymentMethod {
    /// Human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Whatsapp => "WhatsApp",
            Self::RazorpayLink => "Razorpay payment link",
        }
    }
}

/// Delivery time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliverySlot {
    Morning,
    Afternoon,
    Evening,
}

impl DeliverySlot {
    /// Window shown to the customer.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Morning => "7 AM - 10 AM",
            Self::Afternoon => "12 PM - 3 PM",
            Self::Evening => "5 PM - 8 PM",
        }
    }
}

/// Where and when to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub address: Address,
    pub phone: Phone,
    pub date: NaiveDate,
    pub time: DeliverySlot,
}

/// The payload sent to the backend to create an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSubmission {
    items: Vec<CartItem>,
    delivery: DeliveryDetails,
    payment_method: PaymentMethod,
    total_amount: Price,
}

impl OrderSubmission {
    /// Snapshot `cart` together with delivery and payment choices.
    #[must_use]
    pub fn from_cart(cart: &Cart, delivery: DeliveryDetails, payment_method: PaymentMethod) -> Self {
        Self {
            items: cart.items.clone(),
            total_amount: cart.total_amount(),
            delivery,
            payment_method,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub const fn delivery(&self) -> &DeliveryDetails {
        &self.delivery
    }

    #[must_use]
    pub const fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    #[must_use]
    pub const fn total_amount(&self) -> Price {
        self.total_amount
    }
}

/// An order as recorded by the backend.
///
/// `status` is kept as the raw wire value so an unexpected status from the
/// backend does not make the whole order unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: String,
    pub items: Vec<CartItem>,
    pub delivery: DeliveryDetails,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub total_amount: Price,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// The parsed status, or `None` if the backend sent an unknown value.
    #[must_use]
    pub fn known_status(&self) -> Option<OrderStatus> {
        OrderStatus::from_wire(&self.status)
    }

    /// Badge for the status, pending-styled when unknown.
    #[must_use]
    pub fn badge(&self) -> StatusBadge {
        StatusBadge::for_raw(&self.status)
    }
}
