//! Order history route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use freshcatch_core::{Order, OrderId, StatusBadge};
use serde::Serialize;
use tracing::instrument;

use crate::api::OrderApi;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// An order with its status badge.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub badge: StatusBadge,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let badge = order.badge();
        if !badge.recognized {
            tracing::warn!(
                order_id = %order.id,
                status = %order.status,
                "Order has an unrecognized status, showing it as pending"
            );
        }
        Self { order, badge }
    }
}

/// The shopper's orders.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<OrderView>>> {
    let orders = state.api().list_orders(&user.user_id).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// One of the shopper's orders.
#[instrument(skip_all, fields(user_id = %user.user_id, order_id = %order_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    let order = state.api().get_order(&user.user_id, &order_id).await?;
    Ok(Json(order.into()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use freshcatch_core::{
        Address, DeliveryDetails, DeliverySlot, OrderStatus, PaymentMethod, Phone, Pincode, Price,
        ServiceArea,
    };

    use super::*;

    fn order(status: &str) -> Order {
        Order {
            id: OrderId::new("o1"),
            status: status.to_string(),
            items: Vec::new(),
            delivery: DeliveryDetails {
                address: Address::within(
                    &ServiceArea::new("Mumbai", "Maharashtra"),
                    "1 Bandstand",
                    Pincode::parse("400050").unwrap(),
                    None,
                ),
                phone: Phone::parse("9876543210").unwrap(),
                date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
                time: DeliverySlot::Evening,
            },
            payment_method: PaymentMethod::Whatsapp,
            total_amount: Price::ZERO,
            created_at: Utc.with_ymd_and_hms(2026, 10, 15, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_known_status_badge() {
        let view = OrderView::from(order("out-for-delivery"));
        assert!(view.badge.recognized);
        assert_eq!(view.badge.display, OrderStatus::OutForDelivery.display());
    }

    #[test]
    fn test_unknown_status_renders_as_pending() {
        let view = OrderView::from(order("lost-at-sea"));
        assert!(!view.badge.recognized);
        assert_eq!(view.badge.status, "lost-at-sea");
        assert_eq!(view.badge.display, OrderStatus::Pending.display());

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "lost-at-sea");
        assert_eq!(json["badge"]["label"], OrderStatus::Pending.display().label);
    }
}
