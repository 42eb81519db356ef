//! Order management route handlers.
//!
//! The status picker offers every status whatever the order's current one;
//! the backend decides whether a move is allowed and a refusal comes back
//! as 409.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use freshcatch_core::{Order, OrderId, OrderStatus, StatusBadge};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::types::StatusUpdate;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// An order with its status badge.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub badge: StatusBadge,
    /// Whether the lifecycle suggests the order can still move.
    pub open: bool,
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
        let open = OrderStatus::from_wire(&order.status).is_none_or(|s| !s.is_terminal());
        Self { order, badge, open }
    }
}

/// `GET /api/orders` query.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

impl ListQuery {
    /// The requested filter. An empty value means no filter.
    fn status(&self) -> Result<Option<OrderStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => OrderStatus::from_wire(raw).map(Some).ok_or_else(|| {
                AppError::Validation(freshcatch_core::ValidationErrors::single(
                    "status",
                    format!("unknown order status: {raw}"),
                ))
            }),
        }
    }
}

#[instrument(skip_all, fields(admin_id = %admin.user_id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderView>>> {
    let orders = state
        .api()
        .list_orders(&admin.user_id, query.status()?)
        .await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

#[instrument(skip_all, fields(admin_id = %admin.user_id, order_id = %order_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    let order = state.api().get_order(&admin.user_id, &order_id).await?;
    Ok(Json(order.into()))
}

/// Move an order to a new status.
#[instrument(skip_all, fields(admin_id = %admin.user_id, order_id = %order_id, status = %body.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(order_id): Path<OrderId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<OrderView>> {
    let order = state
        .api()
        .update_order_status(&admin.user_id, &order_id, body.status)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Status update failed"))?;

    tracing::info!("Order status updated");
    Ok(Json(order.into()))
}

/// Every status with its badge, for the status picker.
pub async fn status_options(RequireAdmin(_admin): RequireAdmin) -> Json<Vec<StatusBadge>> {
    Json(OrderStatus::ALL.into_iter().map(StatusBadge::for_status).collect())
}
