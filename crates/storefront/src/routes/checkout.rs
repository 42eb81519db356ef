//! Checkout route handlers.

use axum::{Json, extract::State, http::StatusCode};
use freshcatch_core::{PaymentMethod, ValidationErrors};
use serde::Serialize;
use tracing::{error, instrument};

use super::orders::OrderView;
use crate::checkout::{
    CheckoutFlow, CheckoutForm, CheckoutSummary, PaymentInstructions, PlacedOrder, service_today,
};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// `GET /api/checkout` response.
#[derive(Debug, Serialize)]
pub struct CheckoutPage {
    pub summary: CheckoutSummary,
    pub form: CheckoutForm,
    pub address_locked: bool,
    pub payment_methods: [PaymentMethod; 2],
}

/// `POST /api/checkout` response.
#[derive(Debug, Serialize)]
pub struct CheckoutResult {
    pub order: OrderView,
    /// Missing when the instructions could not be built; `warning` says so.
    pub payment: Option<PaymentInstructions>,
    pub cart_cleared: bool,
    /// Shown to the shopper when the order went through but a follow-up
    /// step did not.
    pub warning: Option<String>,
}

impl CheckoutResult {
    /// The order exists at this point, so later failures only add warnings.
    fn new(placed: PlacedOrder, payment: std::result::Result<PaymentInstructions, askama::Error>) -> Self {
        let mut warnings = Vec::new();

        let payment = payment
            .inspect_err(|e| {
                error!(order_id = %placed.order.id, error = %e, "Payment instructions failed to render");
                warnings.push(
                    "Your order was placed, but payment details could not be prepared. Please contact us to pay.",
                );
            })
            .ok();

        if placed.cart_clear_error.is_some() {
            warnings.push(
                "Your order was placed, but your cart could not be emptied. Please remove the items yourself.",
            );
        }

        Self {
            order: placed.order.into(),
            payment,
            cart_cleared: placed.cart_clear_error.is_none(),
            warning: (!warnings.is_empty()).then(|| warnings.join(" ")),
        }
    }
}

/// Summary and pre-filled form.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<CheckoutPage>> {
    let store = state.carts().store(&user.user_id).await?;
    let profile = state.api().get_profile(&user.user_id).await?;
    let flow = CheckoutFlow::from_profile(&profile, state.service_area().clone());

    Ok(Json(CheckoutPage {
        summary: CheckoutFlow::summary(&store.snapshot()),
        form: flow.prefilled(),
        address_locked: flow.address_locked(),
        payment_methods: [PaymentMethod::Whatsapp, PaymentMethod::RazorpayLink],
    }))
}

/// Place the order.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn submit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<CheckoutResult>)> {
    let store = state.carts().store(&user.user_id).await?;

    // An empty cart never reaches the backend, not even for the profile.
    if store.snapshot().is_empty() {
        return Err(ValidationErrors::single("cart", "your cart is empty").into());
    }

    let profile = state.api().get_profile(&user.user_id).await?;
    let flow = CheckoutFlow::from_profile(&profile, state.service_area().clone());

    let placed = flow
        .submit(&form, service_today(), &*store, state.api())
        .await?;

    let payment = PaymentInstructions::for_order(&placed.order, &state.config().checkout);

    Ok((StatusCode::CREATED, Json(CheckoutResult::new(placed, payment))))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, TimeZone, Utc};
    use freshcatch_core::{
        Address, DeliveryDetails, DeliverySlot, Order, OrderId, Phone, Pincode, Price, ServiceArea,
    };

    use super::*;
    use crate::api::ApiError;
    use crate::cart::StoreError;

    fn placed(cart_clear_error: Option<StoreError>) -> PlacedOrder {
        PlacedOrder {
            order: Order {
                id: OrderId::new("FC-1042"),
                status: "pending".to_string(),
                items: Vec::new(),
                delivery: DeliveryDetails {
                    address: Address::within(
                        &ServiceArea::new("Mumbai", "Maharashtra"),
                        "12 Marine Drive",
                        Pincode::parse("400020").unwrap(),
                        None,
                    ),
                    phone: Phone::parse("9876543210").unwrap(),
                    date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
                    time: DeliverySlot::Morning,
                },
                payment_method: PaymentMethod::Whatsapp,
                total_amount: Price::from_paise(40_000),
                created_at: Utc.with_ymd_and_hms(2026, 10, 15, 9, 0, 0).unwrap(),
            },
            cart_clear_error,
        }
    }

    fn instructions() -> PaymentInstructions {
        PaymentInstructions::Whatsapp {
            link: "https://wa.me/919820012345".to_string(),
            message: "Order FC-1042".to_string(),
        }
    }

    #[test]
    fn test_clean_checkout_has_no_warning() {
        let result = CheckoutResult::new(placed(None), Ok(instructions()));
        assert_eq!(result.payment, Some(instructions()));
        assert!(result.cart_cleared);
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_unrenderable_payment_still_returns_order() {
        let result = CheckoutResult::new(placed(None), Err(askama::Error::Fmt));
        assert!(result.payment.is_none());
        assert!(result.cart_cleared);
        assert!(result.warning.unwrap().contains("payment details"));

        let json = serde_json::to_value(CheckoutResult::new(placed(None), Err(askama::Error::Fmt))).unwrap();
        assert_eq!(json["order"]["id"], "FC-1042");
        assert!(json["payment"].is_null());
    }

    #[test]
    fn test_both_follow_up_failures_are_reported() {
        let clear_failed = StoreError::Network(Arc::new(ApiError::RateLimited(1)));
        let result = CheckoutResult::new(placed(Some(clear_failed)), Err(askama::Error::Fmt));

        assert!(!result.cart_cleared);
        let warning = result.warning.unwrap();
        assert!(warning.contains("payment details"));
        assert!(warning.contains("cart could not be emptied"));
    }
}
