//! Checkout form handling and order placement.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};
use freshcatch_core::{
    Address, Cart, DeliveryDetails, DeliverySlot, Order, OrderSubmission, PaymentMethod, Phone,
    Pincode, Price, ServiceArea, UserProfile, ValidationErrors,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, CartApi, OrderApi};
use crate::cart::{CartStore, StoreError};

/// Where a shopper edits a locked address.
pub const PROFILE_EDIT_PATH: &str = "/api/profile";

/// India Standard Time, UTC+05:30.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Today's date where deliveries happen.
#[must_use]
pub fn service_today() -> NaiveDate {
    let now = Utc::now();
    FixedOffset::east_opt(IST_OFFSET_SECS)
        .map_or_else(|| now.date_naive(), |ist| now.with_timezone(&ist).date_naive())
}

/// Errors from [`CheckoutFlow::submit`].
#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    /// Form or cart problems; nothing was sent.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The order could not be created. The cart is untouched.
    #[error("order creation failed: {0}")]
    Network(#[source] Arc<ApiError>),
}

/// Delivery and payment choices as entered by the shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub street: String,
    pub pincode: String,
    pub landmark: Option<String>,
    pub phone: String,
    pub date: Option<NaiveDate>,
    pub time: Option<DeliverySlot>,
    pub payment_method: PaymentMethod,
}

/// One line of the order summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub name: String,
    pub quantity: String,
    pub unit_price: Price,
    pub line_total: Price,
}

/// What the shopper is about to pay for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSummary {
    pub lines: Vec<SummaryLine>,
    pub item_count: usize,
    pub total: Price,
}

/// Result of a successful checkout.
#[derive(Debug)]
pub struct PlacedOrder {
    pub order: Order,
    /// Set when the order was created but emptying the cart afterwards failed.
    pub cart_clear_error: Option<StoreError>,
}

/// Checkout for one shopper.
///
/// When the profile already has an address it is locked: the form may repeat
/// it but not change it. Changes go through the profile.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    area: ServiceArea,
    locked_address: Option<Address>,
    saved_phone: Option<Phone>,
}

impl CheckoutFlow {
    /// Checkout with nothing pre-filled.
    #[must_use]
    pub const fn new(area: ServiceArea) -> Self {
        Self {
            area,
            locked_address: None,
            saved_phone: None,
        }
    }

    /// Checkout pre-filled from the shopper's profile.
    #[must_use]
    pub fn from_profile(profile: &UserProfile, area: ServiceArea) -> Self {
        let locked_address = profile
            .address
            .clone()
            .map(|address| address.pinned_to(&area));
        Self {
            area,
            locked_address,
            saved_phone: profile.phone.clone(),
        }
    }

    #[must_use]
    pub const fn address_locked(&self) -> bool {
        self.locked_address.is_some()
    }

    /// A form filled with what the profile already knows.
    #[must_use]
    pub fn prefilled(&self) -> CheckoutForm {
        let mut form = CheckoutForm::default();
        if let Some(address) = &self.locked_address {
            form.street.clone_from(&address.street);
            form.pincode = address.pincode.to_string();
            form.landmark.clone_from(&address.landmark);
        }
        if let Some(phone) = &self.saved_phone {
            form.phone = phone.to_string();
        }
        form
    }

    /// Check every field and return the delivery details.
    ///
    /// # Errors
    ///
    /// Returns all field problems at once.
    pub fn validate(
        &self,
        form: &CheckoutForm,
        today: NaiveDate,
    ) -> Result<DeliveryDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let address = match &self.locked_address {
            Some(locked) => {
                if Self::edits_locked_address(form, locked) {
                    errors.add(
                        "address",
                        format!(
                            "Your delivery address comes from your profile; change it at {PROFILE_EDIT_PATH}"
                        ),
                    );
                }
                Some(locked.clone())
            }
            None => {
                let street = form.street.trim();
                if street.is_empty() {
                    errors.add("street", "street address is required");
                }
                let pincode = errors.check("pincode", Pincode::parse(&form.pincode));
                pincode
                    .filter(|_| !street.is_empty())
                    .map(|pincode| Address::within(&self.area, street, pincode, form.landmark.clone()))
            }
        };

        let phone = if form.phone.trim().is_empty() {
            match &self.saved_phone {
                Some(saved) => Some(saved.clone()),
                None => errors.check("phone", Phone::parse(&form.phone)),
            }
        } else {
            errors.check("phone", Phone::parse(&form.phone))
        };

        match form.date {
            None => errors.add("date", "delivery date is required"),
            Some(date) if date < today => errors.add("date", "delivery date cannot be in the past"),
            Some(_) => {}
        }
        if form.time.is_none() {
            errors.add("time", "delivery time is required");
        }

        match (address, phone, form.date, form.time) {
            (Some(address), Some(phone), Some(date), Some(time)) if errors.is_empty() => {
                Ok(DeliveryDetails {
                    address,
                    phone,
                    date,
                    time,
                })
            }
            _ => Err(errors),
        }
    }

    /// A non-empty field that differs from the locked address is an edit.
    fn edits_locked_address(form: &CheckoutForm, locked: &Address) -> bool {
        let street = form.street.trim();
        let pincode = form.pincode.trim();
        let landmark = form.landmark.as_deref().map(str::trim).unwrap_or_default();

        (!street.is_empty() && street != locked.street)
            || (!pincode.is_empty() && pincode != locked.pincode.as_str())
            || (!landmark.is_empty() && Some(landmark) != locked.landmark.as_deref())
    }

    /// Line totals, item count and total for `cart`.
    #[must_use]
    pub fn summary(cart: &Cart) -> CheckoutSummary {
        CheckoutSummary {
            lines: cart
                .items
                .iter()
                .map(|item| SummaryLine {
                    name: item.product.name.clone(),
                    quantity: item.quantity.to_string(),
                    unit_price: item.product.unit_price,
                    line_total: item.line_total(),
                })
                .collect(),
            item_count: cart.item_count(),
            total: cart.total_amount(),
        }
    }

    /// Freeze the cart together with delivery and payment choices.
    #[must_use]
    pub fn build_submission(
        cart: &Cart,
        delivery: DeliveryDetails,
        payment_method: PaymentMethod,
    ) -> OrderSubmission {
        OrderSubmission::from_cart(cart, delivery, payment_method)
    }

    /// Validate, create the order, then take the ordered lines out of the
    /// cart. Lines added while the order was being created stay.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::Validation`] for an empty cart or bad form, before
    /// anything is sent. [`CheckoutError::Network`] if creating the order
    /// fails, in which case the cart is left as it was so the shopper can
    /// retry.
    #[instrument(skip_all, fields(user_id = %store.owner()))]
    pub async fn submit<C, O>(
        &self,
        form: &CheckoutForm,
        today: NaiveDate,
        store: &CartStore<C>,
        orders: &O,
    ) -> Result<PlacedOrder, CheckoutError>
    where
        C: CartApi,
        O: OrderApi,
    {
        let (seen, cart) = store.versioned_snapshot();

        let delivery = match self.validate(form, today) {
            Ok(delivery) if !cart.is_empty() => delivery,
            result => {
                let mut errors = result.err().unwrap_or_default();
                if cart.is_empty() {
                    errors.add("cart", "your cart is empty");
                }
                return Err(CheckoutError::Validation(errors));
            }
        };

        let submission = Self::build_submission(&cart, delivery, form.payment_method);

        let order = orders
            .create_order(store.owner(), &submission)
            .await
            .map_err(|e| {
                warn!(error = %e, "Order creation failed, cart kept");
                CheckoutError::Network(Arc::new(e))
            })?;

        info!(
            order_id = %order.id,
            total = %submission.total_amount(),
            payment_method = ?submission.payment_method(),
            "Order placed"
        );

        // Only what was ordered leaves the cart.
        let cart_clear_error = match store.remove_ordered(&cart, seen).await {
            Ok(_) => None,
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Order placed but cart was not cleared");
                Some(e)
            }
        };

        Ok(PlacedOrder {
            order,
            cart_clear_error,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;
    use freshcatch_core::{Email, OrderId, ProductId, Role, UserId};
    use tokio::sync::Notify;

    use super::*;
    use crate::cart::FakeCartApi;

    #[derive(Default)]
    struct FakeOrders {
        calls: AtomicUsize,
        fail: Mutex<Option<ApiError>>,
        received: Mutex<Vec<OrderSubmission>>,
        /// Signalled when `create_order` starts; the call then waits on `release`.
        started: Option<Arc<Notify>>,
        release: Option<Arc<Notify>>,
    }

    impl OrderApi for FakeOrders {
        async fn create_order(
            &self,
            _owner: &UserId,
            submission: &OrderSubmission,
        ) -> Result<Order, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.fail.lock().unwrap().take() {
                return Err(err);
            }
            self.received.lock().unwrap().push(submission.clone());
            if let (Some(started), Some(release)) = (&self.started, &self.release) {
                started.notify_one();
                release.notified().await;
            }
            Ok(Order {
                id: OrderId::new("o1"),
                status: "pending".to_string(),
                items: submission.items().to_vec(),
                delivery: submission.delivery().clone(),
                payment_method: submission.payment_method(),
                total_amount: submission.total_amount(),
                created_at: Utc.with_ymd_and_hms(2026, 10, 15, 9, 0, 0).unwrap(),
            })
        }

        async fn list_orders(&self, _owner: &UserId) -> Result<Vec<Order>, ApiError> {
            Ok(Vec::new())
        }

        async fn get_order(&self, _owner: &UserId, id: &OrderId) -> Result<Order, ApiError> {
            Err(ApiError::NotFound(format!("order {id}")))
        }
    }

    fn area() -> ServiceArea {
        ServiceArea::new("Mumbai", "Maharashtra")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            street: "12 Marine Drive".to_string(),
            pincode: "400020".to_string(),
            landmark: None,
            phone: "98765 43210".to_string(),
            date: Some(today()),
            time: Some(DeliverySlot::Morning),
            payment_method: PaymentMethod::Whatsapp,
        }
    }

    fn profile(address: Option<Address>) -> UserProfile {
        UserProfile {
            id: UserId::new("u1"),
            name: "Asha".to_string(),
            email: Email::parse("asha@example.com").unwrap(),
            phone: Some(Phone::parse("9123456780").unwrap()),
            role: Role::User,
            verified: true,
            address,
        }
    }

    async fn filled_store() -> (CartStore<FakeCartApi>, FakeCartApi) {
        let api = FakeCartApi::default();
        let store = CartStore::new(UserId::new("u1"), api.clone());
        store.add_item(&ProductId::new("pomfret"), 2).await.unwrap();
        (store, api)
    }

    #[test]
    fn test_validate_collects_every_field_error() {
        let flow = CheckoutFlow::new(area());
        let bad = CheckoutForm {
            street: "  ".to_string(),
            pincode: "01234".to_string(),
            phone: "5123456789".to_string(),
            date: Some(today().pred_opt().unwrap()),
            time: None,
            ..CheckoutForm::default()
        };

        let errors = flow.validate(&bad, today()).unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, vec!["date", "phone", "pincode", "street", "time"]);
    }

    #[test]
    fn test_validate_builds_address_in_service_area() {
        let flow = CheckoutFlow::new(area());
        let delivery = flow.validate(&form(), today()).unwrap();

        assert_eq!(delivery.address.city, "Mumbai");
        assert_eq!(delivery.address.state, "Maharashtra");
        assert_eq!(delivery.phone.as_str(), "9876543210");
    }

    #[test]
    fn test_profile_address_is_locked() {
        let saved = Address::within(&area(), "4 Carter Road", Pincode::parse("400050").unwrap(), None);
        let flow = CheckoutFlow::from_profile(&profile(Some(saved.clone())), area());
        assert!(flow.address_locked());

        // Repeating it, or leaving it blank, is fine.
        let mut same = flow.prefilled();
        same.date = Some(today());
        same.time = Some(DeliverySlot::Evening);
        assert_eq!(flow.validate(&same, today()).unwrap().address, saved);

        let blank = CheckoutForm {
            street: String::new(),
            pincode: String::new(),
            ..same.clone()
        };
        assert_eq!(flow.validate(&blank, today()).unwrap().address, saved);

        // Changing it is not.
        let edited = CheckoutForm {
            street: "99 Linking Road".to_string(),
            ..same
        };
        let errors = flow.validate(&edited, today()).unwrap_err();
        assert!(errors.field("address")[0].contains(PROFILE_EDIT_PATH));
    }

    #[test]
    fn test_profile_without_address_is_not_locked() {
        let flow = CheckoutFlow::from_profile(&profile(None), area());
        assert!(!flow.address_locked());
        assert_eq!(flow.prefilled().phone, "9123456780");
    }

    #[test]
    fn test_saved_phone_fills_blank_field() {
        let flow = CheckoutFlow::from_profile(&profile(None), area());
        let mut f = form();
        f.phone = String::new();
        assert_eq!(flow.validate(&f, today()).unwrap().phone.as_str(), "9123456780");
    }

    #[tokio::test]
    async fn test_summary_matches_cart() {
        let (store, _) = filled_store().await;
        store.add_item(&ProductId::new("prawns"), 1).await.unwrap();

        let summary = CheckoutFlow::summary(&store.snapshot());
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.total, Price::from_paise(178_000));
        assert_eq!(summary.lines[0].quantity, "500 g");
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected_before_any_call() {
        let api = FakeCartApi::default();
        let store = CartStore::new(UserId::new("u1"), api.clone());
        let orders = FakeOrders::default();

        let err = CheckoutFlow::new(area())
            .submit(&form(), today(), &store, &orders)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Validation(ref e) if !e.field("cart").is_empty()));
        assert_eq!(orders.calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_form_is_rejected_before_any_call() {
        let (store, _) = filled_store().await;
        let orders = FakeOrders::default();
        let mut f = form();
        f.phone = "12345".to_string();

        let err = CheckoutFlow::new(area())
            .submit(&f, today(), &store, &orders)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Validation(_)));
        assert_eq!(orders.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_checkout_snapshots_and_clears_cart() {
        let (store, _) = filled_store().await;
        let before = store.snapshot();
        let orders = FakeOrders::default();

        let placed = CheckoutFlow::new(area())
            .submit(&form(), today(), &store, &orders)
            .await
            .unwrap();

        assert!(placed.cart_clear_error.is_none());
        assert_eq!(placed.order.total_amount, Price::from_paise(130_000));
        assert!(store.snapshot().is_empty());

        let sent = orders.received.lock().unwrap();
        assert_eq!(sent[0].items(), before.items.as_slice());
    }

    #[tokio::test]
    async fn test_failed_order_keeps_cart() {
        let (store, api) = filled_store().await;
        let before = store.snapshot();
        let orders = FakeOrders::default();
        *orders.fail.lock().unwrap() = Some(ApiError::Rejected {
            status: 503,
            message: "down".to_string(),
        });
        let calls_before = api.calls();

        let err = CheckoutFlow::new(area())
            .submit(&form(), today(), &store, &orders)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Network(_)));
        assert_eq!(store.snapshot(), before);
        assert_eq!(api.calls(), calls_before);
    }

    #[tokio::test]
    async fn test_clear_failure_after_order_is_surfaced() {
        let (store, api) = filled_store().await;
        let orders = FakeOrders::default();
        api.fail_next(ApiError::RateLimited(1));

        let placed = CheckoutFlow::new(area())
            .submit(&form(), today(), &store, &orders)
            .await
            .unwrap();

        assert_eq!(placed.order.id.as_str(), "o1");
        assert!(matches!(placed.cart_clear_error, Some(StoreError::Network(_))));
        assert_eq!(store.item_count(), 1);
    }

    #[tokio::test]
    async fn test_lines_added_during_order_survive() {
        let (store, api) = filled_store().await;
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let orders = FakeOrders {
            started: Some(Arc::clone(&started)),
            release: Some(Arc::clone(&release)),
            ..FakeOrders::default()
        };
        let flow = CheckoutFlow::new(area());

        let form = form();
        let (placed, ()) = tokio::join!(flow.submit(&form, today(), &store, &orders), async {
            started.notified().await;
            store.add_item(&ProductId::new("prawns"), 1).await.unwrap();
            release.notify_one();
        });
        let placed = placed.unwrap();

        assert!(placed.cart_clear_error.is_none());
        assert_eq!(placed.order.items.len(), 1);
        assert_eq!(placed.order.items[0].product_id.as_str(), "pomfret");

        let left = store.snapshot();
        assert_eq!(left.item_count(), 1);
        assert_eq!(left.items[0].product_id.as_str(), "prawns");
        assert_eq!(api.items(), left.items);
    }
}
