//! A shopper's cart, kept in step with the backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use freshcatch_core::{
    Cart, CartItemId, Price, ProductId, Quantity, QuantityError, UserId, ValidationErrors,
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::sequencer::{EntityKey, Sequencer};
use crate::api::{ApiError, CartApi};

/// Errors from cart mutations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Input rejected before anything was sent.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The line is not in the cart.
    #[error("cart item {0} not found")]
    NotFound(CartItemId),

    /// The backend call failed. Local state is unchanged.
    #[error("cart backend error: {0}")]
    Network(#[source] Arc<ApiError>),
}

impl From<ApiError> for StoreError {
    fn from(err: ApiError) -> Self {
        Self::Network(Arc::new(err))
    }
}

impl From<QuantityError> for StoreError {
    fn from(err: QuantityError) -> Self {
        Self::Validation(ValidationErrors::single("quantity", err.to_string()))
    }
}

/// Client-side cart for one user.
///
/// Every mutation goes to the backend first and is applied locally only
/// after the backend accepts it, so a failed call leaves the cart as it was.
/// Mutations on the same line are queued behind each other. A refresh that
/// started before a mutation committed is discarded rather than overwriting
/// the newer state.
pub struct CartStore<A> {
    owner: UserId,
    api: A,
    state: watch::Sender<Cart>,
    version: AtomicU64,
    sequencer: Sequencer,
}

impl<A: CartApi> CartStore<A> {
    /// An empty store that has not been synced yet.
    pub fn new(owner: UserId, api: A) -> Self {
        let (state, _) = watch::channel(Cart::empty(owner.clone()));
        Self {
            owner,
            api,
            state,
            version: AtomicU64::new(0),
            sequencer: Sequencer::default(),
        }
    }

    /// A store populated from the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cart cannot be fetched.
    pub async fn load(owner: UserId, api: A) -> Result<Self, ApiError> {
        let cart = api.fetch_cart(&owner).await?;
        let store = Self::new(owner, api);
        store.state.send_replace(cart);
        Ok(store)
    }

    /// Whose cart this is.
    pub const fn owner(&self) -> &UserId {
        &self.owner
    }

    /// A copy of the current cart.
    pub fn snapshot(&self) -> Cart {
        self.state.borrow().clone()
    }

    /// A copy of the current cart and the version it was taken at.
    pub fn versioned_snapshot(&self) -> (u64, Cart) {
        let cart = self.state.borrow();
        // Commits bump the version while holding the channel's write lock.
        (self.version.load(Ordering::Acquire), cart.clone())
    }

    /// Number of lines.
    pub fn item_count(&self) -> usize {
        self.state.borrow().item_count()
    }

    /// Sum of every line total.
    pub fn total_amount(&self) -> Price {
        self.state.borrow().total_amount()
    }

    /// Watch for committed changes.
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.state.subscribe()
    }

    /// Add portions of a product.
    ///
    /// If the product already has a line the backend merges into it.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] for a zero quantity (nothing is sent);
    /// [`StoreError::Network`] if the backend call fails.
    #[instrument(skip(self), fields(user_id = %self.owner))]
    pub async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<Cart, StoreError> {
        let quantity = Quantity::new(quantity)?;

        let key = self
            .state
            .borrow()
            .find_product(product_id)
            .map_or_else(
                || EntityKey::Product(product_id.clone()),
                |line| EntityKey::Line(line.id.clone()),
            );
        let _guard = self.sequencer.acquire(key).await;

        let line = self
            .api
            .add_item(&self.owner, product_id, quantity)
            .await
            .inspect_err(|e| warn!(error = %e, "Add to cart failed"))?;

        debug!(item_id = %line.id, quantity = line.quantity.get(), "Cart line added");
        Ok(self.commit(|cart| cart.upsert(line)))
    }

    /// Set the quantity of a line. Zero removes it.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the line is not in the cart (nothing is
    /// sent); [`StoreError::Network`] if the backend call fails.
    #[instrument(skip(self), fields(user_id = %self.owner))]
    pub async fn update_quantity(
        &self,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<Cart, StoreError> {
        let Ok(quantity) = Quantity::new(quantity) else {
            return self.remove_item(item_id).await;
        };

        let _guard = self.sequencer.acquire(EntityKey::Line(item_id.clone())).await;

        if self.state.borrow().get(item_id).is_none() {
            return Err(StoreError::NotFound(item_id.clone()));
        }

        match self.api.update_item(&self.owner, item_id, quantity).await {
            Ok(line) => Ok(self.commit(|cart| cart.upsert(line))),
            Err(ApiError::NotFound(_)) => {
                // Deleted elsewhere; drop our stale copy.
                warn!(item_id = %item_id, "Cart line vanished on the backend");
                self.commit(|cart| {
                    cart.remove(item_id);
                });
                Err(StoreError::NotFound(item_id.clone()))
            }
            Err(e) => {
                warn!(error = %e, "Cart quantity update failed");
                Err(e.into())
            }
        }
    }

    /// Delete a line. Removing a line that is not there succeeds without
    /// contacting the backend.
    ///
    /// # Errors
    ///
    /// [`StoreError::Network`] if the backend call fails.
    #[instrument(skip(self), fields(user_id = %self.owner))]
    pub async fn remove_item(&self, item_id: &CartItemId) -> Result<Cart, StoreError> {
        let _guard = self.sequencer.acquire(EntityKey::Line(item_id.clone())).await;

        if self.state.borrow().get(item_id).is_none() {
            return Ok(self.snapshot());
        }

        match self.api.remove_item(&self.owner, item_id).await {
            Ok(()) | Err(ApiError::NotFound(_)) => {}
            Err(e) => {
                warn!(error = %e, "Cart line removal failed");
                return Err(e.into());
            }
        }

        Ok(self.commit(|cart| {
            cart.remove(item_id);
        }))
    }

    /// Delete every line.
    ///
    /// # Errors
    ///
    /// [`StoreError::Network`] if the backend call fails.
    #[instrument(skip(self), fields(user_id = %self.owner))]
    pub async fn clear_cart(&self) -> Result<Cart, StoreError> {
        let _guard = self.sequencer.acquire(EntityKey::Cart).await;
        self.clear_locked().await
    }

    /// Take the lines of `ordered` out of the cart once they have been
    /// ordered.
    ///
    /// `seen` is the version `ordered` was taken at. If nothing committed
    /// since, the whole cart is cleared in one call; otherwise only the
    /// ordered lines are removed so later additions survive.
    ///
    /// # Errors
    ///
    /// [`StoreError::Network`] if a backend call fails. Lines removed before
    /// the failure stay removed.
    #[instrument(skip(self, ordered), fields(user_id = %self.owner))]
    pub async fn remove_ordered(&self, ordered: &Cart, seen: u64) -> Result<Cart, StoreError> {
        {
            let _guard = self.sequencer.acquire(EntityKey::Cart).await;
            if self.version.load(Ordering::Acquire) == seen {
                return self.clear_locked().await;
            }
        }

        debug!(lines = ordered.item_count(), "Cart changed since snapshot, removing ordered lines");
        let mut cart = self.snapshot();
        for line in &ordered.items {
            cart = self.remove_item(&line.id).await?;
        }
        Ok(cart)
    }

    async fn clear_locked(&self) -> Result<Cart, StoreError> {
        self.api
            .clear_cart(&self.owner)
            .await
            .inspect_err(|e| warn!(error = %e, "Clearing cart failed"))?;

        Ok(self.commit(Cart::clear))
    }

    /// Replace local state with the backend's copy.
    ///
    /// If a mutation commits while the fetch is in flight, the fetched cart
    /// is older than local state and is dropped.
    ///
    /// # Errors
    ///
    /// [`StoreError::Network`] if the backend call fails.
    #[instrument(skip(self), fields(user_id = %self.owner))]
    pub async fn refresh(&self) -> Result<Cart, StoreError> {
        let seen = self.version.load(Ordering::Acquire);
        let fresh = self.api.fetch_cart(&self.owner).await?;

        let applied = self.state.send_if_modified(|cart| {
            if self.version.load(Ordering::Acquire) != seen {
                return false;
            }
            *cart = fresh;
            self.version.fetch_add(1, Ordering::AcqRel);
            true
        });

        if !applied {
            debug!("Discarded stale cart refresh");
        }
        Ok(self.snapshot())
    }

    /// Apply a backend-confirmed change and notify subscribers.
    fn commit(&self, change: impl FnOnce(&mut Cart)) -> Cart {
        let mut committed = None;
        self.state.send_modify(|cart| {
            change(cart);
            self.version.fetch_add(1, Ordering::AcqRel);
            committed = Some(cart.clone());
        });
        committed.unwrap_or_else(|| self.snapshot())
    }
}

impl<A> std::fmt::Debug for CartStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("owner", &self.owner)
            .field("version", &self.version.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
