//! One cart store per signed-in shopper.

use std::sync::Arc;
use std::time::Duration;

use freshcatch_core::UserId;
use moka::future::Cache;
use tracing::debug;

use super::store::{CartStore, StoreError};
use crate::api::CartApi;

/// Stores idle for this long are dropped and reloaded on next use.
const IDLE_TTL: Duration = Duration::from_secs(30 * 60);
const MAX_STORES: u64 = 10_000;

/// Lazily loaded cart stores keyed by user.
#[derive(Clone)]
pub struct CartRegistry<A> {
    api: A,
    stores: Cache<UserId, Arc<CartStore<A>>>,
}

impl<A> CartRegistry<A>
where
    A: CartApi + Clone + 'static,
{
    pub fn new(api: A) -> Self {
        let stores = Cache::builder()
            .max_capacity(MAX_STORES)
            .time_to_idle(IDLE_TTL)
            .build();
        Self { api, stores }
    }

    /// The store for `owner`, loading it from the backend on first use.
    ///
    /// Concurrent first requests for the same user share one load.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Network`] if the initial fetch fails.
    pub async fn store(&self, owner: &UserId) -> Result<Arc<CartStore<A>>, StoreError> {
        self.stores
            .try_get_with(owner.clone(), async {
                debug!(user_id = %owner, "Loading cart store");
                CartStore::load(owner.clone(), self.api.clone())
                    .await
                    .map(Arc::new)
            })
            .await
            .map_err(StoreError::Network)
    }

    /// Forget a user's store so the next request reloads it.
    pub async fn evict(&self, owner: &UserId) {
        self.stores.invalidate(owner).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use freshcatch_core::ProductId;

    use super::*;
    use crate::api::ApiError;
    use crate::cart::store::tests::FakeCartApi;

    #[tokio::test]
    async fn test_same_user_gets_same_store() {
        let registry = CartRegistry::new(FakeCartApi::default());
        let owner = UserId::new("u1");

        let a = registry.store(&owner).await.unwrap();
        let b = registry.store(&owner).await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_evicted_store_reloads_backend_state() {
        let api = FakeCartApi::default();
        let registry = CartRegistry::new(api.clone());
        let owner = UserId::new("u1");

        let store = registry.store(&owner).await.unwrap();
        store.add_item(&ProductId::new("prawns"), 1).await.unwrap();
        registry.evict(&owner).await;

        let reloaded = registry.store(&owner).await.unwrap();
        assert!(!Arc::ptr_eq(&store, &reloaded));
        assert_eq!(reloaded.item_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let api = FakeCartApi::default();
        let registry = CartRegistry::new(api.clone());
        let owner = UserId::new("u1");

        api.fail_next(ApiError::RateLimited(2));
        assert!(matches!(
            registry.store(&owner).await,
            Err(StoreError::Network(_))
        ));
        assert!(registry.store(&owner).await.is_ok());
    }
}
