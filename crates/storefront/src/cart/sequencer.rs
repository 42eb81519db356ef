//! Per-entity ordering of cart mutations.
//!
//! Mutations touching the same line run one after another; mutations on
//! different lines may overlap. A whole-cart mutation waits for every
//! in-flight line mutation and holds off new ones until it is done.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use freshcatch_core::{CartItemId, ProductId};
use tokio::sync::{
    Mutex as AsyncMutex, OwnedMutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

/// What a mutation touches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    /// An existing cart line.
    Line(CartItemId),
    /// A product that has no line yet.
    Product(ProductId),
    /// The whole cart.
    Cart,
}

type LockMap = Mutex<HashMap<EntityKey, Arc<AsyncMutex<()>>>>;

#[derive(Debug, Default)]
pub struct Sequencer {
    locks: LockMap,
    /// Shared by line mutations, exclusive for [`EntityKey::Cart`].
    cart: RwLock<()>,
}

impl Sequencer {
    /// Wait for every earlier mutation on `key` to finish.
    pub async fn acquire(&self, key: EntityKey) -> EntityGuard<'_> {
        // Taken before the entity lock so a queued clear cannot deadlock
        // against a line mutation.
        let (shared, exclusive) = if key == EntityKey::Cart {
            (None, Some(self.cart.write().await))
        } else {
            (Some(self.cart.read().await), None)
        };

        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.clone()).or_default())
        };

        EntityGuard {
            permit: Some(lock.lock_owned().await),
            key,
            locks: &self.locks,
            _shared: shared,
            _exclusive: exclusive,
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Held for the duration of one mutation.
pub struct EntityGuard<'a> {
    permit: Option<OwnedMutexGuard<()>>,
    key: EntityKey,
    locks: &'a LockMap,
    // Released after the entity lock, when the guard's fields drop.
    _shared: Option<RwLockReadGuard<'a, ()>>,
    _exclusive: Option<RwLockWriteGuard<'a, ()>>,
}

impl Drop for EntityGuard<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        self.permit.take();
        // Only the map still holds the lock: nobody is queued behind us.
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let sequencer = Arc::new(Sequencer::default());
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = sequencer.acquire(EntityKey::Cart).await;

        let waiter = {
            let sequencer = Arc::clone(&sequencer);
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                let _guard = sequencer.acquire(EntityKey::Cart).await;
                log.lock().unwrap().push("second");
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        log.lock().unwrap().push("first");
        drop(first);

        waiter.await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let sequencer = Sequencer::default();
        let _a = sequencer
            .acquire(EntityKey::Line(CartItemId::new("l1")))
            .await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            sequencer.acquire(EntityKey::Line(CartItemId::new("l2"))),
        )
        .await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_cart_waits_for_line_mutations() {
        let sequencer = Arc::new(Sequencer::default());
        let log = Arc::new(Mutex::new(Vec::new()));

        let line = sequencer
            .acquire(EntityKey::Line(CartItemId::new("l1")))
            .await;

        let clear = {
            let sequencer = Arc::clone(&sequencer);
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                let _guard = sequencer.acquire(EntityKey::Cart).await;
                log.lock().unwrap().push("clear");
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        log.lock().unwrap().push("line");
        drop(line);

        clear.await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["line", "clear"]);
    }

    #[tokio::test]
    async fn test_line_mutations_wait_for_cart() {
        let sequencer = Sequencer::default();
        let cart = sequencer.acquire(EntityKey::Cart).await;

        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            sequencer.acquire(EntityKey::Product(ProductId::new("pomfret"))),
        )
        .await;
        assert!(blocked.is_err());

        drop(cart);
        let line = tokio::time::timeout(
            Duration::from_millis(100),
            sequencer.acquire(EntityKey::Product(ProductId::new("pomfret"))),
        )
        .await;
        assert!(line.is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_are_forgotten() {
        let sequencer = Sequencer::default();
        {
            let _guard = sequencer.acquire(EntityKey::Cart).await;
            assert_eq!(sequencer.tracked(), 1);
        }
        assert_eq!(sequencer.tracked(), 0);
    }
}
