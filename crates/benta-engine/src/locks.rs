//! # Per-Product Locks
//!
//! Serializes stock-decrementing operations per product so two concurrent
//! sales cannot both pass the availability check and oversell.
//!
//! ```text
//! sale A (3 of p-1)  ──► lock(p-1) ──► check 5 >= 3 ──► commit ──► unlock
//! sale B (3 of p-1)  ──────────────────── waits ─────────────────► check 2 >= 3 ──► reject
//! ```
//!
//! Multi-product sales take their locks in ascending product-id order, which
//! rules out lock-ordering deadlocks between concurrent sales.
//!
//! Stock increments (restock, cancellation restore) are pure SQL deltas and
//! do not need a lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lock manager keyed by product id.
///
/// Lock entries are created on first use and kept for the process lifetime;
/// a busy store has at most a few thousand products, so the map stays small.
#[derive(Debug, Default)]
pub struct ProductLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ProductLocks {
    pub fn new() -> Self {
        ProductLocks::default()
    }

    fn entry(&self, product_id: &str) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(product_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Acquires the lock for one product.
    pub async fn acquire(&self, product_id: &str) -> OwnedMutexGuard<()> {
        self.entry(product_id).lock_owned().await
    }

    /// Acquires locks for a set of products in ascending id order.
    ///
    /// Duplicates are collapsed; the returned guards release on drop.
    pub async fn acquire_many(&self, product_ids: &[String]) -> Vec<OwnedMutexGuard<()>> {
        let mut ids: Vec<&String> = product_ids.iter().collect();
        ids.sort();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.acquire(id).await);
        }
        guards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_product_serializes() {
        let locks = Arc::new(ProductLocks::new());

        let guard = locks.acquire("p-1").await;

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.acquire("p-1").await;
        });

        // Holder still alive: the waiter must not finish yet
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn different_products_do_not_block() {
        let locks = ProductLocks::new();
        let _a = locks.acquire("p-1").await;
        let _b = locks.acquire("p-2").await;
    }

    #[tokio::test]
    async fn acquire_many_collapses_duplicates() {
        let locks = ProductLocks::new();
        let ids = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        let guards = locks.acquire_many(&ids).await;
        assert_eq!(guards.len(), 2);
    }
}
