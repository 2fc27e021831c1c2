//! Per-item mutual exclusion
//!
//! A sync must hold its item's lock from before it reads the stored cursor
//! until its final unit of work commits. A second sync of the same item
//! waits and then starts from the advanced cursor. These locks cover tasks
//! within one process; the file lease from `Storage::lock_item` covers
//! other processes.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async locks keyed by provider item id
#[derive(Debug, Default)]
pub struct ItemLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ItemLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `item_id`
    pub async fn lock(&self, item_id: &str) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the DashMap shard is not held across the await
        let lock = self
            .locks
            .entry(item_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_item_is_exclusive() {
        let locks = Arc::new(ItemLocks::new());
        let guard = locks.lock("item-1").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("item-1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        let _again = tokio::time::timeout(Duration::from_millis(100), locks.lock("item-1"))
            .await
            .expect("released lock must be available again");
    }

    #[tokio::test]
    async fn test_different_items_do_not_block() {
        let locks = ItemLocks::new();
        let _a = locks.lock("item-a").await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock("item-b"))
            .await
            .expect("independent items must not contend");
    }
}
