//! Per-entity lock registry
//!
//! Every mutating billing operation for a student must run serially, or two
//! concurrent payments could both read the same "already paid" total and
//! double-count. The registry hands out one owned async mutex per entity id;
//! guards are held across await points for the duration of the operation.
//!
//! Lock order is student before room. Admission takes only the room lock.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Registry of per-id async locks
#[derive(Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for an entity, creating it on first use
    pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of ids the registry currently tracks
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn serializes_same_id() {
        let registry = Arc::new(LockRegistry::new());
        let id = Uuid::new_v4();
        let counter = Arc::new(AtomicU32::new(0));
        let peak = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            let counter = counter.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _guard = registry.acquire(id).await;
                let inside = counter.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(inside, Ordering::SeqCst);
                tokio::task::yield_now().await;
                counter.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn distinct_ids_do_not_block() {
        let registry = LockRegistry::new();
        let a = registry.acquire(Uuid::new_v4()).await;
        let b = registry.acquire(Uuid::new_v4()).await;
        drop(a);
        drop(b);
        assert_eq!(registry.len(), 2);
    }
}
