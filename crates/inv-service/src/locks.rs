//! Per-id exclusive locks.
//!
//! A multi-step protocol over one item id holds its lock from first to
//! last step; operations on different ids never contend. There is no
//! global lock.

use std::sync::Arc;

use dashmap::DashMap;
use inv_core::Id;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub(crate) struct IdLocks {
    locks: Arc<DashMap<Id, Arc<Mutex<()>>>>,
}

impl IdLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: Id) -> OwnedMutexGuard<()> {
        // The dashmap shard guard must be dropped before awaiting.
        let lock = self.locks.entry(id).or_default().clone();
        lock.lock_owned().await
    }
}
