use std::sync::Arc;

use bson::oid::ObjectId;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-entity write locks. Read-modify-write passes over a single document
/// (submissions, leaderboard rebuilds, team updates) serialize here so two
/// handlers cannot interleave a load and a replace of the same entity.
#[derive(Default)]
pub struct LockRegistry {
    locks: DashMap<ObjectId, Arc<Mutex<()>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: ObjectId) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
