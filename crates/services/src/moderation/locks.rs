use std::sync::Arc;

use bson::oid::ObjectId;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-channel mutual exclusion for membership, ban and vote mutations.
#[derive(Default)]
pub struct ChannelLocks {
    locks: DashMap<ObjectId, Arc<Mutex<()>>>,
}

/// Proof that the holder has exclusive access to one channel's moderation state.
pub struct ChannelGuard {
    channel_id: ObjectId,
    _guard: OwnedMutexGuard<()>,
}

impl ChannelGuard {
    pub fn channel_id(&self) -> ObjectId {
        self.channel_id
    }
}

impl ChannelLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, channel_id: ObjectId) -> ChannelGuard {
        // Clone out of the map so no shard lock is held across the await.
        let mutex = self.locks.entry(channel_id).or_default().clone();
        ChannelGuard {
            channel_id,
            _guard: mutex.lock_owned().await,
        }
    }

    /// Drops the lock entry of a deleted channel unless someone is still using it.
    pub fn forget(&self, channel_id: ObjectId) {
        self.locks
            .remove_if(&channel_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
