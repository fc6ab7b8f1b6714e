use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bson::oid::ObjectId;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::AbortHandle;
use tracing::debug;

struct Timer {
    generation: u64,
    handle: AbortHandle,
}

/// One pending expiry task per channel. Scheduling again replaces the pending
/// task instead of stacking a second one.
#[derive(Default)]
pub struct ExpiryScheduler {
    timers: Arc<DashMap<ObjectId, Timer>>,
    next_generation: AtomicU64,
}

impl ExpiryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` after `delay` unless the channel is rescheduled or cancelled first.
    pub fn schedule<F>(&self, channel_id: ObjectId, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let timers = Arc::clone(&self.timers);

        // The entry stays locked until the new timer is stored, so the task
        // cannot look itself up before it is registered.
        let entry = self.timers.entry(channel_id);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Once deregistered the task can no longer be aborted by a reschedule.
            if timers
                .remove_if(&channel_id, |_, timer| timer.generation == generation)
                .is_none()
            {
                return;
            }
            task.await;
        })
        .abort_handle();

        let timer = Timer { generation, handle };
        match entry {
            Entry::Occupied(mut occupied) => {
                occupied.get().handle.abort();
                occupied.insert(timer);
                debug!(%channel_id, ?delay, "Expiry timer rescheduled");
            }
            Entry::Vacant(vacant) => {
                vacant.insert(timer);
                debug!(%channel_id, ?delay, "Expiry timer scheduled");
            }
        }
    }

    pub fn cancel(&self, channel_id: ObjectId) -> bool {
        match self.timers.remove(&channel_id) {
            Some((_, timer)) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, channel_id: ObjectId) -> bool {
        self.timers.contains_key(&channel_id)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn cancel_all(&self) {
        self.timers.retain(|_, timer| {
            timer.handle.abort();
            false
        });
    }
}

impl Drop for ExpiryScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
