//! Channel creation, activity tracking and inactivity expiry.

pub mod scheduler;
pub mod sweeper;

use std::sync::{Arc, Weak};
use std::time::Duration;

use bson::{oid::ObjectId, DateTime};
use huddle_config::{ChannelSettings, ExpiryMode};
use huddle_db::models::{Channel, ChannelMember};
use tracing::{debug, info, warn};

use crate::dao::base::DaoError;
use crate::error::{ChatError, ChatResult};
use crate::moderation::{ChannelGuard, ChannelLocks};
use crate::realtime::{ChatEvent, DeletionReason, Dispatcher, Topic};
use crate::store::ChatStore;

pub use scheduler::ExpiryScheduler;
pub use sweeper::spawn_sweeper;

/// What an expiry check found once it held the channel lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The channel was stale and has been deleted.
    Expired,
    /// The channel saw activity inside the threshold and was kept.
    Active,
    /// The channel no longer existed.
    Gone,
}

pub struct ChannelLifecycle {
    store: Arc<dyn ChatStore>,
    locks: Arc<ChannelLocks>,
    dispatcher: Dispatcher,
    settings: ChannelSettings,
    scheduler: ExpiryScheduler,
    this: Weak<ChannelLifecycle>,
}

impl ChannelLifecycle {
    pub fn new(
        store: Arc<dyn ChatStore>,
        locks: Arc<ChannelLocks>,
        dispatcher: Dispatcher,
        settings: ChannelSettings,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            store,
            locks,
            dispatcher,
            settings,
            scheduler: ExpiryScheduler::new(),
            this: this.clone(),
        })
    }

    pub fn settings(&self) -> &ChannelSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &ExpiryScheduler {
        &self.scheduler
    }

    /// Everything last active strictly before this instant is stale.
    pub fn stale_cutoff(&self) -> DateTime {
        let threshold_ms = i64::try_from(self.settings.inactivity_threshold().as_millis())
            .unwrap_or(i64::MAX);
        DateTime::from_millis(DateTime::now().timestamp_millis().saturating_sub(threshold_ms))
    }

    /// Creates a channel owned by `owner_id`, replacing a stale channel of the same name.
    pub async fn create(
        &self,
        name: &str,
        description: Option<String>,
        is_private: bool,
        owner_id: ObjectId,
    ) -> ChatResult<Channel> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::InvalidState("channel name is required".to_string()));
        }

        if let Some(existing) = self.store.find_channel_by_name(name).await? {
            if self.expire_if_stale(existing.id).await? == Expiry::Active {
                return Err(ChatError::NameConflict);
            }
        }

        let channel = Channel::new(name.to_string(), description, is_private, owner_id);
        let owner = ChannelMember::new(channel.id, owner_id, false);
        match self.store.insert_channel(&channel, &owner).await {
            Ok(()) => {}
            Err(DaoError::DuplicateKey(_)) => return Err(ChatError::NameConflict),
            Err(e) => return Err(e.into()),
        }

        info!(channel_id = %channel.id, name = %channel.name, is_private, "Channel created");
        self.arm(channel.id, self.settings.inactivity_threshold());
        Ok(channel)
    }

    /// Records activity on the channel. In timer mode this also pushes its expiry back.
    pub async fn touch(&self, channel_id: ObjectId) -> ChatResult<DateTime> {
        let now = DateTime::now();
        self.touch_at(channel_id, now).await?;
        Ok(now)
    }

    pub async fn touch_at(&self, channel_id: ObjectId, at: DateTime) -> ChatResult<()> {
        self.store.touch_channel(channel_id, at).await?;
        self.arm(channel_id, self.settings.inactivity_threshold());
        Ok(())
    }

    /// Deletes every stale channel. Returns how many were removed.
    pub async fn sweep(&self) -> ChatResult<usize> {
        let stale = self.store.find_stale_channels(self.stale_cutoff()).await?;
        let mut removed = 0;
        for channel in stale {
            match self.expire_if_stale(channel.id).await {
                Ok(Expiry::Expired) => removed += 1,
                Ok(_) => {}
                Err(e) => warn!(channel_id = %channel.id, %e, "Failed to expire channel"),
            }
        }
        if removed > 0 {
            info!(removed, "Inactive channels swept");
        }
        Ok(removed)
    }

    /// Re-checks staleness under the channel lock and deletes the channel if it
    /// is still stale.
    pub async fn expire_if_stale(&self, channel_id: ObjectId) -> ChatResult<Expiry> {
        let guard = self.locks.lock(channel_id).await;
        let channel = match self.store.find_channel(channel_id).await {
            Ok(channel) => channel,
            Err(DaoError::NotFound) => return Ok(Expiry::Gone),
            Err(e) => return Err(e.into()),
        };
        if !channel.is_stale(self.stale_cutoff()) {
            return Ok(Expiry::Active);
        }
        self.delete_locked(guard, &channel, DeletionReason::Expired).await?;
        Ok(Expiry::Expired)
    }

    /// Deletes the channel, its memberships, bans, votes and messages, then tells
    /// every former member. Members are read before the delete so they can be notified.
    pub async fn delete_locked(
        &self,
        guard: ChannelGuard,
        channel: &Channel,
        reason: DeletionReason,
    ) -> ChatResult<()> {
        debug_assert_eq!(guard.channel_id(), channel.id);
        let members = self.store.find_members(channel.id).await?;
        if !self.store.delete_channel(channel.id).await? {
            return Err(ChatError::NotFound("channel"));
        }
        self.scheduler.cancel(channel.id);

        let event = ChatEvent::ChannelDeleted {
            channel_id: channel.id.to_hex(),
            name: channel.name.clone(),
            reason,
        };
        self.dispatcher
            .publish_to_channel_and_users(channel.id, members.iter().map(|m| m.user_id), &event);
        self.dispatcher.registry().drop_topic(Topic::Channel(channel.id));

        drop(guard);
        self.locks.forget(channel.id);
        info!(channel_id = %channel.id, name = %channel.name, ?reason, "Channel deleted");
        Ok(())
    }

    /// Installs expiry timers for channels that exist at startup.
    pub async fn rearm_all(&self) -> ChatResult<usize> {
        if self.settings.expiry_mode != ExpiryMode::Timer {
            return Ok(0);
        }
        // Every channel is older than the far future.
        let channels = self
            .store
            .find_stale_channels(DateTime::from_millis(i64::MAX))
            .await?;
        let now = DateTime::now().timestamp_millis();
        let threshold = self.settings.inactivity_threshold();
        for channel in &channels {
            let idle = u64::try_from(now - channel.last_active_at.timestamp_millis()).unwrap_or(0);
            let remaining = threshold.saturating_sub(Duration::from_millis(idle));
            self.arm(channel.id, remaining);
        }
        Ok(channels.len())
    }

    fn arm(&self, channel_id: ObjectId, delay: Duration) {
        if self.settings.expiry_mode != ExpiryMode::Timer {
            return;
        }
        let this = self.this.clone();
        // A little slack so the task sees the channel as strictly older than the cutoff.
        let delay = delay + Duration::from_millis(5);
        self.scheduler.schedule(channel_id, delay, async move {
            let Some(lifecycle) = this.upgrade() else {
                return;
            };
            match lifecycle.expire_if_stale(channel_id).await {
                Ok(Expiry::Expired) => {}
                Ok(Expiry::Active) => debug!(%channel_id, "Expiry timer fired for an active channel"),
                Ok(Expiry::Gone) => debug!(%channel_id, "Expiry timer fired for a deleted channel"),
                Err(e) => warn!(%channel_id, %e, "Expiry timer failed"),
            }
        });
    }
}
