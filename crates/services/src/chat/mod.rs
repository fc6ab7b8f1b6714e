//! Command facade called by transports. Each command validates against the
//! current membership state, persists through the store and then fans out.

mod channels;
mod direct;
mod messages;
mod presence;

use std::collections::HashMap;
use std::sync::Arc;

use bson::oid::ObjectId;
use huddle_config::ChannelSettings;
use huddle_db::models::{Channel, User};
use regex::Regex;

use crate::dao::base::DaoError;
use crate::error::{ChatError, ChatResult};
use crate::lifecycle::ChannelLifecycle;
use crate::moderation::{ChannelGuard, ChannelLocks, MembershipStore, VoteKickCoordinator};
use crate::realtime::{Dispatcher, SubscriptionRegistry};
use crate::store::ChatStore;

pub use channels::{CancelOutcome, KickOutcome};
pub use direct::ConversationSummary;

pub struct ChatService {
    store: Arc<dyn ChatStore>,
    registry: Arc<SubscriptionRegistry>,
    dispatcher: Dispatcher,
    locks: Arc<ChannelLocks>,
    membership: Arc<MembershipStore>,
    votes: VoteKickCoordinator,
    lifecycle: Arc<ChannelLifecycle>,
    mention_pattern: Regex,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn ChatStore>,
        registry: Arc<SubscriptionRegistry>,
        settings: ChannelSettings,
    ) -> Self {
        let dispatcher = Dispatcher::new(registry.clone());
        let locks = Arc::new(ChannelLocks::new());
        let membership = Arc::new(MembershipStore::new(store.clone()));
        let votes = VoteKickCoordinator::new(
            store.clone(),
            membership.clone(),
            dispatcher.clone(),
            settings.kick_vote_quorum,
        );
        let lifecycle = ChannelLifecycle::new(
            store.clone(),
            locks.clone(),
            dispatcher.clone(),
            settings,
        );
        Self {
            store,
            registry,
            dispatcher,
            locks,
            membership,
            votes,
            lifecycle,
            mention_pattern: Regex::new(r"@(\w+)").expect("valid mention pattern"),
        }
    }

    pub fn store(&self) -> &Arc<dyn ChatStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn lifecycle(&self) -> &Arc<ChannelLifecycle> {
        &self.lifecycle
    }

    async fn load_channel(&self, channel_id: ObjectId) -> ChatResult<Channel> {
        match self.store.find_channel(channel_id).await {
            Ok(channel) => Ok(channel),
            Err(DaoError::NotFound) => Err(ChatError::NotFound("channel")),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_user(&self, user_id: ObjectId) -> ChatResult<User> {
        match self.store.find_user(user_id).await {
            Ok(user) => Ok(user),
            Err(DaoError::NotFound) => Err(ChatError::NotFound("user")),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads several users at once; unknown ids are skipped.
    async fn load_users(&self, user_ids: impl IntoIterator<Item = ObjectId>) -> ChatResult<HashMap<ObjectId, User>> {
        let mut users = HashMap::new();
        for user_id in user_ids {
            if users.contains_key(&user_id) {
                continue;
            }
            match self.store.find_user(user_id).await {
                Ok(user) => {
                    users.insert(user_id, user);
                }
                Err(DaoError::NotFound) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(users)
    }

    /// Locks the channel and re-reads it, so checks see the state the mutation will apply to.
    async fn lock_channel(&self, channel_id: ObjectId) -> ChatResult<(ChannelGuard, Channel)> {
        let guard = self.locks.lock(channel_id).await;
        let channel = self.load_channel(channel_id).await?;
        Ok((guard, channel))
    }

    async fn ensure_member(&self, channel: &Channel, user_id: ObjectId) -> ChatResult<()> {
        if self.membership.is_member(channel, user_id).await? {
            Ok(())
        } else {
            Err(ChatError::NotAMember)
        }
    }

    /// Public channels are readable by anyone; private ones by members only.
    async fn ensure_visible(&self, channel: &Channel, user_id: ObjectId) -> ChatResult<()> {
        if channel.is_private && !self.membership.is_member(channel, user_id).await? {
            return Err(ChatError::Forbidden("this channel is private".to_string()));
        }
        Ok(())
    }

    fn ensure_owner(channel: &Channel, user_id: ObjectId, action: &str) -> ChatResult<()> {
        if channel.is_owner(user_id) {
            Ok(())
        } else {
            Err(ChatError::Forbidden(format!("only the channel owner can {action}")))
        }
    }
}

fn require_content(content: &str) -> ChatResult<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ChatError::InvalidState("message content is empty".to_string()));
    }
    Ok(content.to_string())
}
