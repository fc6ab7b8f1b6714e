use std::sync::Arc;

use bson::oid::ObjectId;
use huddle_db::models::{BanType, Channel, ChannelBan, ChannelMember};
use tracing::info;

use super::locks::ChannelGuard;
use crate::dao::base::DaoError;
use crate::error::{ChatError, ChatResult};
use crate::store::ChatStore;

/// Authoritative member, ban and invite state of channels.
///
/// Mutations require the channel's [`ChannelGuard`]; each one maps to a single
/// store unit, so a failed call leaves nothing behind.
pub struct MembershipStore {
    store: Arc<dyn ChatStore>,
}

impl MembershipStore {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// The owner counts as a member whether or not a row exists.
    pub async fn is_member(&self, channel: &Channel, user_id: ObjectId) -> ChatResult<bool> {
        if channel.is_owner(user_id) {
            return Ok(true);
        }
        Ok(self.store.find_member(channel.id, user_id).await?.is_some())
    }

    pub async fn is_banned(&self, channel_id: ObjectId, user_id: ObjectId) -> ChatResult<bool> {
        Ok(self.store.find_ban(channel_id, user_id).await?.is_some())
    }

    pub async fn add_member(
        &self,
        guard: &ChannelGuard,
        channel: &Channel,
        user_id: ObjectId,
        invited: bool,
    ) -> ChatResult<ChannelMember> {
        self.insert(guard, channel, user_id, invited, false).await
    }

    /// Admits the user even if banned, removing the ban and its votes in the same unit.
    pub async fn add_member_lifting_ban(
        &self,
        guard: &ChannelGuard,
        channel: &Channel,
        user_id: ObjectId,
        invited: bool,
    ) -> ChatResult<ChannelMember> {
        self.insert(guard, channel, user_id, invited, true).await
    }

    async fn insert(
        &self,
        guard: &ChannelGuard,
        channel: &Channel,
        user_id: ObjectId,
        invited: bool,
        lift_ban: bool,
    ) -> ChatResult<ChannelMember> {
        debug_assert_eq!(guard.channel_id(), channel.id);
        let member = ChannelMember::new(channel.id, user_id, invited);
        match self.store.insert_member(&member, lift_ban).await {
            Ok(()) => Ok(member),
            Err(DaoError::DuplicateKey(_)) => Err(ChatError::AlreadyMember),
            Err(DaoError::Forbidden(_)) => Err(ChatError::Banned),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove_member(
        &self,
        guard: &ChannelGuard,
        channel: &Channel,
        user_id: ObjectId,
    ) -> ChatResult<()> {
        debug_assert_eq!(guard.channel_id(), channel.id);
        if channel.is_owner(user_id) {
            return Err(ChatError::OwnerCannotBeRemoved);
        }
        if !self.store.delete_member(channel.id, user_id).await? {
            return Err(ChatError::NotMember);
        }
        Ok(())
    }

    /// Idempotent: re-banning overwrites the previous ban. Clears pending votes.
    /// Returns whether a membership was removed.
    pub async fn ban(
        &self,
        guard: &ChannelGuard,
        channel: &Channel,
        user_id: ObjectId,
        banned_by: ObjectId,
        ban_type: BanType,
        vote_count: u32,
    ) -> ChatResult<bool> {
        debug_assert_eq!(guard.channel_id(), channel.id);
        if channel.is_owner(user_id) {
            return Err(ChatError::OwnerCannotBeRemoved);
        }
        let ban = ChannelBan::new(channel.id, user_id, banned_by, ban_type, vote_count);
        let removed = self.store.apply_ban(&ban).await?;
        info!(channel_id = %channel.id, ?user_id, ?ban_type, vote_count, "Ban applied");
        Ok(removed)
    }

    pub async fn unban(&self, guard: &ChannelGuard, channel_id: ObjectId, user_id: ObjectId) -> ChatResult<()> {
        debug_assert_eq!(guard.channel_id(), channel_id);
        if !self.store.delete_ban(channel_id, user_id).await? {
            return Err(ChatError::NotBanned);
        }
        info!(%channel_id, ?user_id, "Ban lifted");
        Ok(())
    }

    /// Returns false when the user has no membership row.
    pub async fn clear_invite_flag(&self, channel_id: ObjectId, user_id: ObjectId) -> ChatResult<bool> {
        Ok(self.store.set_member_invited(channel_id, user_id, false).await?)
    }

    pub async fn members(&self, channel_id: ObjectId) -> ChatResult<Vec<ChannelMember>> {
        Ok(self.store.find_members(channel_id).await?)
    }

    pub async fn member(&self, channel_id: ObjectId, user_id: ObjectId) -> ChatResult<Option<ChannelMember>> {
        Ok(self.store.find_member(channel_id, user_id).await?)
    }
}
