use bson::oid::ObjectId;
use huddle_db::models::{Channel, ChannelMember, User};
use serde::Serialize;
use tracing::info;

use super::ChatService;
use crate::error::{ChatError, ChatResult};
use crate::moderation::VoteOutcome;
use crate::realtime::event::{ChannelSummary, MemberSummary, UserSummary};
use crate::realtime::{ChatEvent, DeletionReason, RemovalReason, Topic};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum KickOutcome {
    /// The owner removed and banned the target directly.
    Kicked,
    /// A member's kick request was recorded as a vote.
    Voted { vote: VoteOutcome },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    Deleted,
    Left,
}

impl ChatService {
    pub async fn create_channel(
        &self,
        owner_id: ObjectId,
        name: &str,
        description: Option<String>,
        is_private: bool,
    ) -> ChatResult<Channel> {
        self.load_user(owner_id).await?;
        self.lifecycle
            .create(name, description, is_private, owner_id)
            .await
    }

    pub async fn get_channel(&self, channel_id: ObjectId, viewer: ObjectId) -> ChatResult<Channel> {
        let channel = self.load_channel(channel_id).await?;
        self.ensure_visible(&channel, viewer).await?;
        Ok(channel)
    }

    /// The viewer's channels, each flagged when the membership is an unacknowledged invite.
    pub async fn list_user_channels(&self, user_id: ObjectId) -> ChatResult<Vec<ChannelSummary>> {
        let channels = self.store.find_user_channels(user_id).await?;
        let mut summaries = Vec::with_capacity(channels.len());
        for channel in &channels {
            let member = self.membership.member(channel.id, user_id).await?;
            summaries.push(ChannelSummary::for_member(channel, member.as_ref()));
        }
        Ok(summaries)
    }

    pub async fn list_public_channels(&self) -> ChatResult<Vec<Channel>> {
        Ok(self.store.find_public_channels().await?)
    }

    pub async fn list_members(&self, channel_id: ObjectId, viewer: ObjectId) -> ChatResult<Vec<MemberSummary>> {
        let channel = self.load_channel(channel_id).await?;
        self.ensure_visible(&channel, viewer).await?;
        let members = self.membership.members(channel_id).await?;
        let users = self.load_users(members.iter().map(|m| m.user_id).collect::<Vec<_>>()).await?;
        Ok(members
            .iter()
            .filter_map(|member| {
                users
                    .get(&member.user_id)
                    .map(|user| MemberSummary::new(user, member, &channel))
            })
            .collect())
    }

    pub async fn join_channel(&self, channel_id: ObjectId, user_id: ObjectId) -> ChatResult<ChannelMember> {
        let user = self.load_user(user_id).await?;
        let (guard, channel) = self.lock_channel(channel_id).await?;
        if channel.is_private {
            return Err(ChatError::Forbidden(
                "private channels can only be joined by invitation".to_string(),
            ));
        }
        let member = self.membership.add_member(&guard, &channel, user_id, false).await?;
        self.announce_member(&channel, &user, &member);
        info!(%channel_id, ?user_id, "Member joined");
        Ok(member)
    }

    pub async fn leave_channel(&self, channel_id: ObjectId, user_id: ObjectId) -> ChatResult<()> {
        let (guard, channel) = self.lock_channel(channel_id).await?;
        self.membership.remove_member(&guard, &channel, user_id).await?;
        self.dispatcher
            .member_removed(channel_id, user_id, RemovalReason::Left);
        info!(%channel_id, ?user_id, "Member left");
        Ok(())
    }

    /// Invites `target` on behalf of `inviter`. Private channels accept owner
    /// invites only; an owner invite also lifts an existing ban.
    pub async fn invite_user(
        &self,
        channel_id: ObjectId,
        inviter: ObjectId,
        target: ObjectId,
    ) -> ChatResult<ChannelMember> {
        let inviter_user = self.load_user(inviter).await?;
        let target_user = self.load_user(target).await?;
        let (guard, channel) = self.lock_channel(channel_id).await?;

        self.ensure_member(&channel, inviter).await?;
        if channel.is_private && !channel.is_owner(inviter) {
            return Err(ChatError::Forbidden(
                "only the channel owner can invite to a private channel".to_string(),
            ));
        }

        let member = if channel.is_owner(inviter) {
            self.membership
                .add_member_lifting_ban(&guard, &channel, target, true)
                .await?
        } else {
            self.membership.add_member(&guard, &channel, target, true).await?
        };

        self.announce_member(&channel, &target_user, &member);
        self.dispatcher.publish(
            Topic::User(target),
            &ChatEvent::ChannelInvited {
                channel: ChannelSummary::for_member(&channel, Some(&member)),
                invited_by: UserSummary::from(&inviter_user),
            },
        );
        info!(%channel_id, ?inviter, ?target, "Member invited");
        Ok(member)
    }

    /// Owners kick immediately; other members cast a vote (public channels only).
    pub async fn kick_user(
        &self,
        channel_id: ObjectId,
        actor: ObjectId,
        target: ObjectId,
    ) -> ChatResult<KickOutcome> {
        let (guard, channel) = self.lock_channel(channel_id).await?;
        if channel.is_owner(actor) {
            self.votes.owner_kick(&guard, &channel, target, actor).await?;
            return Ok(KickOutcome::Kicked);
        }
        let vote = self.votes.record_vote(&guard, &channel, target, actor).await?;
        Ok(KickOutcome::Voted { vote })
    }

    pub async fn vote_kick(
        &self,
        channel_id: ObjectId,
        voter: ObjectId,
        target: ObjectId,
    ) -> ChatResult<VoteOutcome> {
        let (guard, channel) = self.lock_channel(channel_id).await?;
        self.votes.record_vote(&guard, &channel, target, voter).await
    }

    /// Owner removes a member of a private channel without banning them.
    pub async fn revoke_user(&self, channel_id: ObjectId, actor: ObjectId, target: ObjectId) -> ChatResult<()> {
        let (guard, channel) = self.lock_channel(channel_id).await?;
        Self::ensure_owner(&channel, actor, "revoke access")?;
        if !channel.is_private {
            return Err(ChatError::InvalidState(
                "revoke only applies to private channels".to_string(),
            ));
        }
        self.membership.remove_member(&guard, &channel, target).await?;
        self.dispatcher
            .member_removed(channel_id, target, RemovalReason::Revoked);
        info!(%channel_id, ?target, "Access revoked");
        Ok(())
    }

    pub async fn unban_user(&self, channel_id: ObjectId, actor: ObjectId, target: ObjectId) -> ChatResult<()> {
        let (guard, channel) = self.lock_channel(channel_id).await?;
        Self::ensure_owner(&channel, actor, "unban users")?;
        self.membership.unban(&guard, channel_id, target).await
    }

    pub async fn delete_channel(&self, channel_id: ObjectId, actor: ObjectId) -> ChatResult<()> {
        let (guard, channel) = self.lock_channel(channel_id).await?;
        Self::ensure_owner(&channel, actor, "delete the channel")?;
        self.lifecycle
            .delete_locked(guard, &channel, DeletionReason::Deleted)
            .await
    }

    /// Owner: delete the channel. Anyone else: leave it.
    pub async fn cancel_channel(&self, channel_id: ObjectId, actor: ObjectId) -> ChatResult<CancelOutcome> {
        let channel = self.load_channel(channel_id).await?;
        if channel.is_owner(actor) {
            self.delete_channel(channel_id, actor).await?;
            Ok(CancelOutcome::Deleted)
        } else {
            self.leave_channel(channel_id, actor).await?;
            Ok(CancelOutcome::Left)
        }
    }

    pub async fn clear_invite_flag(&self, channel_id: ObjectId, user_id: ObjectId) -> ChatResult<()> {
        self.load_channel(channel_id).await?;
        if !self.membership.clear_invite_flag(channel_id, user_id).await? {
            return Err(ChatError::NotMember);
        }
        Ok(())
    }

    fn announce_member(&self, channel: &Channel, user: &User, member: &ChannelMember) {
        self.dispatcher.publish(
            Topic::Channel(channel.id),
            &ChatEvent::ChannelMemberAdded {
                channel_id: channel.id.to_hex(),
                member: MemberSummary::new(user, member, channel),
            },
        );
    }
}
