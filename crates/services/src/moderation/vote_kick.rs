use std::sync::Arc;

use bson::oid::ObjectId;
use huddle_db::models::{BanType, Channel, ChannelKickVote};
use serde::Serialize;
use tracing::{debug, info};

use super::locks::ChannelGuard;
use super::membership::MembershipStore;
use crate::error::{ChatError, ChatResult};
use crate::realtime::{Dispatcher, RemovalReason};
use crate::store::ChatStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum VoteOutcome {
    /// Below quorum; the target stays a member.
    Accumulating { votes: u64, quorum: u64 },
    /// Quorum reached; the target was removed and banned.
    Banned { votes: u64 },
}

/// Turns distinct member votes against a target into a ban once quorum is reached.
pub struct VoteKickCoordinator {
    store: Arc<dyn ChatStore>,
    membership: Arc<MembershipStore>,
    dispatcher: Dispatcher,
    quorum: u64,
}

impl VoteKickCoordinator {
    pub fn new(
        store: Arc<dyn ChatStore>,
        membership: Arc<MembershipStore>,
        dispatcher: Dispatcher,
        quorum: u64,
    ) -> Self {
        Self {
            store,
            membership,
            dispatcher,
            quorum: quorum.max(1),
        }
    }

    pub fn quorum(&self) -> u64 {
        self.quorum
    }

    /// Records `voter`'s vote against `target`.
    ///
    /// Counting and the resulting ban happen under the channel guard, so two
    /// concurrent votes cannot both observe a sub-quorum count.
    pub async fn record_vote(
        &self,
        guard: &ChannelGuard,
        channel: &Channel,
        target: ObjectId,
        voter: ObjectId,
    ) -> ChatResult<VoteOutcome> {
        debug_assert_eq!(guard.channel_id(), channel.id);
        if channel.is_private {
            return Err(ChatError::PrivateChannelForbidden);
        }
        if channel.is_owner(target) {
            return Err(ChatError::CannotTargetOwner);
        }
        if voter == target {
            return Err(ChatError::SelfVote);
        }
        if !self.membership.is_member(channel, voter).await? {
            return Err(ChatError::NotAMember);
        }
        if !self.membership.is_member(channel, target).await? {
            return Err(ChatError::TargetNotMember);
        }

        self.store
            .upsert_vote(&ChannelKickVote::new(channel.id, target, voter))
            .await?;
        let votes = self.store.count_votes(channel.id, target).await?;
        debug!(channel_id = %channel.id, ?target, ?voter, votes, "Kick vote recorded");

        if votes < self.quorum {
            return Ok(VoteOutcome::Accumulating {
                votes,
                quorum: self.quorum,
            });
        }

        let vote_count = u32::try_from(votes).unwrap_or(u32::MAX);
        self.membership
            .ban(guard, channel, target, voter, BanType::Vote, vote_count)
            .await?;
        info!(channel_id = %channel.id, ?target, votes, "Vote-kick quorum reached");
        self.dispatcher
            .member_removed(channel.id, target, RemovalReason::VoteKicked);
        Ok(VoteOutcome::Banned { votes })
    }

    /// Owner-initiated kick: immediate removal and ban, no voting.
    pub async fn owner_kick(
        &self,
        guard: &ChannelGuard,
        channel: &Channel,
        target: ObjectId,
        actor: ObjectId,
    ) -> ChatResult<()> {
        if !channel.is_owner(actor) {
            return Err(ChatError::Forbidden(
                "only the channel owner can kick directly".to_string(),
            ));
        }
        if channel.is_owner(target) {
            return Err(ChatError::CannotTargetOwner);
        }
        if !self.membership.is_member(channel, target).await? {
            return Err(ChatError::TargetNotMember);
        }
        self.membership
            .ban(guard, channel, target, actor, BanType::Owner, 0)
            .await?;
        self.dispatcher
            .member_removed(channel.id, target, RemovalReason::Kicked);
        Ok(())
    }
}
