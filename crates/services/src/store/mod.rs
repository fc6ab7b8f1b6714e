//! Persistence contract used by the chat core.
//!
//! Every method is one unit of work: it either applies completely or not at
//! all. Multi-row effects that must not partially apply (ban + member removal,
//! channel cascade, lifting a ban while admitting a member) are expressed as a
//! single method rather than composed by callers.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use huddle_db::models::{
    Channel, ChannelBan, ChannelKickVote, ChannelMember, DirectMessage, Message, User, UserStatus,
};

use crate::dao::base::{DaoResult, PaginatedResult, PaginationParams};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[async_trait]
pub trait ChatStore: Send + Sync {
    // --- users ---

    /// Fails with `DuplicateKey` when the username is taken.
    async fn insert_user(&self, user: &User) -> DaoResult<()>;
    async fn find_user(&self, id: ObjectId) -> DaoResult<User>;
    async fn find_users_by_usernames(&self, usernames: &[String]) -> DaoResult<Vec<User>>;
    async fn search_users(&self, query: &str, limit: usize) -> DaoResult<Vec<User>>;
    async fn update_user_status(&self, id: ObjectId, status: UserStatus) -> DaoResult<()>;

    // --- channels ---

    /// Inserts the channel and its owner's membership as one unit. Fails with
    /// `DuplicateKey` when another channel has the same case-insensitive name,
    /// leaving neither row behind.
    async fn insert_channel(&self, channel: &Channel, owner: &ChannelMember) -> DaoResult<()>;
    async fn find_channel(&self, id: ObjectId) -> DaoResult<Channel>;
    async fn find_channel_by_name(&self, name: &str) -> DaoResult<Option<Channel>>;
    async fn find_public_channels(&self) -> DaoResult<Vec<Channel>>;
    async fn find_user_channels(&self, user_id: ObjectId) -> DaoResult<Vec<Channel>>;
    /// Channels whose `last_active_at` is strictly older than `cutoff`.
    async fn find_stale_channels(&self, cutoff: DateTime) -> DaoResult<Vec<Channel>>;
    async fn touch_channel(&self, id: ObjectId, at: DateTime) -> DaoResult<()>;
    /// Deletes the channel together with its memberships, bans, votes and messages.
    async fn delete_channel(&self, id: ObjectId) -> DaoResult<bool>;

    // --- memberships ---

    /// Adds a membership row. Rejects duplicates (`DuplicateKey`) and banned users
    /// (`Forbidden`) unless `lift_ban` is set, in which case the ban and any
    /// pending kick votes are removed in the same unit.
    async fn insert_member(&self, member: &ChannelMember, lift_ban: bool) -> DaoResult<()>;
    async fn find_member(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<Option<ChannelMember>>;
    async fn find_members(&self, channel_id: ObjectId) -> DaoResult<Vec<ChannelMember>>;
    async fn delete_member(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<bool>;
    async fn set_member_invited(&self, channel_id: ObjectId, user_id: ObjectId, invited: bool) -> DaoResult<bool>;

    // --- bans and votes ---

    async fn find_ban(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<Option<ChannelBan>>;
    /// Removes the membership, upserts the ban and clears kick votes for the pair.
    /// Returns whether a membership row was removed.
    async fn apply_ban(&self, ban: &ChannelBan) -> DaoResult<bool>;
    /// Removes the ban and clears kick votes for the pair.
    async fn delete_ban(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<bool>;
    /// Idempotent per (channel, target, voter).
    async fn upsert_vote(&self, vote: &ChannelKickVote) -> DaoResult<()>;
    async fn count_votes(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<u64>;

    // --- messages ---

    /// Rejects messages that do not have exactly one target.
    async fn insert_message(&self, message: &Message) -> DaoResult<()>;
    async fn find_message(&self, id: ObjectId) -> DaoResult<Message>;
    async fn delete_message(&self, id: ObjectId) -> DaoResult<bool>;
    /// Newest first.
    async fn find_channel_messages(
        &self,
        channel_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Message>>;
    /// Newest first.
    async fn find_direct_messages(
        &self,
        direct_message_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Message>>;

    // --- direct message conversations ---

    /// Rejects non-canonical pairs (`Validation`) and duplicate pairs (`DuplicateKey`).
    async fn insert_direct_message(&self, dm: &DirectMessage) -> DaoResult<()>;
    async fn find_direct_message(&self, id: ObjectId) -> DaoResult<DirectMessage>;
    /// Expects the canonical (sorted) pair.
    async fn find_direct_message_by_pair(
        &self,
        user1_id: ObjectId,
        user2_id: ObjectId,
    ) -> DaoResult<Option<DirectMessage>>;
    /// Most recently active first.
    async fn find_user_direct_messages(&self, user_id: ObjectId) -> DaoResult<Vec<DirectMessage>>;
    async fn touch_direct_message(&self, id: ObjectId, at: DateTime) -> DaoResult<()>;
}
