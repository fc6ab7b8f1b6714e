use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use huddle_db::models::{
    Channel, ChannelBan, ChannelKickVote, ChannelMember, DirectMessage, Message, User, UserStatus,
};
use mongodb::{Client, ClientSession, Database};
use tracing::warn;

use super::ChatStore;
use crate::dao::base::{DaoError, DaoResult, PaginatedResult, PaginationParams};
use crate::dao::{ChannelDao, DirectMessageDao, MessageDao, UserDao};

/// MongoDB-backed store. Multi-document writes run in a session transaction,
/// which requires the server to be a replica set member.
pub struct MongoStore {
    client: Client,
    pub users: UserDao,
    pub channels: ChannelDao,
    pub messages: MessageDao,
    pub direct_messages: DirectMessageDao,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            client: db.client().clone(),
            users: UserDao::new(db),
            channels: ChannelDao::new(db),
            messages: MessageDao::new(db),
            direct_messages: DirectMessageDao::new(db),
        }
    }

    async fn begin(&self) -> DaoResult<ClientSession> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;
        Ok(session)
    }
}

/// Commits on success, aborts on failure.
async fn finish<T>(mut session: ClientSession, result: DaoResult<T>) -> DaoResult<T> {
    match result {
        Ok(value) => {
            session.commit_transaction().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(abort) = session.abort_transaction().await {
                warn!(%abort, "Failed to abort transaction");
            }
            Err(e)
        }
    }
}

#[async_trait]
impl ChatStore for MongoStore {
    async fn insert_user(&self, user: &User) -> DaoResult<()> {
        self.users.create(user).await
    }

    async fn find_user(&self, id: ObjectId) -> DaoResult<User> {
        self.users.base.find_by_id(id).await
    }

    async fn find_users_by_usernames(&self, usernames: &[String]) -> DaoResult<Vec<User>> {
        self.users.find_by_usernames(usernames).await
    }

    async fn search_users(&self, query: &str, limit: usize) -> DaoResult<Vec<User>> {
        self.users.search(query, limit).await
    }

    async fn update_user_status(&self, id: ObjectId, status: UserStatus) -> DaoResult<()> {
        if self.users.update_status(id, status).await? {
            Ok(())
        } else {
            Err(DaoError::NotFound)
        }
    }

    async fn insert_channel(&self, channel: &Channel, owner: &ChannelMember) -> DaoResult<()> {
        let mut session = self.begin().await?;
        let result = self.channels.create_in(&mut session, channel, owner).await;
        finish(session, result).await
    }

    async fn find_channel(&self, id: ObjectId) -> DaoResult<Channel> {
        self.channels.base.find_by_id(id).await
    }

    async fn find_channel_by_name(&self, name: &str) -> DaoResult<Option<Channel>> {
        self.channels.find_by_name(name).await
    }

    async fn find_public_channels(&self) -> DaoResult<Vec<Channel>> {
        self.channels.find_public().await
    }

    async fn find_user_channels(&self, user_id: ObjectId) -> DaoResult<Vec<Channel>> {
        self.channels.find_user_channels(user_id).await
    }

    async fn find_stale_channels(&self, cutoff: DateTime) -> DaoResult<Vec<Channel>> {
        self.channels.find_stale(cutoff).await
    }

    async fn touch_channel(&self, id: ObjectId, at: DateTime) -> DaoResult<()> {
        if self.channels.touch(id, at).await? {
            Ok(())
        } else {
            Err(DaoError::NotFound)
        }
    }

    async fn delete_channel(&self, id: ObjectId) -> DaoResult<bool> {
        let mut session = self.begin().await?;
        let result = self.channels.delete_in(&mut session, id).await;
        finish(session, result).await
    }

    async fn insert_member(&self, member: &ChannelMember, lift_ban: bool) -> DaoResult<()> {
        let mut session = self.begin().await?;
        let result = self.channels.join_in(&mut session, member, lift_ban).await;
        finish(session, result).await
    }

    async fn find_member(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<Option<ChannelMember>> {
        self.channels.find_member(channel_id, user_id).await
    }

    async fn find_members(&self, channel_id: ObjectId) -> DaoResult<Vec<ChannelMember>> {
        self.channels.list_members(channel_id).await
    }

    async fn delete_member(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<bool> {
        self.channels.leave(channel_id, user_id).await
    }

    async fn set_member_invited(&self, channel_id: ObjectId, user_id: ObjectId, invited: bool) -> DaoResult<bool> {
        self.channels.set_invited(channel_id, user_id, invited).await
    }

    async fn find_ban(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<Option<ChannelBan>> {
        self.channels.find_ban(channel_id, user_id).await
    }

    async fn apply_ban(&self, ban: &ChannelBan) -> DaoResult<bool> {
        let mut session = self.begin().await?;
        let result = self.channels.ban_in(&mut session, ban).await;
        finish(session, result).await
    }

    async fn delete_ban(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<bool> {
        let mut session = self.begin().await?;
        let result = self.channels.unban_in(&mut session, channel_id, user_id).await;
        finish(session, result).await
    }

    async fn upsert_vote(&self, vote: &ChannelKickVote) -> DaoResult<()> {
        self.channels.add_vote(vote).await
    }

    async fn count_votes(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<u64> {
        self.channels.count_votes(channel_id, user_id).await
    }

    async fn insert_message(&self, message: &Message) -> DaoResult<()> {
        self.messages.create(message).await
    }

    async fn find_message(&self, id: ObjectId) -> DaoResult<Message> {
        self.messages.base.find_by_id(id).await
    }

    async fn delete_message(&self, id: ObjectId) -> DaoResult<bool> {
        self.messages.delete(id).await
    }

    async fn find_channel_messages(
        &self,
        channel_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Message>> {
        self.messages.find_in_channel(channel_id, params).await
    }

    async fn find_direct_messages(
        &self,
        direct_message_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Message>> {
        self.messages.find_in_direct_message(direct_message_id, params).await
    }

    async fn insert_direct_message(&self, dm: &DirectMessage) -> DaoResult<()> {
        self.direct_messages.create(dm).await
    }

    async fn find_direct_message(&self, id: ObjectId) -> DaoResult<DirectMessage> {
        self.direct_messages.base.find_by_id(id).await
    }

    async fn find_direct_message_by_pair(
        &self,
        user1_id: ObjectId,
        user2_id: ObjectId,
    ) -> DaoResult<Option<DirectMessage>> {
        self.direct_messages.find_by_pair(user1_id, user2_id).await
    }

    async fn find_user_direct_messages(&self, user_id: ObjectId) -> DaoResult<Vec<DirectMessage>> {
        self.direct_messages.find_for_user(user_id).await
    }

    async fn touch_direct_message(&self, id: ObjectId, at: DateTime) -> DaoResult<()> {
        if self.direct_messages.touch(id, at).await? {
            Ok(())
        } else {
            Err(DaoError::NotFound)
        }
    }
}
