use bson::{doc, oid::ObjectId, DateTime};
use mongodb::{ClientSession, Database};
use huddle_db::models::{Channel, ChannelBan, ChannelKickVote, ChannelMember, Message};

use super::base::{is_duplicate_key, BaseDao, DaoError, DaoResult};

/// Channels plus the per-channel membership, ban and kick-vote collections.
///
/// Methods taking a `ClientSession` run inside the caller's transaction.
pub struct ChannelDao {
    pub base: BaseDao<Channel>,
    pub members: BaseDao<ChannelMember>,
    pub bans: BaseDao<ChannelBan>,
    pub votes: BaseDao<ChannelKickVote>,
    pub messages: BaseDao<Message>,
}

impl ChannelDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Channel::COLLECTION),
            members: BaseDao::new(db, ChannelMember::COLLECTION),
            bans: BaseDao::new(db, ChannelBan::COLLECTION),
            votes: BaseDao::new(db, ChannelKickVote::COLLECTION),
            messages: BaseDao::new(db, Message::COLLECTION),
        }
    }

    pub async fn find_by_name(&self, name: &str) -> DaoResult<Option<Channel>> {
        self.base
            .find_one(doc! { "name_key": Channel::name_key(name) })
            .await
    }

    pub async fn find_public(&self) -> DaoResult<Vec<Channel>> {
        self.base
            .find_many(doc! { "is_private": false }, Some(doc! { "last_active_at": -1 }))
            .await
    }

    pub async fn find_user_channels(&self, user_id: ObjectId) -> DaoResult<Vec<Channel>> {
        let memberships = self
            .members
            .find_many(doc! { "user_id": user_id }, None)
            .await?;

        let channel_ids: Vec<ObjectId> = memberships.iter().map(|m| m.channel_id).collect();

        if channel_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.base
            .find_many(
                doc! { "_id": { "$in": channel_ids } },
                Some(doc! { "last_active_at": -1 }),
            )
            .await
    }

    pub async fn find_stale(&self, cutoff: DateTime) -> DaoResult<Vec<Channel>> {
        self.base
            .find_many(doc! { "last_active_at": { "$lt": cutoff } }, None)
            .await
    }

    pub async fn touch(&self, channel_id: ObjectId, at: DateTime) -> DaoResult<bool> {
        self.base
            .update_by_id(
                channel_id,
                doc! { "$set": { "last_active_at": at, "updated_at": at } },
            )
            .await
    }

    pub async fn find_member(
        &self,
        channel_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Option<ChannelMember>> {
        self.members
            .find_one(doc! { "channel_id": channel_id, "user_id": user_id })
            .await
    }

    pub async fn list_members(&self, channel_id: ObjectId) -> DaoResult<Vec<ChannelMember>> {
        self.members
            .find_many(doc! { "channel_id": channel_id }, Some(doc! { "joined_at": 1 }))
            .await
    }

    pub async fn leave(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<bool> {
        let deleted = self
            .members
            .hard_delete(doc! { "channel_id": channel_id, "user_id": user_id })
            .await?;
        Ok(deleted > 0)
    }

    pub async fn set_invited(
        &self,
        channel_id: ObjectId,
        user_id: ObjectId,
        invited: bool,
    ) -> DaoResult<bool> {
        self.members
            .update_one(
                doc! { "channel_id": channel_id, "user_id": user_id },
                doc! { "$set": { "is_invited": invited } },
            )
            .await
    }

    pub async fn find_ban(
        &self,
        channel_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Option<ChannelBan>> {
        self.bans
            .find_one(doc! { "channel_id": channel_id, "user_id": user_id })
            .await
    }

    pub async fn add_vote(&self, vote: &ChannelKickVote) -> DaoResult<()> {
        self.votes
            .upsert_one(
                doc! {
                    "channel_id": vote.channel_id,
                    "user_id": vote.user_id,
                    "voted_by": vote.voted_by,
                },
                doc! {
                    "$setOnInsert": {
                        "_id": vote.id,
                        "created_at": vote.created_at,
                    }
                },
            )
            .await?;
        Ok(())
    }

    pub async fn count_votes(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<u64> {
        self.votes
            .count(doc! { "channel_id": channel_id, "user_id": user_id })
            .await
    }

    // --- transactional writes ---

    pub async fn create_in(
        &self,
        session: &mut ClientSession,
        channel: &Channel,
        owner: &ChannelMember,
    ) -> DaoResult<()> {
        self.base
            .collection()
            .insert_one(channel)
            .session(&mut *session)
            .await
            .map_err(map_insert_error)?;
        self.members
            .collection()
            .insert_one(owner)
            .session(&mut *session)
            .await
            .map_err(map_insert_error)?;
        Ok(())
    }

    pub async fn ban_in(&self, session: &mut ClientSession, ban: &ChannelBan) -> DaoResult<bool> {
        let pair = doc! { "channel_id": ban.channel_id, "user_id": ban.user_id };

        let removed = self
            .members
            .collection()
            .delete_one(pair.clone())
            .session(&mut *session)
            .await?;

        self.bans
            .collection()
            .update_one(
                pair.clone(),
                doc! {
                    "$set": {
                        "banned_by": ban.banned_by,
                        "ban_type": bson::to_bson(&ban.ban_type)?,
                        "vote_count": ban.vote_count as i64,
                        "updated_at": ban.updated_at,
                    },
                    "$setOnInsert": {
                        "_id": ban.id,
                        "created_at": ban.created_at,
                    }
                },
            )
            .upsert(true)
            .session(&mut *session)
            .await?;

        self.votes
            .collection()
            .delete_many(pair)
            .session(&mut *session)
            .await?;

        Ok(removed.deleted_count > 0)
    }

    pub async fn unban_in(
        &self,
        session: &mut ClientSession,
        channel_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<bool> {
        let pair = doc! { "channel_id": channel_id, "user_id": user_id };

        let removed = self
            .bans
            .collection()
            .delete_one(pair.clone())
            .session(&mut *session)
            .await?;

        self.votes
            .collection()
            .delete_many(pair)
            .session(&mut *session)
            .await?;

        Ok(removed.deleted_count > 0)
    }

    pub async fn join_in(
        &self,
        session: &mut ClientSession,
        member: &ChannelMember,
        lift_ban: bool,
    ) -> DaoResult<()> {
        let channel = self
            .base
            .collection()
            .find_one(doc! { "_id": member.channel_id })
            .session(&mut *session)
            .await?;
        if channel.is_none() {
            return Err(DaoError::NotFound);
        }

        let banned = self
            .bans
            .collection()
            .find_one(doc! { "channel_id": member.channel_id, "user_id": member.user_id })
            .session(&mut *session)
            .await?;
        if banned.is_some() {
            if !lift_ban {
                return Err(DaoError::Forbidden(
                    "user is banned from this channel".to_string(),
                ));
            }
            self.unban_in(session, member.channel_id, member.user_id).await?;
        }

        self.members
            .collection()
            .insert_one(member)
            .session(&mut *session)
            .await
            .map_err(map_insert_error)?;
        Ok(())
    }

    pub async fn delete_in(&self, session: &mut ClientSession, channel_id: ObjectId) -> DaoResult<bool> {
        let removed = self
            .base
            .collection()
            .delete_one(doc! { "_id": channel_id })
            .session(&mut *session)
            .await?;
        if removed.deleted_count == 0 {
            return Ok(false);
        }

        let scoped = doc! { "channel_id": channel_id };
        self.members.collection().delete_many(scoped.clone()).session(&mut *session).await?;
        self.bans.collection().delete_many(scoped.clone()).session(&mut *session).await?;
        self.votes.collection().delete_many(scoped.clone()).session(&mut *session).await?;
        self.messages.collection().delete_many(scoped).session(&mut *session).await?;
        Ok(true)
    }
}

fn map_insert_error(e: mongodb::error::Error) -> DaoError {
    if is_duplicate_key(&e) {
        return DaoError::DuplicateKey(e.to_string());
    }
    DaoError::Mongo(e)
}
