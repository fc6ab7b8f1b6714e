use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use huddle_db::models::{DirectMessage, ModelError};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct DirectMessageDao {
    pub base: BaseDao<DirectMessage>,
}

impl DirectMessageDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, DirectMessage::COLLECTION),
        }
    }

    pub async fn create(&self, dm: &DirectMessage) -> DaoResult<()> {
        if !dm.is_canonical() {
            return Err(DaoError::Validation(ModelError::SelfConversation));
        }
        self.base.insert_one(dm).await
    }

    pub async fn find_by_pair(
        &self,
        user1_id: ObjectId,
        user2_id: ObjectId,
    ) -> DaoResult<Option<DirectMessage>> {
        self.base
            .find_one(doc! { "user1_id": user1_id, "user2_id": user2_id })
            .await
    }

    pub async fn find_for_user(&self, user_id: ObjectId) -> DaoResult<Vec<DirectMessage>> {
        self.base
            .find_many(
                doc! { "$or": [ { "user1_id": user_id }, { "user2_id": user_id } ] },
                Some(doc! { "last_message_at": -1 }),
            )
            .await
    }

    pub async fn touch(&self, dm_id: ObjectId, at: DateTime) -> DaoResult<bool> {
        self.base
            .update_by_id(
                dm_id,
                doc! { "$set": { "last_message_at": at, "updated_at": at } },
            )
            .await
    }
}
