use bson::{doc, oid::ObjectId};
use mongodb::Database;
use huddle_db::models::Message;

use super::base::{BaseDao, DaoResult, PaginatedResult, PaginationParams};

pub struct MessageDao {
    pub base: BaseDao<Message>,
}

impl MessageDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Message::COLLECTION),
        }
    }

    pub async fn create(&self, message: &Message) -> DaoResult<()> {
        message.target()?;
        self.base.insert_one(message).await
    }

    pub async fn find_in_channel(
        &self,
        channel_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Message>> {
        self.base
            .find_paginated(
                doc! { "channel_id": channel_id },
                Some(doc! { "created_at": -1, "_id": -1 }),
                params,
            )
            .await
    }

    pub async fn find_in_direct_message(
        &self,
        direct_message_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Message>> {
        self.base
            .find_paginated(
                doc! { "direct_message_id": direct_message_id },
                Some(doc! { "created_at": -1, "_id": -1 }),
                params,
            )
            .await
    }

    pub async fn delete(&self, message_id: ObjectId) -> DaoResult<bool> {
        Ok(self.base.hard_delete(doc! { "_id": message_id }).await? > 0)
    }
}
