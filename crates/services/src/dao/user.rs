use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use huddle_db::models::{User, UserStatus};

use super::base::{BaseDao, DaoResult};

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(&self, user: &User) -> DaoResult<()> {
        self.base.insert_one(user).await
    }

    pub async fn find_by_usernames(&self, usernames: &[String]) -> DaoResult<Vec<User>> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }
        self.base
            .find_many(doc! { "username": { "$in": usernames } }, None)
            .await
    }

    pub async fn search(&self, query: &str, limit: usize) -> DaoResult<Vec<User>> {
        // Escape regex special chars for safe MongoDB $regex usage
        let escaped = regex::escape(query);

        self.base
            .find_limited(
                doc! {
                    "$or": [
                        { "username": { "$regex": &escaped, "$options": "i" } },
                        { "first_name": { "$regex": &escaped, "$options": "i" } },
                        { "last_name": { "$regex": &escaped, "$options": "i" } },
                    ]
                },
                Some(doc! { "username": 1 }),
                Some(limit as i64),
            )
            .await
    }

    pub async fn update_status(&self, user_id: ObjectId, status: UserStatus) -> DaoResult<bool> {
        self.base
            .update_by_id(
                user_id,
                doc! {
                    "$set": {
                        "status": bson::to_bson(&status)?,
                        "updated_at": DateTime::now(),
                    }
                },
            )
            .await
    }
}
