use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::ModelError;

/// A one-to-one conversation. Participants are stored sorted (`user1_id < user2_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectMessage {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user1_id: ObjectId,
    pub user2_id: ObjectId,
    pub last_message_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl DirectMessage {
    pub const COLLECTION: &'static str = "direct_messages";

    pub fn between(a: ObjectId, b: ObjectId) -> Result<Self, ModelError> {
        let (user1_id, user2_id) = canonical_pair(a, b)?;
        let now = DateTime::now();
        Ok(Self {
            id: ObjectId::new(),
            user1_id,
            user2_id,
            last_message_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_canonical(&self) -> bool {
        self.user1_id < self.user2_id
    }

    pub fn has_participant(&self, user_id: ObjectId) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    pub fn other_participant(&self, user_id: ObjectId) -> Option<ObjectId> {
        if self.user1_id == user_id {
            Some(self.user2_id)
        } else if self.user2_id == user_id {
            Some(self.user1_id)
        } else {
            None
        }
    }

    pub fn participants(&self) -> [ObjectId; 2] {
        [self.user1_id, self.user2_id]
    }
}

/// Orders two user ids so the smaller comes first. Self-pairs are rejected.
pub fn canonical_pair(a: ObjectId, b: ObjectId) -> Result<(ObjectId, ObjectId), ModelError> {
    match a.cmp(&b) {
        std::cmp::Ordering::Less => Ok((a, b)),
        std::cmp::Ordering::Greater => Ok((b, a)),
        std::cmp::Ordering::Equal => Err(ModelError::SelfConversation),
    }
}
