use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::ModelError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub channel_id: Option<ObjectId>,
    pub direct_message_id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub content: String,
    #[serde(default)]
    pub mentions: Vec<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Where a message lives. Exactly one per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    Channel(ObjectId),
    Direct(ObjectId),
}

impl Message {
    pub const COLLECTION: &'static str = "messages";

    pub fn new(target: MessageTarget, user_id: ObjectId, content: String, mentions: Vec<ObjectId>) -> Self {
        let (channel_id, direct_message_id) = match target {
            MessageTarget::Channel(id) => (Some(id), None),
            MessageTarget::Direct(id) => (None, Some(id)),
        };
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            channel_id,
            direct_message_id,
            user_id,
            content,
            mentions,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn target(&self) -> Result<MessageTarget, ModelError> {
        target_of(self.channel_id, self.direct_message_id)
    }
}

fn target_of(
    channel_id: Option<ObjectId>,
    direct_message_id: Option<ObjectId>,
) -> Result<MessageTarget, ModelError> {
    match (channel_id, direct_message_id) {
        (Some(c), None) => Ok(MessageTarget::Channel(c)),
        (None, Some(d)) => Ok(MessageTarget::Direct(d)),
        (Some(_), Some(_)) => Err(ModelError::AmbiguousMessageTarget),
        (None, None) => Err(ModelError::MissingMessageTarget),
    }
}
