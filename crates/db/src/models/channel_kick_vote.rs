use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// One member's vote to remove `user_id` from a public channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelKickVote {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub channel_id: ObjectId,
    pub user_id: ObjectId,
    pub voted_by: ObjectId,
    pub created_at: DateTime,
}

impl ChannelKickVote {
    pub const COLLECTION: &'static str = "channel_kick_votes";

    pub fn new(channel_id: ObjectId, user_id: ObjectId, voted_by: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            channel_id,
            user_id,
            voted_by,
            created_at: DateTime::now(),
        }
    }
}
