use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMember {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub channel_id: ObjectId,
    pub user_id: ObjectId,
    /// Set when the membership came from an invitation; cleared once the user acknowledges it.
    #[serde(default)]
    pub is_invited: bool,
    pub joined_at: DateTime,
}

impl ChannelMember {
    pub const COLLECTION: &'static str = "channel_members";

    pub fn new(channel_id: ObjectId, user_id: ObjectId, is_invited: bool) -> Self {
        Self {
            id: ObjectId::new(),
            channel_id,
            user_id,
            is_invited,
            joined_at: DateTime::now(),
        }
    }
}
