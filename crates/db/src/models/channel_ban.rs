use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelBan {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub channel_id: ObjectId,
    pub user_id: ObjectId,
    pub banned_by: ObjectId,
    pub ban_type: BanType,
    /// Number of votes that produced the ban; zero for owner bans.
    #[serde(default)]
    pub vote_count: u32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BanType {
    Owner,
    Vote,
}

impl ChannelBan {
    pub const COLLECTION: &'static str = "channel_bans";

    pub fn new(
        channel_id: ObjectId,
        user_id: ObjectId,
        banned_by: ObjectId,
        ban_type: BanType,
        vote_count: u32,
    ) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            channel_id,
            user_id,
            banned_by,
            ban_type,
            vote_count,
            created_at: now,
            updated_at: now,
        }
    }
}
