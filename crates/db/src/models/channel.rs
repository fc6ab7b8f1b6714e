use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    /// Lowercased name; carries the unique index so names collide case-insensitively.
    pub name_key: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    pub owner_id: ObjectId,
    pub last_active_at: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Channel {
    pub const COLLECTION: &'static str = "channels";

    pub fn new(
        name: String,
        description: Option<String>,
        is_private: bool,
        owner_id: ObjectId,
    ) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            name_key: Self::name_key(&name),
            name,
            description,
            is_private,
            owner_id,
            last_active_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn name_key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    pub fn is_owner(&self, user_id: ObjectId) -> bool {
        self.owner_id == user_id
    }

    /// A channel is stale once its last activity is strictly older than `cutoff`.
    pub fn is_stale(&self, cutoff: DateTime) -> bool {
        self.last_active_at < cutoff
    }
}
