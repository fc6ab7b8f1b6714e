use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    #[serde(default)]
    pub status: UserStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Online,
    Dnd,
    #[default]
    Offline,
}

impl User {
    pub const COLLECTION: &'static str = "users";

    pub fn new(username: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            username: username.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            avatar: None,
            status: UserStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
