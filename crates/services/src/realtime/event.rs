//! Wire shapes pushed to subscribers. Every event serializes as one JSON object
//! tagged by `type`, with camelCase fields, hex string ids and epoch-millisecond times.

use huddle_db::models::{Channel, ChannelMember, Message, User, UserStatus};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub status: UserStatus,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_hex(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            avatar: user.avatar.clone(),
            status: user.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_message_id: Option<String>,
    pub content: String,
    pub mentions: Vec<String>,
    pub created_at: i64,
    pub sender_id: String,
    pub sender: UserSummary,
}

impl MessagePayload {
    pub fn new(message: &Message, sender: &User) -> Self {
        Self {
            id: message.id.to_hex(),
            channel_id: message.channel_id.map(|id| id.to_hex()),
            direct_message_id: message.direct_message_id.map(|id| id.to_hex()),
            content: message.content.clone(),
            mentions: message.mentions.iter().map(|id| id.to_hex()).collect(),
            created_at: message.created_at.timestamp_millis(),
            sender_id: message.user_id.to_hex(),
            sender: sender.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub owner_id: String,
    pub last_active_at: i64,
    pub created_at: i64,
    /// Per-viewer flag; only present in a member's own channel list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new_invite: Option<bool>,
}

impl From<&Channel> for ChannelSummary {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.id.to_hex(),
            name: channel.name.clone(),
            description: channel.description.clone(),
            is_private: channel.is_private,
            owner_id: channel.owner_id.to_hex(),
            last_active_at: channel.last_active_at.timestamp_millis(),
            created_at: channel.created_at.timestamp_millis(),
            is_new_invite: None,
        }
    }
}

impl ChannelSummary {
    pub fn for_member(channel: &Channel, member: Option<&ChannelMember>) -> Self {
        Self {
            is_new_invite: Some(member.is_some_and(|m| m.is_invited)),
            ..Self::from(channel)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    #[serde(flatten)]
    pub user: UserSummary,
    pub is_owner: bool,
    pub is_invited: bool,
    pub joined_at: i64,
}

impl MemberSummary {
    pub fn new(user: &User, member: &ChannelMember, channel: &Channel) -> Self {
        Self {
            user: user.into(),
            is_owner: channel.is_owner(user.id),
            is_invited: member.is_invited,
            joined_at: member.joined_at.timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    Left,
    Kicked,
    VoteKicked,
    Revoked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionReason {
    Deleted,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Mention,
    DirectMessage,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ChatEvent {
    ChannelMessage {
        channel_id: String,
        message: MessagePayload,
    },
    DirectMessage {
        direct_message_id: String,
        message: MessagePayload,
    },
    StatusChange {
        user_id: String,
        status: UserStatus,
    },
    Typing {
        channel_id: String,
        user_id: String,
        username: String,
        is_typing: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    Notification {
        kind: NotificationKind,
        message: MessagePayload,
    },
    ChannelMemberAdded {
        channel_id: String,
        member: MemberSummary,
    },
    ChannelMemberRemoved {
        channel_id: String,
        user_id: String,
        reason: RemovalReason,
    },
    ChannelInvited {
        channel: ChannelSummary,
        invited_by: UserSummary,
    },
    ChannelDeleted {
        channel_id: String,
        name: String,
        reason: DeletionReason,
    },
}

impl ChatEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::ChannelMessage { .. } => "channel_message",
            ChatEvent::DirectMessage { .. } => "direct_message",
            ChatEvent::StatusChange { .. } => "status_change",
            ChatEvent::Typing { .. } => "typing",
            ChatEvent::Notification { .. } => "notification",
            ChatEvent::ChannelMemberAdded { .. } => "channel_member_added",
            ChatEvent::ChannelMemberRemoved { .. } => "channel_member_removed",
            ChatEvent::ChannelInvited { .. } => "channel_invited",
            ChatEvent::ChannelDeleted { .. } => "channel_deleted",
        }
    }

    pub fn channel_message(message: &Message, sender: &User) -> Self {
        let payload = MessagePayload::new(message, sender);
        ChatEvent::ChannelMessage {
            channel_id: payload.channel_id.clone().unwrap_or_default(),
            message: payload,
        }
    }

    pub fn direct_message(message: &Message, sender: &User) -> Self {
        let payload = MessagePayload::new(message, sender);
        ChatEvent::DirectMessage {
            direct_message_id: payload.direct_message_id.clone().unwrap_or_default(),
            message: payload,
        }
    }
}
