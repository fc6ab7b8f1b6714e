use bson::oid::ObjectId;
use huddle_db::models::{canonical_pair, DirectMessage, Message, MessageTarget};
use serde::Serialize;
use tracing::debug;

use super::{require_content, ChatService};
use crate::dao::base::{DaoError, PaginatedResult, PaginationParams};
use crate::error::{ChatError, ChatResult};
use crate::realtime::event::{MessagePayload, UserSummary};
use crate::realtime::{ChatEvent, NotificationKind};

/// A conversation as seen by one participant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: String,
    pub other_user: UserSummary,
    pub last_message_at: Option<i64>,
    pub created_at: i64,
}

impl ChatService {
    /// Returns the conversation between the two users, creating it on first use.
    /// Argument order does not matter.
    pub async fn open_direct_message(&self, user_id: ObjectId, other_id: ObjectId) -> ChatResult<DirectMessage> {
        let (user1_id, user2_id) = canonical_pair(user_id, other_id)?;
        self.load_user(other_id).await?;

        if let Some(existing) = self.store.find_direct_message_by_pair(user1_id, user2_id).await? {
            return Ok(existing);
        }

        let dm = DirectMessage::between(user1_id, user2_id)?;
        match self.store.insert_direct_message(&dm).await {
            Ok(()) => Ok(dm),
            // Lost a race with the other participant opening the same conversation.
            Err(DaoError::DuplicateKey(_)) => self
                .store
                .find_direct_message_by_pair(user1_id, user2_id)
                .await?
                .ok_or(ChatError::NotFound("direct message")),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_direct_messages(&self, user_id: ObjectId) -> ChatResult<Vec<ConversationSummary>> {
        let conversations = self.store.find_user_direct_messages(user_id).await?;
        let others = self
            .load_users(conversations.iter().filter_map(|dm| dm.other_participant(user_id)).collect::<Vec<_>>())
            .await?;
        Ok(conversations
            .iter()
            .filter_map(|dm| {
                let other = others.get(&dm.other_participant(user_id)?)?;
                Some(ConversationSummary {
                    id: dm.id.to_hex(),
                    other_user: other.into(),
                    last_message_at: dm.last_message_at.map(|at| at.timestamp_millis()),
                    created_at: dm.created_at.timestamp_millis(),
                })
            })
            .collect())
    }

    /// Sends into a conversation and pushes it to both participants' personal topics.
    pub async fn send_direct_message(
        &self,
        direct_message_id: ObjectId,
        user_id: ObjectId,
        content: &str,
    ) -> ChatResult<Message> {
        let content = require_content(content)?;
        let dm = self.load_participating(direct_message_id, user_id).await?;
        let author = self.load_user(user_id).await?;

        let message = Message::new(MessageTarget::Direct(dm.id), user_id, content, Vec::new());
        self.store.insert_message(&message).await?;
        self.store.touch_direct_message(dm.id, message.created_at).await?;

        self.dispatcher
            .publish_to_users(dm.participants(), &ChatEvent::direct_message(&message, &author));
        if let Some(recipient) = dm.other_participant(user_id) {
            self.dispatcher.publish_to_users(
                [recipient],
                &ChatEvent::Notification {
                    kind: NotificationKind::DirectMessage,
                    message: MessagePayload::new(&message, &author),
                },
            );
        }

        debug!(%direct_message_id, message_id = %message.id, "Direct message sent");
        Ok(message)
    }

    pub async fn list_dm_messages(
        &self,
        direct_message_id: ObjectId,
        user_id: ObjectId,
        params: &PaginationParams,
    ) -> ChatResult<PaginatedResult<MessagePayload>> {
        let dm = self.load_participating(direct_message_id, user_id).await?;
        let page = self.store.find_direct_messages(dm.id, params).await?;
        self.to_payloads(page).await
    }

    async fn load_participating(&self, direct_message_id: ObjectId, user_id: ObjectId) -> ChatResult<DirectMessage> {
        let dm = match self.store.find_direct_message(direct_message_id).await {
            Ok(dm) => dm,
            Err(DaoError::NotFound) => return Err(ChatError::NotFound("direct message")),
            Err(e) => return Err(e.into()),
        };
        if !dm.has_participant(user_id) {
            return Err(ChatError::Forbidden(
                "you are not part of this conversation".to_string(),
            ));
        }
        Ok(dm)
    }
}
