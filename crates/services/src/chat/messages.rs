use std::collections::HashSet;

use bson::oid::ObjectId;
use huddle_db::models::{Message, MessageTarget};
use tracing::debug;

use super::{require_content, ChatService};
use crate::dao::base::{DaoError, PaginatedResult, PaginationParams};
use crate::error::{ChatError, ChatResult};
use crate::realtime::event::MessagePayload;
use crate::realtime::{ChatEvent, NotificationKind, Topic};

impl ChatService {
    /// Posts to a channel: resolves `@username` mentions, persists, marks the
    /// channel active, then publishes the message and mention notifications.
    pub async fn send_channel_message(
        &self,
        channel_id: ObjectId,
        user_id: ObjectId,
        content: &str,
    ) -> ChatResult<Message> {
        let content = require_content(content)?;
        let author = self.load_user(user_id).await?;
        let mentions = self.resolve_mentions(&content).await?;

        // Held until publish so inserts and fanout keep the same order.
        let (_guard, channel) = self.lock_channel(channel_id).await?;
        self.ensure_member(&channel, user_id).await?;

        let message = Message::new(MessageTarget::Channel(channel_id), user_id, content, mentions);
        self.store.insert_message(&message).await?;
        self.lifecycle.touch_at(channel_id, message.created_at).await?;

        self.dispatcher.publish(
            Topic::Channel(channel_id),
            &ChatEvent::channel_message(&message, &author),
        );

        let notify: Vec<ObjectId> = message
            .mentions
            .iter()
            .copied()
            .filter(|id| *id != user_id)
            .collect();
        if !notify.is_empty() {
            let notification = ChatEvent::Notification {
                kind: NotificationKind::Mention,
                message: MessagePayload::new(&message, &author),
            };
            self.dispatcher.publish_to_users(notify, &notification);
        }

        debug!(%channel_id, message_id = %message.id, "Channel message sent");
        Ok(message)
    }

    /// Distinct ids of existing users named by `@username` tokens.
    pub async fn resolve_mentions(&self, content: &str) -> ChatResult<Vec<ObjectId>> {
        let mut seen = HashSet::new();
        let usernames: Vec<String> = self
            .mention_pattern
            .captures_iter(content)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect();
        if usernames.is_empty() {
            return Ok(Vec::new());
        }
        let users = self.store.find_users_by_usernames(&usernames).await?;
        Ok(users.into_iter().map(|u| u.id).collect())
    }

    /// Channel history, oldest first within the requested page.
    pub async fn list_channel_messages(
        &self,
        channel_id: ObjectId,
        viewer: ObjectId,
        params: &PaginationParams,
    ) -> ChatResult<PaginatedResult<MessagePayload>> {
        let channel = self.load_channel(channel_id).await?;
        self.ensure_visible(&channel, viewer).await?;
        let page = self.store.find_channel_messages(channel_id, params).await?;
        self.to_payloads(page).await
    }

    pub async fn delete_message(&self, message_id: ObjectId, user_id: ObjectId) -> ChatResult<()> {
        let message = match self.store.find_message(message_id).await {
            Ok(message) => message,
            Err(DaoError::NotFound) => return Err(ChatError::NotFound("message")),
            Err(e) => return Err(e.into()),
        };
        if message.user_id != user_id {
            return Err(ChatError::Forbidden(
                "only the author can delete a message".to_string(),
            ));
        }
        if !self.store.delete_message(message_id).await? {
            return Err(ChatError::NotFound("message"));
        }
        debug!(%message_id, "Message deleted");
        Ok(())
    }

    pub(super) async fn to_payloads(
        &self,
        mut page: PaginatedResult<Message>,
    ) -> ChatResult<PaginatedResult<MessagePayload>> {
        let senders = self.load_users(page.items.iter().map(|m| m.user_id).collect::<Vec<_>>()).await?;
        page.items.reverse();
        let items = page
            .items
            .iter()
            .filter_map(|message| {
                senders
                    .get(&message.user_id)
                    .map(|sender| MessagePayload::new(message, sender))
            })
            .collect();
        Ok(PaginatedResult {
            items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
        })
    }
}
