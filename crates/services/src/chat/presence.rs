use bson::oid::ObjectId;
use huddle_db::models::{User, UserStatus};
use tracing::{debug, info};

use super::ChatService;
use crate::dao::base::DaoError;
use crate::error::{ChatError, ChatResult};
use crate::realtime::{ChatEvent, ConnectionId, Outbound, Topic};

impl ChatService {
    /// Publishes a typing indicator to the channel. Nothing is persisted.
    pub async fn set_typing(
        &self,
        channel_id: ObjectId,
        user_id: ObjectId,
        is_typing: bool,
        text: Option<String>,
    ) -> ChatResult<()> {
        let channel = self.load_channel(channel_id).await?;
        self.ensure_member(&channel, user_id).await?;
        let user = self.load_user(user_id).await?;
        self.dispatcher.publish(
            Topic::Channel(channel_id),
            &ChatEvent::Typing {
                channel_id: channel_id.to_hex(),
                user_id: user_id.to_hex(),
                username: user.username,
                is_typing,
                text,
            },
        );
        Ok(())
    }

    pub async fn get_user(&self, user_id: ObjectId) -> ChatResult<User> {
        self.load_user(user_id).await
    }

    /// Case-insensitive username/name lookup for invite and mention pickers.
    pub async fn search_users(&self, query: &str, limit: usize) -> ChatResult<Vec<User>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.search_users(query, limit.clamp(1, 50)).await?)
    }

    pub async fn set_user_status(&self, user_id: ObjectId, status: UserStatus) -> ChatResult<()> {
        match self.store.update_user_status(user_id, status).await {
            Ok(()) => {}
            Err(DaoError::NotFound) => return Err(ChatError::NotFound("user")),
            Err(e) => return Err(e.into()),
        }
        self.dispatcher.publish(
            Topic::Global,
            &ChatEvent::StatusChange {
                user_id: user_id.to_hex(),
                status,
            },
        );
        debug!(?user_id, ?status, "Status changed");
        Ok(())
    }

    /// Registers a live connection and follows the user's personal and global topics.
    pub fn connect(&self, connection_id: ConnectionId, user_id: ObjectId, sender: Outbound) {
        self.registry.register(connection_id, user_id, sender);
        self.registry.subscribe(Topic::User(user_id), connection_id);
        self.registry.subscribe(Topic::Global, connection_id);
        info!(%connection_id, ?user_id, "Connection opened");
    }

    pub fn disconnect(&self, connection_id: ConnectionId) {
        self.registry.disconnect(connection_id);
        info!(%connection_id, "Connection closed");
    }

    /// Subscribes a connection after checking its user may read the topic:
    /// channel topics need membership, personal topics belong to their user only.
    pub async fn subscribe(&self, connection_id: ConnectionId, topic: Topic) -> ChatResult<()> {
        let user_id = self
            .registry
            .user_of(connection_id)
            .ok_or(ChatError::NotFound("connection"))?;

        match topic {
            Topic::Global => {
                self.registry.subscribe(topic, connection_id);
            }
            Topic::User(owner) => {
                if owner != user_id {
                    return Err(ChatError::Forbidden(
                        "cannot follow another user's notifications".to_string(),
                    ));
                }
                self.registry.subscribe(topic, connection_id);
            }
            Topic::Channel(channel_id) => {
                // Under the channel lock a concurrent removal cannot slip between check and subscribe.
                let (_guard, channel) = self.lock_channel(channel_id).await?;
                self.ensure_member(&channel, user_id).await?;
                self.registry.subscribe(topic, connection_id);
            }
        }
        Ok(())
    }

    pub fn unsubscribe(&self, connection_id: ConnectionId, topic: Topic) -> bool {
        self.registry.unsubscribe(topic, connection_id)
    }
}
