use std::collections::HashSet;
use std::sync::Arc;

use bson::oid::ObjectId;
use tracing::{debug, warn};

use super::event::{ChatEvent, RemovalReason};
use super::registry::{Payload, SubscriptionRegistry};
use super::topic::Topic;

/// Fire-and-forget fanout. Publishing never fails from the caller's point of view;
/// slow or dead connections lose the event without affecting anyone else.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<SubscriptionRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SubscriptionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Returns how many connections accepted the event.
    pub fn publish(&self, topic: Topic, event: &ChatEvent) -> usize {
        let Some(payload) = encode(event) else {
            return 0;
        };
        let delivered = self.registry.deliver(topic, &payload);
        debug!(%topic, kind = event.kind(), delivered, "Event published");
        delivered
    }

    /// Publishes one event to the personal topic of each user, serializing once.
    pub fn publish_to_users<I>(&self, user_ids: I, event: &ChatEvent) -> usize
    where
        I: IntoIterator<Item = ObjectId>,
    {
        let Some(payload) = encode(event) else {
            return 0;
        };
        user_ids
            .into_iter()
            .map(|user_id| self.registry.deliver(Topic::User(user_id), &payload))
            .sum()
    }

    /// Publishes to the channel topic, then to the personal topics of `user_ids`
    /// on connections the channel publish did not already reach. Each connection
    /// gets the event at most once. Returns how many connections accepted it.
    pub fn publish_to_channel_and_users<I>(
        &self,
        channel_id: ObjectId,
        user_ids: I,
        event: &ChatEvent,
    ) -> usize
    where
        I: IntoIterator<Item = ObjectId>,
    {
        let Some(payload) = encode(event) else {
            return 0;
        };
        let topic = Topic::Channel(channel_id);
        let mut reached = self.registry.deliver_except(topic, &payload, &HashSet::new());
        for user_id in user_ids {
            let extra = self
                .registry
                .deliver_except(Topic::User(user_id), &payload, &reached);
            reached.extend(extra);
        }
        debug!(%topic, kind = event.kind(), delivered = reached.len(), "Event published");
        reached.len()
    }

    /// Announces a removed member to the channel and to the user, then stops
    /// the user's connections from following the channel.
    pub fn member_removed(&self, channel_id: ObjectId, user_id: ObjectId, reason: RemovalReason) {
        let event = ChatEvent::ChannelMemberRemoved {
            channel_id: channel_id.to_hex(),
            user_id: user_id.to_hex(),
            reason,
        };
        self.publish_to_channel_and_users(channel_id, [user_id], &event);
        self.registry.unsubscribe_user(Topic::Channel(channel_id), user_id);
    }
}

fn encode(event: &ChatEvent) -> Option<Payload> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Arc::from(text)),
        Err(e) => {
            warn!(kind = event.kind(), %e, "Failed to serialize event");
            None
        }
    }
}
