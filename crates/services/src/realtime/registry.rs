use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use bson::oid::ObjectId;
use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use super::topic::Topic;

/// Serialized event text shared by every recipient of one publish.
pub type Payload = Arc<str>;

/// Bounded per-connection outbound queue, drained by the transport's writer task.
pub type Outbound = mpsc::Sender<Payload>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct ConnectionEntry {
    user_id: ObjectId,
    sender: Outbound,
    topics: HashSet<Topic>,
}

/// Many-to-many index between live connections and the topics they follow.
///
/// Lock order is always `connections` then `topics`; paths that touch both
/// maps without nesting release the first guard before taking the second.
pub struct SubscriptionRegistry {
    connections: DashMap<ConnectionId, ConnectionEntry>,
    topics: DashMap<Topic, HashMap<ConnectionId, Outbound>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            topics: DashMap::new(),
        }
    }

    pub fn register(&self, connection_id: ConnectionId, user_id: ObjectId, sender: Outbound) {
        self.connections.insert(
            connection_id,
            ConnectionEntry {
                user_id,
                sender,
                topics: HashSet::new(),
            },
        );
        debug!(%connection_id, ?user_id, "Connection registered");
    }

    /// Returns false when the connection is unknown (already disconnected).
    pub fn subscribe(&self, topic: Topic, connection_id: ConnectionId) -> bool {
        let Some(mut entry) = self.connections.get_mut(&connection_id) else {
            return false;
        };
        if entry.topics.insert(topic) {
            self.topics
                .entry(topic)
                .or_default()
                .insert(connection_id, entry.sender.clone());
            debug!(%connection_id, %topic, "Subscribed");
        }
        true
    }

    /// Returns whether the connection was subscribed to the topic.
    pub fn unsubscribe(&self, topic: Topic, connection_id: ConnectionId) -> bool {
        let removed = {
            let Some(mut entry) = self.connections.get_mut(&connection_id) else {
                return false;
            };
            if !entry.topics.remove(&topic) {
                return false;
            }
            if let Some(mut subscribers) = self.topics.get_mut(&topic) {
                subscribers.remove(&connection_id);
            }
            true
        };
        self.topics.remove_if(&topic, |_, subscribers| subscribers.is_empty());
        debug!(%connection_id, %topic, "Unsubscribed");
        removed
    }

    /// Removes the connection from every topic it followed.
    pub fn disconnect(&self, connection_id: ConnectionId) {
        let Some((_, entry)) = self.connections.remove(&connection_id) else {
            return;
        };
        for topic in &entry.topics {
            if let Some(mut subscribers) = self.topics.get_mut(topic) {
                subscribers.remove(&connection_id);
            }
            self.topics.remove_if(topic, |_, subscribers| subscribers.is_empty());
        }
        debug!(%connection_id, topics = entry.topics.len(), "Connection removed");
    }

    /// Unsubscribes every connection of `user_id` from `topic`.
    pub fn unsubscribe_user(&self, topic: Topic, user_id: ObjectId) -> usize {
        self.connections_of_user(user_id)
            .into_iter()
            .filter(|connection_id| self.unsubscribe(topic, *connection_id))
            .count()
    }

    /// Forgets a topic entirely, e.g. once its channel is gone.
    pub fn drop_topic(&self, topic: Topic) {
        let Some((_, subscribers)) = self.topics.remove(&topic) else {
            return;
        };
        for connection_id in subscribers.keys() {
            if let Some(mut entry) = self.connections.get_mut(connection_id) {
                entry.topics.remove(&topic);
            }
        }
        debug!(%topic, subscribers = subscribers.len(), "Topic dropped");
    }

    pub fn connections_for(&self, topic: Topic) -> Vec<ConnectionId> {
        self.topics
            .get(&topic)
            .map(|subscribers| subscribers.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn topics_of(&self, connection_id: ConnectionId) -> Vec<Topic> {
        self.connections
            .get(&connection_id)
            .map(|entry| entry.topics.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn user_of(&self, connection_id: ConnectionId) -> Option<ObjectId> {
        self.connections.get(&connection_id).map(|entry| entry.user_id)
    }

    pub fn connections_of_user(&self, user_id: ObjectId) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| *entry.key())
            .collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Hands `payload` to every subscriber of `topic` without waiting on any of them.
    ///
    /// The topic entry is held exclusively for the whole pass so concurrent
    /// publishes to one topic enqueue in a single order for every subscriber.
    /// Returns the number of queues that accepted the payload.
    pub fn deliver(&self, topic: Topic, payload: &Payload) -> usize {
        let mut delivered = 0;
        self.fan_out(topic, payload, |_| true, |_| delivered += 1);
        delivered
    }

    /// Like [`deliver`](Self::deliver), but skips the connections in `skip` and
    /// returns the ones that accepted the payload.
    pub fn deliver_except(
        &self,
        topic: Topic,
        payload: &Payload,
        skip: &HashSet<ConnectionId>,
    ) -> HashSet<ConnectionId> {
        let mut accepted = HashSet::new();
        self.fan_out(
            topic,
            payload,
            |connection_id| !skip.contains(connection_id),
            |connection_id| {
                accepted.insert(connection_id);
            },
        );
        accepted
    }

    fn fan_out(
        &self,
        topic: Topic,
        payload: &Payload,
        wanted: impl Fn(&ConnectionId) -> bool,
        mut accepted: impl FnMut(ConnectionId),
    ) {
        let mut closed = Vec::new();

        if let Some(subscribers) = self.topics.get_mut(&topic) {
            for (connection_id, sender) in subscribers.iter() {
                if !wanted(connection_id) {
                    continue;
                }
                match sender.try_send(Arc::clone(payload)) {
                    Ok(()) => accepted(*connection_id),
                    Err(TrySendError::Full(_)) => {
                        warn!(%connection_id, %topic, "Outbound queue full, dropping event");
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(%connection_id, %topic, "Connection closed, dropping event");
                        closed.push(*connection_id);
                    }
                }
            }
        }

        for connection_id in closed {
            self.disconnect(connection_id);
        }
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
