//! Real-time fanout: topic names, the subscription registry, the dispatcher
//! and the event envelopes it carries.

pub mod dispatcher;
pub mod event;
pub mod registry;
pub mod topic;

pub use dispatcher::Dispatcher;
pub use event::{ChatEvent, DeletionReason, NotificationKind, RemovalReason};
pub use registry::{ConnectionId, Outbound, Payload, SubscriptionRegistry};
pub use topic::{Topic, TopicParseError};
