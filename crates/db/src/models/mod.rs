pub mod channel;
pub mod channel_ban;
pub mod channel_kick_vote;
pub mod channel_member;
pub mod direct_message;
pub mod message;
pub mod user;

pub use channel::Channel;
pub use channel_ban::{BanType, ChannelBan};
pub use channel_kick_vote::ChannelKickVote;
pub use channel_member::ChannelMember;
pub use direct_message::{DirectMessage, canonical_pair};
pub use message::{Message, MessageTarget};
pub use user::{User, UserStatus};

use thiserror::Error;

/// Invariant violations detected while building or validating a model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("message must belong to a channel or a direct message, not both")]
    AmbiguousMessageTarget,
    #[error("message must belong to a channel or a direct message")]
    MissingMessageTarget,
    #[error("cannot start a conversation with yourself")]
    SelfConversation,
}
