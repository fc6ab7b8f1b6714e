//! Channel membership, bans and vote-kicks.

pub mod locks;
pub mod membership;
pub mod vote_kick;

pub use locks::{ChannelGuard, ChannelLocks};
pub use membership::MembershipStore;
pub use vote_kick::{VoteKickCoordinator, VoteOutcome};
