pub mod base;
pub mod channel;
pub mod direct_message;
pub mod message;
pub mod user;

pub use base::BaseDao;
pub use channel::ChannelDao;
pub use direct_message::DirectMessageDao;
pub use message::MessageDao;
pub use user::UserDao;
