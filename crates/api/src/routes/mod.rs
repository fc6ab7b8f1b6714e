pub mod channel;
pub mod direct_message;
pub mod message;
pub mod typing;
pub mod user;
