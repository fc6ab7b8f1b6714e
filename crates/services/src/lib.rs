pub mod auth;
pub mod chat;
pub mod dao;
pub mod error;
pub mod lifecycle;
pub mod moderation;
pub mod realtime;
pub mod store;

pub use auth::AuthService;
pub use chat::ChatService;
pub use dao::*;
pub use error::{ChatError, ChatResult, ErrorKind};
pub use store::{ChatStore, MemoryStore, MongoStore};
