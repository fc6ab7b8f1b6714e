use huddle_db::models::ModelError;
use thiserror::Error;

use crate::dao::base::DaoError;

/// Coarse classification used by transports to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    InvalidState,
    Internal,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    InvalidState(String),

    #[error("a channel with this name already exists")]
    NameConflict,
    #[error("user is already a member of this channel")]
    AlreadyMember,
    #[error("user is banned from this channel")]
    Banned,
    #[error("user is not a member of this channel")]
    NotMember,
    #[error("the channel owner cannot be removed")]
    OwnerCannotBeRemoved,
    #[error("user is not banned from this channel")]
    NotBanned,

    #[error("you cannot vote to kick yourself")]
    SelfVote,
    #[error("the channel owner cannot be kicked")]
    CannotTargetOwner,
    #[error("only channel members can do this")]
    NotAMember,
    #[error("target is not a member of this channel")]
    TargetNotMember,
    #[error("vote-kick is not available in private channels")]
    PrivateChannelForbidden,

    #[error("store error: {0}")]
    Store(DaoError),
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::NotFound(_) => ErrorKind::NotFound,
            ChatError::Forbidden(_)
            | ChatError::Banned
            | ChatError::NotAMember
            | ChatError::PrivateChannelForbidden => ErrorKind::Forbidden,
            ChatError::NameConflict | ChatError::AlreadyMember | ChatError::SelfVote => {
                ErrorKind::Conflict
            }
            ChatError::InvalidState(_)
            | ChatError::NotMember
            | ChatError::OwnerCannotBeRemoved
            | ChatError::NotBanned
            | ChatError::CannotTargetOwner
            | ChatError::TargetNotMember => ErrorKind::InvalidState,
            ChatError::Store(_) => ErrorKind::Internal,
        }
    }
}

impl From<DaoError> for ChatError {
    fn from(err: DaoError) -> Self {
        match err {
            DaoError::NotFound => ChatError::NotFound("resource"),
            DaoError::Forbidden(msg) => ChatError::Forbidden(msg),
            DaoError::Validation(e) => e.into(),
            other => ChatError::Store(other),
        }
    }
}

impl From<ModelError> for ChatError {
    fn from(err: ModelError) -> Self {
        ChatError::InvalidState(err.to_string())
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
