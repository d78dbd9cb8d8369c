use serde::Serialize;
use thiserror::Error;

use crate::{auth::AuthError, chat::ChatError, content::ContentError, feed::FeedError};

/// The five ways a client request can be refused. Sent as `kind` next to
/// the error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthFailure,
    ValidationFailure,
    NotFound,
    NotAParticipant,
    Unauthenticated,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("log in first")]
    Unauthenticated,

    #[error("malformed event: {0}")]
    Malformed(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Content(#[from] ContentError),
}

impl EngineError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Malformed(_) => "malformed",
            Self::Auth(err) => err.error_code(),
            Self::Chat(err) => err.error_code(),
            Self::Feed(err) => err.error_code(),
            Self::Content(err) => err.error_code(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Auth(_) => ErrorKind::AuthFailure,
            Self::Malformed(_) | Self::Content(_) => ErrorKind::ValidationFailure,
            Self::Chat(ChatError::ChatNotFound(_) | ChatError::InvalidParticipant(_)) => {
                ErrorKind::NotFound
            }
            Self::Chat(ChatError::NotAParticipant(_)) => ErrorKind::NotAParticipant,
            Self::Chat(ChatError::Content(_)) => ErrorKind::ValidationFailure,
            Self::Feed(FeedError::PostNotFound(_)) => ErrorKind::NotFound,
            Self::Feed(FeedError::Content(_)) => ErrorKind::ValidationFailure,
        }
    }
}
