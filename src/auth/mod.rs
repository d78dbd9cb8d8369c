//! Account creation and credential checks.
//!
//! The engine only sees the [`AuthGateway`] and [`UserDirectory`] traits.
//! [`AccountStore`] is the in-memory implementation used by the server.

mod accounts;
mod avatar;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::UserId;

pub use accounts::AccountStore;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Public projection of a user, safe to send to any client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub handle: String,
    pub avatar: String,
    pub bio: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email already in use")]
    EmailTaken,

    #[error("username already in use: {0}")]
    HandleTaken(String),

    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::EmailTaken => "email_taken",
            Self::HandleTaken(_) => "handle_taken",
            Self::WeakPassword => "weak_password",
            Self::MissingField(_) => "missing_field",
            Self::Internal(_) => "internal_error",
        }
    }
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn verify(&self, credentials: Credentials) -> Result<Profile, AuthError>;
    async fn create(&self, registration: Registration) -> Result<Profile, AuthError>;
    fn profile(&self, id: &UserId) -> Option<Profile>;
    fn users(&self) -> Vec<Profile>;
}

/// Synchronous "does this user exist" lookup for the stores.
pub trait UserDirectory: Send + Sync {
    fn contains(&self, id: &UserId) -> bool;
}

#[cfg(test)]
pub(crate) fn test_profile(handle: &str) -> Profile {
    Profile {
        id: UserId::new(),
        first_name: handle.to_owned(),
        last_name: "Test".to_owned(),
        display_name: format!("{handle} Test"),
        handle: handle.to_owned(),
        avatar: avatar::avatar_url(handle, "Test"),
        bio: avatar::DEFAULT_BIO.to_owned(),
    }
}
