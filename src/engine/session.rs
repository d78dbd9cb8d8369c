use crate::{
    auth::Profile,
    ids::{ConnectionId, UserId},
};

/// The authenticated actor behind one connection.
#[derive(Debug, Clone)]
pub struct IdentityContext {
    pub user_id: UserId,
    pub connection: ConnectionId,
    pub profile: Profile,
}

/// Per-connection state, owned by whoever drives the socket. Handing it to
/// [`Engine::disconnect`](super::Engine::disconnect) consumes it, so a
/// connection can only be torn down once.
#[derive(Debug)]
pub struct Session {
    connection: ConnectionId,
    pub(super) identity: Option<IdentityContext>,
}

impl Session {
    pub(super) fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            identity: None,
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn identity(&self) -> Option<&IdentityContext> {
        self.identity.as_ref()
    }
}
