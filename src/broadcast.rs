//! Fan-out of server events to live connections.
//!
//! Delivery is fire-and-forget: a recipient whose queue is gone or full is
//! skipped and the rest still get the event.

use std::{collections::HashSet, sync::Arc};

use crate::{
    connections::{Connections, DeliveryError, Frame},
    ids::{ConnectionId, UserId},
    presence::SessionRegistry,
    protocol::ServerEvent,
};

#[derive(Debug, Clone)]
pub enum BroadcastTarget {
    Single(UserId),
    Set(Vec<UserId>),
    /// Every logged-in connection.
    All,
    /// Every logged-in connection except one.
    Others(ConnectionId),
}

pub struct BroadcastRouter {
    sessions: Arc<SessionRegistry>,
    connections: Arc<Connections>,
}

impl BroadcastRouter {
    pub fn new(sessions: Arc<SessionRegistry>, connections: Arc<Connections>) -> Self {
        Self {
            sessions,
            connections,
        }
    }

    fn resolve(&self, target: &BroadcastTarget) -> HashSet<ConnectionId> {
        match target {
            BroadcastTarget::Single(user) => self.sessions.connections_for(*user),
            BroadcastTarget::Set(users) => users
                .iter()
                .flat_map(|user| self.sessions.connections_for(*user))
                .collect(),
            BroadcastTarget::All => self.sessions.all_connections(),
            BroadcastTarget::Others(except) => {
                let mut all = self.sessions.all_connections();
                all.remove(except);
                all
            }
        }
    }

    /// Pushes `event` to every connection `target` resolves to and returns
    /// how many accepted it.
    pub fn deliver(&self, target: BroadcastTarget, event: &ServerEvent) -> usize {
        let Some(frame) = encode(event) else {
            return 0;
        };

        let mut delivered = 0;
        for connection in self.resolve(&target) {
            match self.connections.send(connection, frame.clone()) {
                Ok(()) => delivered += 1,
                Err(DeliveryError::Full) => {
                    tracing::warn!(conn = %connection, "send queue full, frame dropped")
                }
                Err(err) => tracing::debug!(conn = %connection, %err, "skipped recipient"),
            }
        }
        tracing::trace!(to = ?target, delivered, "fan-out");
        delivered
    }

    /// Replies on one connection, logged in or not.
    pub fn send_to(&self, connection: ConnectionId, event: &ServerEvent) -> bool {
        let Some(frame) = encode(event) else {
            return false;
        };
        match self.connections.send(connection, frame) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(conn = %connection, %err, "reply dropped");
                false
            }
        }
    }
}

fn encode(event: &ServerEvent) -> Option<Frame> {
    match event.encode() {
        Ok(json) => Some(Frame::from(json)),
        Err(err) => {
            tracing::error!(%err, "failed to encode event");
            None
        }
    }
}
