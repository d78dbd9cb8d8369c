//! Who is online, and through which connections.
//!
//! A user is online while at least one connection is registered for them.
//! Transitions are computed under a single lock so that concurrent logins
//! and disconnects of the same user report exactly one 0→1 and one 1→0.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::ids::{ConnectionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registered {
    /// The user had no connections before this one.
    pub came_online: bool,
    /// The connection was bound to another user, who now has none left.
    pub displaced: Option<UserId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unregistered {
    pub user: UserId,
    pub went_offline: bool,
}

#[derive(Default)]
struct Sessions {
    by_user: HashMap<UserId, HashSet<ConnectionId>>,
    // a connection belongs to at most one user
    by_connection: HashMap<ConnectionId, UserId>,
}

impl Sessions {
    fn remove(&mut self, connection: ConnectionId) -> Option<Unregistered> {
        let user = self.by_connection.remove(&connection)?;
        let went_offline = match self.by_user.get_mut(&user) {
            Some(set) => {
                set.remove(&connection);
                set.is_empty()
            }
            None => true,
        };
        if went_offline {
            self.by_user.remove(&user);
        }
        Some(Unregistered { user, went_offline })
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<Sessions>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `connection` to `user`. Registering the same pair twice is a no-op.
    pub fn register(&self, user: UserId, connection: ConnectionId) -> Registered {
        let mut sessions = self.sessions.lock();

        let mut displaced = None;
        let owner = sessions.by_connection.get(&connection).copied();
        match owner {
            Some(owner) if owner == user => {
                return Registered {
                    came_online: false,
                    displaced: None,
                };
            }
            Some(_) => {
                if let Some(gone) = sessions.remove(connection) {
                    displaced = gone.went_offline.then_some(gone.user);
                }
            }
            None => {}
        }

        sessions.by_connection.insert(connection, user);
        let set = sessions.by_user.entry(user).or_default();
        set.insert(connection);

        Registered {
            came_online: set.len() == 1,
            displaced,
        }
    }

    /// Drops `connection`. Unknown connections (including ones already
    /// dropped) yield `None`.
    pub fn unregister(&self, connection: ConnectionId) -> Option<Unregistered> {
        self.sessions.lock().remove(connection)
    }

    pub fn is_online(&self, user: UserId) -> bool {
        self.sessions.lock().by_user.contains_key(&user)
    }

    pub fn connections_for(&self, user: UserId) -> HashSet<ConnectionId> {
        self.sessions
            .lock()
            .by_user
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    pub fn user_of(&self, connection: ConnectionId) -> Option<UserId> {
        self.sessions.lock().by_connection.get(&connection).copied()
    }

    pub fn all_connections(&self) -> HashSet<ConnectionId> {
        self.sessions.lock().by_connection.keys().copied().collect()
    }

    pub fn online_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.sessions.lock().by_user.keys().copied().collect();
        users.sort();
        users
    }

    pub fn online_count(&self) -> usize {
        self.sessions.lock().by_user.len()
    }
}
