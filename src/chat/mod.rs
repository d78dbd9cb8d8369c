//! Two-party chats with append-only history.
//!
//! Each chat has its own lock, so traffic in one chat never waits on another.

mod model;

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use thiserror::Error;
use time::OffsetDateTime;

use crate::{
    auth::{Profile, UserDirectory},
    content::{self, ContentError},
    ids::{ChatId, MessageId, UserId},
};

pub use model::{Chat, Message};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("no such chat: {0}")]
    ChatNotFound(ChatId),

    #[error("invalid chat participant: {0}")]
    InvalidParticipant(UserId),

    #[error("not a participant of chat {0}")]
    NotAParticipant(ChatId),

    #[error(transparent)]
    Content(#[from] ContentError),
}

impl ChatError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ChatNotFound(_) => "chat_not_found",
            Self::InvalidParticipant(_) => "invalid_participant",
            Self::NotAParticipant(_) => "not_a_participant",
            Self::Content(err) => err.error_code(),
        }
    }
}

struct Room {
    id: ChatId,
    // fixed at creation
    participants: Arc<[UserId]>,
    messages: Mutex<Vec<Message>>,
}

impl Room {
    fn snapshot(&self) -> Chat {
        Chat {
            id: self.id,
            participants: self.participants.to_vec(),
            messages: self.messages.lock().clone(),
        }
    }
}

pub struct ChatStore {
    chats: DashMap<ChatId, Arc<Room>>,
    directory: Arc<dyn UserDirectory>,
    max_message_len: usize,
}

impl ChatStore {
    pub fn new(directory: Arc<dyn UserDirectory>, max_message_len: usize) -> Self {
        Self {
            chats: DashMap::new(),
            directory,
            max_message_len,
        }
    }

    /// Opens a new chat between two users. Repeated calls for the same pair
    /// open separate chats.
    pub fn create_chat(&self, requester: UserId, target: UserId) -> Result<Chat, ChatError> {
        if requester == target || !self.directory.contains(&target) {
            return Err(ChatError::InvalidParticipant(target));
        }

        let room = Arc::new(Room {
            id: ChatId::new(),
            participants: Arc::from([requester, target]),
            messages: Mutex::new(Vec::new()),
        });
        let chat = room.snapshot();
        self.chats.insert(room.id, room);

        tracing::debug!(chat = %chat.id, %requester, %target, "chat created");
        Ok(chat)
    }

    pub fn append_message(
        &self,
        chat_id: ChatId,
        author: &Profile,
        content: &str,
    ) -> Result<Message, ChatError> {
        let room = self.room(chat_id)?;
        if !room.participants.contains(&author.id) {
            return Err(ChatError::NotAParticipant(chat_id));
        }
        let content = content::normalize(content, self.max_message_len)?;

        let mut messages = room.messages.lock();
        let message = Message {
            id: MessageId::new(),
            chat_id,
            author_id: author.id,
            author: author.clone(),
            content,
            created_at: OffsetDateTime::now_utc(),
        };
        messages.push(message.clone());
        Ok(message)
    }

    pub fn participants(&self, chat_id: ChatId) -> Result<Arc<[UserId]>, ChatError> {
        Ok(self.room(chat_id)?.participants.clone())
    }

    pub fn get(&self, chat_id: ChatId) -> Option<Chat> {
        self.chats.get(&chat_id).map(|room| room.snapshot())
    }

    /// Chats `user` takes part in, recomputed on every call.
    pub fn chats_for(&self, user: UserId) -> impl Iterator<Item = Chat> + '_ {
        self.chats
            .iter()
            .filter(move |room| room.participants.contains(&user))
            .map(|room| room.snapshot())
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    fn room(&self, chat_id: ChatId) -> Result<Arc<Room>, ChatError> {
        // clone out so the map shard is released before the room is locked
        self.chats
            .get(&chat_id)
            .map(|room| room.value().clone())
            .ok_or(ChatError::ChatNotFound(chat_id))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::auth::test_profile;

    struct Known(HashSet<UserId>);

    impl UserDirectory for Known {
        fn contains(&self, id: &UserId) -> bool {
            self.0.contains(id)
        }
    }

    fn setup() -> (ChatStore, Profile, Profile, Profile) {
        let (a, b, c) = (test_profile("a"), test_profile("b"), test_profile("c"));
        let known = Known([a.id, b.id, c.id].into_iter().collect());
        (ChatStore::new(Arc::new(known), 2000), a, b, c)
    }

    #[test]
    fn create_chat_between_two_known_users() {
        let (store, a, b, _) = setup();
        let chat = store.create_chat(a.id, b.id).unwrap();
        assert_eq!(chat.participants, vec![a.id, b.id]);
        assert!(chat.messages.is_empty());
        assert_eq!(store.get(chat.id), Some(chat));
    }

    #[test]
    fn create_chat_rejects_self_and_strangers() {
        let (store, a, _, _) = setup();
        let stranger = UserId::new();
        assert_eq!(
            store.create_chat(a.id, a.id),
            Err(ChatError::InvalidParticipant(a.id))
        );
        assert_eq!(
            store.create_chat(a.id, stranger),
            Err(ChatError::InvalidParticipant(stranger))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn same_pair_gets_a_new_chat_each_time() {
        let (store, a, b, _) = setup();
        let first = store.create_chat(a.id, b.id).unwrap();
        let second = store.create_chat(b.id, a.id).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn outsider_cannot_append() {
        let (store, a, b, c) = setup();
        let chat = store.create_chat(a.id, b.id).unwrap();
        store.append_message(chat.id, &a, "hello").unwrap();

        let err = store.append_message(chat.id, &c, "let me in").unwrap_err();
        assert_eq!(err, ChatError::NotAParticipant(chat.id));
        assert_eq!(store.get(chat.id).unwrap().messages.len(), 1);
    }

    #[test]
    fn blank_message_is_rejected() {
        let (store, a, b, _) = setup();
        let chat = store.create_chat(a.id, b.id).unwrap();

        let err = store.append_message(chat.id, &b, "   ").unwrap_err();
        assert_eq!(err.error_code(), "empty_content");
        assert!(store.get(chat.id).unwrap().messages.is_empty());
    }

    #[test]
    fn unknown_chat() {
        let (store, a, _, _) = setup();
        let missing = ChatId::new();
        assert_eq!(
            store.append_message(missing, &a, "hi"),
            Err(ChatError::ChatNotFound(missing))
        );
    }

    #[test]
    fn messages_keep_append_order_under_concurrent_traffic() {
        let (store, a, b, c) = setup();
        let store = Arc::new(store);
        let ordered = store.create_chat(a.id, b.id).unwrap();
        let busy = store.create_chat(b.id, c.id).unwrap();

        let noise = {
            let store = store.clone();
            let c = c.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    store.append_message(busy.id, &c, &format!("noise {i}")).unwrap();
                }
            })
        };
        for text in ["m1", "m2", "m3"] {
            store.append_message(ordered.id, &a, text).unwrap();
        }
        noise.join().unwrap();

        let contents: Vec<String> = store
            .get(ordered.id)
            .unwrap()
            .messages
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, ["m1", "m2", "m3"]);
    }

    #[test]
    fn chats_for_lists_only_own_chats() {
        let (store, a, b, c) = setup();
        let ab = store.create_chat(a.id, b.id).unwrap();
        let bc = store.create_chat(b.id, c.id).unwrap();

        let ids: Vec<ChatId> = store.chats_for(a.id).map(|chat| chat.id).collect();
        assert_eq!(ids, vec![ab.id]);

        let mut ids: Vec<ChatId> = store.chats_for(b.id).map(|chat| chat.id).collect();
        ids.sort();
        assert_eq!(ids, vec![ab.id, bc.id]);
    }
}
