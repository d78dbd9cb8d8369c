//! Wire events. Every frame is `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};

use crate::{
    auth::{Credentials, Profile, Registration},
    chat::{Chat, Message},
    error::ErrorKind,
    feed::{Comment, Post},
    ids::{ChatId, PostId, UserId},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePost {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddComment {
    pub post_id: PostId,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikePost {
    pub post_id: PostId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChat {
    pub target_user_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub chat_id: ChatId,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameScore {
    pub score: u64,
    pub game: String,
}

/// Events a client sends.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    Register(Registration),
    Login(Credentials),
    CreatePost(CreatePost),
    AddComment(AddComment),
    LikePost(LikePost),
    CreateChat(CreateChat),
    SendMessage(SendMessage),
    GameScore(GameScore),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register(_) => "register",
            Self::Login(_) => "login",
            Self::CreatePost(_) => "create-post",
            Self::AddComment(_) => "add-comment",
            Self::LikePost(_) => "like-post",
            Self::CreateChat(_) => "create-chat",
            Self::SendMessage(_) => "send-message",
            Self::GameScore(_) => "game-score",
        }
    }

    pub fn decode(frame: &str) -> serde_json::Result<Self> {
        serde_json::from_str(frame)
    }
}

/// Events the server pushes.
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    Registered {
        user: Profile,
    },
    LoggedIn {
        user: Profile,
        feed: Vec<Post>,
        online_users: Vec<Profile>,
        chats: Vec<Chat>,
    },
    AuthError {
        code: &'static str,
        kind: ErrorKind,
        message: String,
    },
    NewPost(Post),
    NewComment {
        post_id: PostId,
        comment: Comment,
    },
    PostLiked {
        post_id: PostId,
        likes: u64,
    },
    ChatCreated(Chat),
    NewMessage {
        chat_id: ChatId,
        message: Message,
    },
    NewHighscore {
        player: Profile,
        score: u64,
        game: String,
    },
    UserOnline(Profile),
    UserOffline(Profile),
    /// The caller's request was refused. `event` is `None` when the frame
    /// could not be decoded at all.
    Rejected {
        event: Option<&'static str>,
        code: &'static str,
        kind: ErrorKind,
        message: String,
    },
}

impl ServerEvent {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_kebab_case_events_with_camel_case_fields() {
        let chat_id = ChatId::new();
        let frame = json!({
            "event": "send-message",
            "data": { "chatId": chat_id, "content": "hi" }
        })
        .to_string();

        let ClientEvent::SendMessage(msg) = ClientEvent::decode(&frame).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(msg.chat_id, chat_id);
        assert_eq!(msg.content, "hi");
    }

    #[test]
    fn register_bio_is_optional() {
        let frame = json!({
            "event": "register",
            "data": {
                "email": "a@b.c",
                "password": "123456",
                "firstName": "A",
                "lastName": "B",
                "username": "ab"
            }
        })
        .to_string();

        let event = ClientEvent::decode(&frame).unwrap();
        assert_eq!(event.name(), "register");
    }

    #[test]
    fn unknown_event_is_an_error() {
        assert!(ClientEvent::decode(r#"{"event":"delete-everything","data":{}}"#).is_err());
        assert!(ClientEvent::decode("not json").is_err());
    }

    #[test]
    fn encodes_name_and_payload() {
        let post_id = PostId::new();
        let encoded = ServerEvent::PostLiked { post_id, likes: 3 }.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(
            value,
            json!({ "event": "post-liked", "data": { "postId": post_id, "likes": 3 } })
        );
    }

    #[test]
    fn rejection_without_event_is_null() {
        let encoded = ServerEvent::Rejected {
            event: None,
            code: "malformed",
            kind: ErrorKind::ValidationFailure,
            message: "bad".to_owned(),
        }
        .encode()
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["event"], "rejected");
        assert!(value["data"]["event"].is_null());
        assert_eq!(value["data"]["kind"], "validation_failure");
    }
}
