//! Binds inbound events to store operations and fans the results out.
//!
//! Store locks are released before any delivery happens: every store call
//! returns an owned value which is then handed to the router.

mod session;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::{
    auth::{AuthGateway, Credentials, Profile, Registration, UserDirectory},
    broadcast::{BroadcastRouter, BroadcastTarget},
    chat::{Chat, ChatStore},
    config::Config,
    connections::{Connections, Frame},
    content,
    error::EngineError,
    feed::FeedStore,
    ids::UserId,
    presence::SessionRegistry,
    protocol::{
        AddComment, ClientEvent, CreateChat, CreatePost, GameScore, LikePost, SendMessage,
        ServerEvent,
    },
};

pub use session::{IdentityContext, Session};

const MAX_GAME_NAME_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub online_users: usize,
    pub total_users: usize,
    pub total_posts: usize,
    pub total_chats: usize,
}

pub struct Engine {
    auth: Arc<dyn AuthGateway>,
    sessions: Arc<SessionRegistry>,
    connections: Arc<Connections>,
    router: BroadcastRouter,
    chats: ChatStore,
    feed: FeedStore,
}

impl Engine {
    pub fn new<A>(config: &Config, accounts: Arc<A>) -> Self
    where
        A: AuthGateway + UserDirectory + 'static,
    {
        let sessions = Arc::new(SessionRegistry::new());
        let connections = Arc::new(Connections::new(config.send_queue));

        Self {
            router: BroadcastRouter::new(sessions.clone(), connections.clone()),
            chats: ChatStore::new(accounts.clone(), config.max_message_len),
            feed: FeedStore::new(config.max_post_len, config.max_comment_len),
            auth: accounts,
            sessions,
            connections,
        }
    }

    pub fn auth(&self) -> &dyn AuthGateway {
        &*self.auth
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn chats(&self) -> &ChatStore {
        &self.chats
    }

    pub fn feed(&self) -> &FeedStore {
        &self.feed
    }

    pub fn stats(&self) -> Stats {
        Stats {
            online_users: self.sessions.online_count(),
            total_users: self.auth.users().len(),
            total_posts: self.feed.len(),
            total_chats: self.chats.len(),
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Opens an anonymous connection. Frames for it arrive on the receiver.
    pub fn connect(&self) -> (Session, mpsc::Receiver<Frame>) {
        let (connection, rx) = self.connections.open();
        tracing::info!(conn = %connection, "connected");
        (Session::new(connection), rx)
    }

    /// Tears a connection down. Announces `user-offline` if this was the
    /// user's last connection.
    pub fn disconnect(&self, mut session: Session) {
        self.release(&mut session);
        self.connections.close(session.connection());
        tracing::info!(conn = %session.connection(), "disconnected");
    }

    /// Decodes and handles one inbound frame.
    pub async fn handle_frame(&self, session: &mut Session, frame: &str) {
        match ClientEvent::decode(frame) {
            Ok(event) => self.handle(session, event).await,
            Err(err) => self.reject(session, None, EngineError::Malformed(err.to_string())),
        }
    }

    pub async fn handle(&self, session: &mut Session, event: ClientEvent) {
        let name = event.name();
        tracing::debug!(conn = %session.connection(), event = name, "event");

        let result = match event {
            ClientEvent::Register(registration) => self.register(session, registration).await,
            ClientEvent::Login(credentials) => self.login(session, credentials).await,
            ClientEvent::CreatePost(payload) => self.create_post(session, payload),
            ClientEvent::AddComment(payload) => self.add_comment(session, payload),
            ClientEvent::LikePost(payload) => self.like_post(session, payload),
            ClientEvent::CreateChat(payload) => self.create_chat(session, payload),
            ClientEvent::SendMessage(payload) => self.send_message(session, payload),
            ClientEvent::GameScore(payload) => self.game_score(session, payload),
        };

        if let Err(err) = result {
            self.reject(session, Some(name), err);
        }
    }

    async fn register(
        &self,
        session: &mut Session,
        registration: Registration,
    ) -> Result<(), EngineError> {
        let profile = self.auth.create(registration).await?;

        let came_online = self.bind(session, profile.clone());
        self.router.send_to(
            session.connection(),
            &ServerEvent::Registered {
                user: profile.clone(),
            },
        );
        if came_online {
            self.announce_online(session, profile);
        }
        Ok(())
    }

    async fn login(&self, session: &mut Session, credentials: Credentials) -> Result<(), EngineError> {
        let profile = self.auth.verify(credentials).await?;
        tracing::info!(conn = %session.connection(), user = %profile.id, "logged in");

        if session.identity().is_some_and(|identity| identity.user_id != profile.id) {
            self.release(session);
        }

        // queued before the connection joins fan-out, so `logged-in` is
        // always the first frame and no broadcast is both in the snapshot
        // and delivered after it
        let mut online_users = self.online_profiles();
        if !online_users.iter().any(|user| user.id == profile.id) {
            online_users.push(profile.clone());
            online_users.sort_by_key(|user| user.id);
        }
        let logged_in = ServerEvent::LoggedIn {
            user: profile.clone(),
            feed: self.feed.feed_snapshot(),
            online_users,
            chats: self.chats_for(profile.id),
        };
        self.router.send_to(session.connection(), &logged_in);

        let came_online = self.bind(session, profile.clone());
        if came_online {
            self.announce_online(session, profile);
        }
        Ok(())
    }

    fn create_post(&self, session: &Session, CreatePost { content }: CreatePost) -> Result<(), EngineError> {
        let identity = require(session)?;
        let post = self.feed.create_post(&identity.profile, &content)?;
        self.router.deliver(BroadcastTarget::All, &ServerEvent::NewPost(post));
        Ok(())
    }

    fn add_comment(
        &self,
        session: &Session,
        AddComment { post_id, content }: AddComment,
    ) -> Result<(), EngineError> {
        let identity = require(session)?;
        let comment = self.feed.add_comment(post_id, &identity.profile, &content)?;
        self.router.deliver(
            BroadcastTarget::All,
            &ServerEvent::NewComment { post_id, comment },
        );
        Ok(())
    }

    fn like_post(&self, session: &Session, LikePost { post_id }: LikePost) -> Result<(), EngineError> {
        let identity = require(session)?;
        let likes = self.feed.like_post(post_id, identity.user_id)?;
        self.router.deliver(
            BroadcastTarget::All,
            &ServerEvent::PostLiked { post_id, likes },
        );
        Ok(())
    }

    fn create_chat(
        &self,
        session: &Session,
        CreateChat { target_user_id }: CreateChat,
    ) -> Result<(), EngineError> {
        let identity = require(session)?;
        let chat = self.chats.create_chat(identity.user_id, target_user_id)?;
        self.router.deliver(
            BroadcastTarget::Set(chat.participants.clone()),
            &ServerEvent::ChatCreated(chat),
        );
        Ok(())
    }

    fn send_message(
        &self,
        session: &Session,
        SendMessage { chat_id, content }: SendMessage,
    ) -> Result<(), EngineError> {
        let identity = require(session)?;
        let message = self.chats.append_message(chat_id, &identity.profile, &content)?;
        let participants = self.chats.participants(chat_id)?;
        self.router.deliver(
            BroadcastTarget::Set(participants.to_vec()),
            &ServerEvent::NewMessage { chat_id, message },
        );
        Ok(())
    }

    fn game_score(&self, session: &Session, GameScore { score, game }: GameScore) -> Result<(), EngineError> {
        let identity = require(session)?;
        let game = content::normalize(&game, MAX_GAME_NAME_LEN)?;
        self.router.deliver(
            BroadcastTarget::All,
            &ServerEvent::NewHighscore {
                player: identity.profile.clone(),
                score,
                game,
            },
        );
        Ok(())
    }

    /// Attaches `profile` to the session, replacing any previous identity.
    /// Returns whether the user just came online.
    fn bind(&self, session: &mut Session, profile: Profile) -> bool {
        if let Some(identity) = &mut session.identity {
            if identity.user_id == profile.id {
                identity.profile = profile;
                return false;
            }
        }
        self.release(session);

        let connection = session.connection();
        let registered = self.sessions.register(profile.id, connection);
        if let Some(user) = registered.displaced {
            self.announce_offline(user);
        }

        session.identity = Some(IdentityContext {
            user_id: profile.id,
            connection,
            profile,
        });
        registered.came_online
    }

    fn release(&self, session: &mut Session) {
        let Some(identity) = session.identity.take() else {
            return;
        };
        let Some(gone) = self.sessions.unregister(identity.connection) else {
            return;
        };
        if gone.went_offline {
            tracing::info!(user = %gone.user, "offline");
            self.router
                .deliver(BroadcastTarget::All, &ServerEvent::UserOffline(identity.profile));
        }
    }

    fn announce_online(&self, session: &Session, profile: Profile) {
        tracing::info!(user = %profile.id, "online");
        self.router.deliver(
            BroadcastTarget::Others(session.connection()),
            &ServerEvent::UserOnline(profile),
        );
    }

    fn announce_offline(&self, user: UserId) {
        if let Some(profile) = self.auth.profile(&user) {
            self.router
                .deliver(BroadcastTarget::All, &ServerEvent::UserOffline(profile));
        }
    }

    fn reject(&self, session: &Session, event: Option<&'static str>, err: EngineError) {
        tracing::debug!(
            conn = %session.connection(),
            event = event.unwrap_or("-"),
            code = err.error_code(),
            %err,
            "rejected"
        );

        let kind = err.kind();
        let reply = match err {
            EngineError::Auth(err) => ServerEvent::AuthError {
                code: err.error_code(),
                kind,
                message: err.to_string(),
            },
            err => ServerEvent::Rejected {
                event,
                code: err.error_code(),
                kind,
                message: err.to_string(),
            },
        };
        self.router.send_to(session.connection(), &reply);
    }

    pub fn online_profiles(&self) -> Vec<Profile> {
        self.sessions
            .online_users()
            .into_iter()
            .filter_map(|user| self.auth.profile(&user))
            .collect()
    }

    fn chats_for(&self, user: UserId) -> Vec<Chat> {
        let mut chats: Vec<Chat> = self.chats.chats_for(user).collect();
        chats.sort_by_key(|chat| chat.id);
        chats
    }
}

fn require(session: &Session) -> Result<&IdentityContext, EngineError> {
    session.identity().ok_or(EngineError::Unauthenticated)
}
