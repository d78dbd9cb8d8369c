//! Demo content for a fresh server: two accounts, a welcome post and a chat.

use crate::{auth::Registration, engine::Engine, error::EngineError};

pub const DEMO_PASSWORD: &str = "123456";

fn demo_account(email: &str, first_name: &str, last_name: &str, username: &str, bio: &str) -> Registration {
    Registration {
        email: email.to_owned(),
        password: DEMO_PASSWORD.to_owned(),
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        username: username.to_owned(),
        bio: Some(bio.to_owned()),
    }
}

pub async fn demo(engine: &Engine) -> Result<(), EngineError> {
    let auth = engine.auth();
    let alex = auth
        .create(demo_account(
            "alex@demo.ru",
            "Alex",
            "Petrov",
            "alex_petrov",
            "Building REENKS 🚀",
        ))
        .await?;
    let maria = auth
        .create(demo_account(
            "maria@demo.ru",
            "Maria",
            "Ivanova",
            "maria_ivanova",
            "Living Glass designer 🎨",
        ))
        .await?;

    let feed = engine.feed();
    let post = feed.create_post(
        &alex,
        "🚀 REENKS is live! New Living Glass design, a messenger and games!",
    )?;
    feed.add_comment(post.id, &maria, "Looks amazing! 🎉")?;
    for _ in 0..15 {
        feed.like_post(post.id, maria.id)?;
    }

    let chats = engine.chats();
    let chat = chats.create_chat(alex.id, maria.id)?;
    chats.append_message(chat.id, &alex, "Hi! What do you think of the new version?")?;
    chats.append_message(chat.id, &maria, "Love it! The design is 🔥")?;

    tracing::info!(users = 2, posts = 1, chats = 1, "demo data seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{auth::AccountStore, config::Config};

    #[tokio::test]
    async fn seeds_through_the_public_stores() {
        let engine = Engine::new(&Config::default(), Arc::new(AccountStore::new(4)));
        demo(&engine).await.unwrap();

        let stats = engine.stats();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.total_posts, 1);
        assert_eq!(stats.total_chats, 1);

        let post = &engine.feed().feed_snapshot()[0];
        assert_eq!(post.likes, 15);
        assert_eq!(post.comments.len(), 1);
    }
}
