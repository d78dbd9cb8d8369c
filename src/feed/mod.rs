//! The public feed: posts, comments and like counters.

mod model;

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;
use time::OffsetDateTime;

use crate::{
    auth::Profile,
    content::{self, ContentError},
    ids::{CommentId, PostId, UserId},
};

pub use model::{Comment, Post};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("no such post: {0}")]
    PostNotFound(PostId),

    #[error(transparent)]
    Content(#[from] ContentError),
}

impl FeedError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PostNotFound(_) => "post_not_found",
            Self::Content(err) => err.error_code(),
        }
    }
}

#[derive(Default)]
struct Feed {
    // oldest first; the snapshot reverses
    posts: Vec<Post>,
    index: HashMap<PostId, usize>,
}

impl Feed {
    fn post_mut(&mut self, id: PostId) -> Result<&mut Post, FeedError> {
        let slot = *self.index.get(&id).ok_or(FeedError::PostNotFound(id))?;
        Ok(&mut self.posts[slot])
    }
}

pub struct FeedStore {
    feed: RwLock<Feed>,
    max_post_len: usize,
    max_comment_len: usize,
}

impl FeedStore {
    pub fn new(max_post_len: usize, max_comment_len: usize) -> Self {
        Self {
            feed: RwLock::new(Feed::default()),
            max_post_len,
            max_comment_len,
        }
    }

    pub fn create_post(&self, author: &Profile, content: &str) -> Result<Post, FeedError> {
        let content = content::normalize(content, self.max_post_len)?;

        let mut feed = self.feed.write();
        let post = Post {
            id: PostId::new(),
            author_id: author.id,
            author: author.clone(),
            content,
            likes: 0,
            comments: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        let slot = feed.posts.len();
        feed.index.insert(post.id, slot);
        feed.posts.push(post.clone());
        Ok(post)
    }

    pub fn add_comment(
        &self,
        post_id: PostId,
        author: &Profile,
        content: &str,
    ) -> Result<Comment, FeedError> {
        let mut feed = self.feed.write();
        let post = feed.post_mut(post_id)?;
        let comment = Comment {
            id: CommentId::new(),
            post_id,
            author_id: author.id,
            author: author.clone(),
            content: content::normalize(content, self.max_comment_len)?,
            created_at: OffsetDateTime::now_utc(),
        };
        post.comments.push(comment.clone());
        Ok(comment)
    }

    /// Adds one like and returns the new total. The same user may like a
    /// post any number of times.
    pub fn like_post(&self, post_id: PostId, user: UserId) -> Result<u64, FeedError> {
        let mut feed = self.feed.write();
        let post = feed.post_mut(post_id)?;
        post.likes += 1;
        tracing::trace!(post = %post_id, %user, likes = post.likes, "post liked");
        Ok(post.likes)
    }

    /// All posts, most recent first.
    pub fn feed_snapshot(&self) -> Vec<Post> {
        self.feed.read().posts.iter().rev().cloned().collect()
    }

    pub fn get(&self, post_id: PostId) -> Option<Post> {
        let feed = self.feed.read();
        feed.index.get(&post_id).map(|&slot| feed.posts[slot].clone())
    }

    pub fn len(&self) -> usize {
        self.feed.read().posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_profile;

    fn store() -> FeedStore {
        FeedStore::new(500, 500)
    }

    #[test]
    fn snapshot_is_most_recent_first() {
        let store = store();
        let author = test_profile("alex");
        let p1 = store.create_post(&author, "first").unwrap();
        let p2 = store.create_post(&author, "second").unwrap();

        let ids: Vec<PostId> = store.feed_snapshot().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![p2.id, p1.id]);
    }

    #[test]
    fn post_content_is_bounded() {
        let store = store();
        let author = test_profile("alex");

        assert_eq!(
            store.create_post(&author, " "),
            Err(FeedError::Content(ContentError::Empty))
        );
        assert_eq!(
            store.create_post(&author, &"x".repeat(501)),
            Err(FeedError::Content(ContentError::TooLong { max: 500 }))
        );
        assert!(store.create_post(&author, &"x".repeat(500)).is_ok());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn comments_append_oldest_first() {
        let store = store();
        let (alex, maria) = (test_profile("alex"), test_profile("maria"));
        let post = store.create_post(&alex, "hello").unwrap();

        store.add_comment(post.id, &maria, "one").unwrap();
        store.add_comment(post.id, &alex, "two").unwrap();

        let post = store.get(post.id).unwrap();
        let contents: Vec<&str> = post.comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, ["one", "two"]);
        assert_eq!(post.comments[0].author_id, maria.id);
    }

    #[test]
    fn comment_errors() {
        let store = store();
        let alex = test_profile("alex");
        let post = store.create_post(&alex, "hello").unwrap();
        let missing = PostId::new();

        assert_eq!(
            store.add_comment(missing, &alex, "hi"),
            Err(FeedError::PostNotFound(missing))
        );
        assert_eq!(
            store.add_comment(post.id, &alex, "").unwrap_err().error_code(),
            "empty_content"
        );
        assert!(store.get(post.id).unwrap().comments.is_empty());
    }

    #[test]
    fn likes_are_not_deduplicated() {
        let store = store();
        let alex = test_profile("alex");
        let post = store.create_post(&alex, "like me").unwrap();

        assert_eq!(store.like_post(post.id, alex.id), Ok(1));
        assert_eq!(store.like_post(post.id, alex.id), Ok(2));
        assert_eq!(store.get(post.id).unwrap().likes, 2);

        let missing = PostId::new();
        assert_eq!(
            store.like_post(missing, alex.id),
            Err(FeedError::PostNotFound(missing))
        );
    }
}
