use crate::types::{BlogPost, PostImage, Result, Subscriber};
use async_trait::async_trait;

/// Durable storage for published posts and the subscriber list.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Persist a post and return its id
    async fn insert_post(&self, post: &BlogPost) -> Result<uuid::Uuid>;

    async fn slug_exists(&self, slug: &str) -> Result<bool>;

    /// Number of posts published so far; drives category rotation
    async fn count_posts(&self) -> Result<i64>;

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>>;
}

/// Finds an illustrative image for a post.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// `Ok(None)` means the provider had nothing suitable
    async fn find_image(&self, query: &str) -> Result<Option<PostImage>>;
}

/// Tells the outside world about a new post.
#[async_trait]
pub trait Announcer: Send + Sync {
    fn channel_name(&self) -> String;

    async fn announce(&self, post: &BlogPost, subscribers: &[Subscriber]) -> Result<()>;
}
