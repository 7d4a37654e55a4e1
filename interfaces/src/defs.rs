use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// The structured record every text-generation path produces.
///
/// Field names follow the JSON shape the model is asked to return, so a reply
/// can be deserialized straight into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub excerpt: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seo_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seo_description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
}

// Models emit `null` for fields they had nothing to say about.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("generated content is missing a title")]
    MissingTitle,

    #[error("generated content is missing a body")]
    MissingContent,
}

impl GeneratedContent {
    /// A record is usable only when both `title` and `content` carry text.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.title.trim().is_empty() {
            return Err(ContentError::MissingTitle);
        }
        if self.content.trim().is_empty() {
            return Err(ContentError::MissingContent);
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Blog,
    Trending,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Blog => "blog",
            PostKind::Trending => "trending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostImage {
    pub url: String,
    pub credit: Option<String>,
}

/// A generated post ready to be persisted and announced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: Uuid,
    pub slug: String,
    pub category: String,
    pub kind: PostKind,
    pub content: GeneratedContent,
    pub read_time_minutes: u32,
    pub audio_path: Option<String>,
    pub image: Option<PostImage>,
    pub published_at: DateTime<Utc>,
}

/// Someone who receives a direct announcement for every new post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub chat_id: String,
    pub name: Option<String>,
}

