use crate::traits::ImageSource;
use crate::types::{GeneratorError, PostImage, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

const UNSPLASH_API: &str = "https://api.unsplash.com";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
    user: Option<PhotoUser>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

#[derive(Debug, Deserialize)]
struct PhotoUser {
    name: String,
}

/// Picks the top landscape result from Unsplash photo search.
pub struct UnsplashImages {
    client: Client,
    access_key: String,
    api_base: String,
}

impl UnsplashImages {
    pub fn new(access_key: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent("post-generator/0.1")
            .timeout(Duration::from_secs(timeout_seconds))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            access_key: access_key.into(),
            api_base: UNSPLASH_API.to_string(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl ImageSource for UnsplashImages {
    async fn find_image(&self, query: &str) -> Result<Option<PostImage>> {
        let mut url = Url::parse(&format!("{}/search/photos", self.api_base.trim_end_matches('/')))
            .map_err(|e| GeneratorError::Config(format!("invalid image API base: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("per_page", "1")
            .append_pair("orientation", "landscape");

        debug!("Searching images for '{}'", query);

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeneratorError::General(format!(
                "image search failed: HTTP {}",
                response.status()
            )));
        }

        let search: SearchResponse = response.json().await?;
        Ok(search.results.into_iter().next().map(|photo| PostImage {
            url: photo.urls.regular,
            credit: photo.user.map(|u| u.name),
        }))
    }
}
