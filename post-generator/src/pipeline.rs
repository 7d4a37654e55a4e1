use crate::service::ContentService;
use crate::traits::{Announcer, ImageSource, PostStore};
use crate::types::{BlogPost, GeneratorError, PostImage, PostKind, Result};
use crate::utils::{estimate_read_time, slugify};
use chrono::Utc;
use interfaces::defs::GeneratedContent;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Select a category, generate, narrate, illustrate, store and announce.
pub struct PostPipeline {
    service: Arc<ContentService>,
    store: Arc<dyn PostStore>,
    images: Option<Arc<dyn ImageSource>>,
    announcer: Option<Arc<dyn Announcer>>,
    categories: Vec<String>,
}

impl PostPipeline {
    pub fn new(service: Arc<ContentService>, store: Arc<dyn PostStore>, categories: Vec<String>) -> Result<Self> {
        if categories.is_empty() {
            return Err(GeneratorError::Config("no categories configured".to_string()));
        }
        Ok(Self {
            service,
            store,
            images: None,
            announcer: None,
            categories,
        })
    }

    pub fn with_images(mut self, images: Arc<dyn ImageSource>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn with_announcer(mut self, announcer: Arc<dyn Announcer>) -> Self {
        self.announcer = Some(announcer);
        self
    }

    /// Rotate through categories by the number of posts already published.
    pub async fn next_category(&self) -> Result<String> {
        let published = self.store.count_posts().await?.max(0) as usize;
        Ok(self.categories[published % self.categories.len()].clone())
    }

    /// One full run. Only generation and persistence failures fail the run.
    pub async fn run_once(&self, kind: PostKind) -> Result<BlogPost> {
        let category = self.next_category().await?;
        info!("Publishing a {} post for '{}'", kind.as_str(), category);

        let content = match kind {
            PostKind::Blog => self.service.generate_blog_post(&category).await?,
            PostKind::Trending => self.service.generate_trending_post(&category).await?,
        };

        let narration = format!("{}. {}", content.title, content.excerpt);
        let audio_path = self.service.generate_audio_summary(&narration).await;

        let slug = self.unique_slug(&content.title).await?;
        let image = self.find_image(&category, &content).await;

        let post = BlogPost {
            id: Uuid::new_v4(),
            slug,
            category,
            kind,
            read_time_minutes: estimate_read_time(&content.content),
            content,
            audio_path,
            image,
            published_at: Utc::now(),
        };

        if let Err(e) = self.store.insert_post(&post).await {
            if let Some(path) = &post.audio_path {
                if let Err(remove_error) = tokio::fs::remove_file(path).await {
                    warn!("Could not remove narration {} for the unsaved post: {}", path, remove_error);
                }
            }
            return Err(e);
        }
        info!("Stored post '{}' as /{}", post.content.title, post.slug);

        self.announce(&post).await;
        Ok(post)
    }

    /// Publish every `every`, up to `max_runs` times when given. A failed run
    /// is logged and the schedule continues.
    pub async fn run_scheduled(&self, every: Duration, kind: PostKind, max_runs: Option<usize>) {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut runs = 0usize;

        loop {
            ticker.tick().await;

            match self.run_once(kind).await {
                Ok(post) => info!("Scheduled run published '{}'", post.slug),
                Err(e) => error!("Scheduled run failed: {}", e),
            }

            runs += 1;
            if max_runs.is_some_and(|max| runs >= max) {
                info!("Reached {} scheduled runs, stopping", runs);
                break;
            }
        }
    }

    async fn unique_slug(&self, title: &str) -> Result<String> {
        let base = slugify(title);
        let mut candidate = base.clone();
        let mut suffix = 2;

        while self.store.slug_exists(&candidate).await? {
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        Ok(candidate)
    }

    async fn find_image(&self, category: &str, content: &GeneratedContent) -> Option<PostImage> {
        let images = self.images.as_ref()?;
        let query = std::iter::once(category)
            .chain(content.keywords.iter().take(2).map(|k| k.as_str()))
            .collect::<Vec<_>>()
            .join(" ");

        match images.find_image(&query).await {
            Ok(image) => image,
            Err(e) => {
                warn!("Image lookup failed for '{}', publishing without one: {}", query, e);
                None
            }
        }
    }

    async fn announce(&self, post: &BlogPost) {
        let Some(announcer) = self.announcer.as_ref() else {
            return;
        };

        let subscribers = match self.store.list_subscribers().await {
            Ok(subscribers) => subscribers,
            Err(e) => {
                warn!("Could not load subscribers, announcing to the channel only: {}", e);
                Vec::new()
            }
        };

        if let Err(e) = announcer.announce(post, &subscribers).await {
            warn!("Announcement on {} incomplete: {}", announcer.channel_name(), e);
        }
    }
}
