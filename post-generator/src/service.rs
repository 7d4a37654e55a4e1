use crate::audio::{AudioSynthesizer, ExternalTtsCommand, SpeechFallback};
use crate::batch::BatchGenerator;
use crate::credentials::CredentialPool;
use crate::generator::TextGenerator;
use crate::provider::{ContentModel, GeminiClient};
use crate::strategy::GenerationStrategy;
use crate::trending::SearchGroundedGenerator;
use crate::types::{BatchOutcome, GeneratorConfig, Result};
use interfaces::defs::GeneratedContent;
use std::sync::Arc;
use tracing::info;

/// The generation surface the rest of the system calls into.
pub struct ContentService {
    pool: Arc<CredentialPool>,
    strategy: GenerationStrategy,
    batch: BatchGenerator,
    trending: SearchGroundedGenerator,
    audio: AudioSynthesizer,
}

impl ContentService {
    /// Build Gemini clients for every configured credential and wire the
    /// generators around them.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let pool = CredentialPool::from_credentials(&config.credentials, |index, credential| {
            let client = GeminiClient::new(index, credential, &config.api_base, config.request_timeout_seconds)?;
            Ok(Arc::new(client) as Arc<dyn ContentModel>)
        })?;

        let fallback = ExternalTtsCommand::from_command_line(&config.tts_fallback_command)?;
        Self::new(Arc::new(pool), config, Arc::new(fallback))
    }

    pub fn new(
        pool: Arc<CredentialPool>,
        config: &GeneratorConfig,
        fallback: Arc<dyn SpeechFallback>,
    ) -> Result<Self> {
        let generator = TextGenerator::new(config.content_language.clone());
        let strategy = GenerationStrategy::new(pool.clone(), config.models.clone(), generator)?;
        let batch = BatchGenerator::new(strategy.clone(), config.chunk_delay);

        let trending = SearchGroundedGenerator::new(
            pool.primary().clone(),
            config.trending_model.clone(),
            config.content_language.clone(),
        );

        let audio = AudioSynthesizer::new(
            pool.primary().clone(),
            config.tts_model.clone(),
            config.tts_voice.clone(),
            config.audio_dir.clone(),
            fallback,
        );

        info!(
            "Content service ready: {} credential(s), {} model(s)",
            pool.count(),
            config.models.len()
        );

        Ok(Self {
            pool,
            strategy,
            batch,
            trending,
            audio,
        })
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    /// Fails only once every model/credential combination has failed.
    pub async fn generate_blog_post(&self, category: &str) -> Result<GeneratedContent> {
        self.strategy.generate_with_fallback(category).await
    }

    /// Never fails; inspect each outcome.
    pub async fn generate_multiple_posts(&self, categories: &[String], max_concurrent: usize) -> Vec<BatchOutcome> {
        self.batch.generate_many(categories, max_concurrent).await
    }

    pub async fn generate_trending_post(&self, category: &str) -> Result<GeneratedContent> {
        self.trending.generate_trending(category).await
    }

    /// Path of the narration file, or `None` when no audio could be made.
    pub async fn generate_audio_summary(&self, text: &str) -> Option<String> {
        self.audio.synthesize(text).await.map(|artifact| artifact.path_string())
    }
}
