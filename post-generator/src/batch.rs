use crate::strategy::GenerationStrategy;
use crate::types::BatchOutcome;
use futures::future::join_all;
use std::time::Duration;
use tracing::{info, warn};

/// Fans the fallback strategy out over many categories, a chunk at a time.
#[derive(Debug, Clone)]
pub struct BatchGenerator {
    strategy: GenerationStrategy,
    chunk_delay: Duration,
}

impl BatchGenerator {
    pub fn new(strategy: GenerationStrategy, chunk_delay: Duration) -> Self {
        Self { strategy, chunk_delay }
    }

    /// Runs up to `max_concurrent` categories at once and waits for the whole
    /// chunk to settle before pausing and starting the next one.
    ///
    /// Never fails: each category's result is captured in its own
    /// [`BatchOutcome`], in the same order as `categories`.
    pub async fn generate_many(&self, categories: &[String], max_concurrent: usize) -> Vec<BatchOutcome> {
        let chunk_size = max_concurrent.max(1);
        let chunk_count = categories.len().div_ceil(chunk_size);
        let mut outcomes = Vec::with_capacity(categories.len());

        for (index, chunk) in categories.chunks(chunk_size).enumerate() {
            if index > 0 && !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }

            info!("Starting batch chunk {}/{} ({} categories)", index + 1, chunk_count, chunk.len());

            let settled = join_all(chunk.iter().map(|category| self.generate_one(category))).await;
            outcomes.extend(settled);
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!("Batch finished: {}/{} categories generated", succeeded, outcomes.len());
        outcomes
    }

    async fn generate_one(&self, category: &str) -> BatchOutcome {
        match self.strategy.generate_with_fallback(category).await {
            Ok(content) => BatchOutcome {
                category: category.to_string(),
                content: Some(content),
                error: None,
            },
            Err(e) => {
                warn!("Batch generation failed for '{}': {}", category, e);
                BatchOutcome {
                    category: category.to_string(),
                    content: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
