use crate::credentials::CredentialPool;
use crate::generator::TextGenerator;
use crate::types::{GeneratorError, ModelAttempt, Result};
use interfaces::defs::GeneratedContent;
use std::sync::Arc;
use tracing::{info, warn};

/// Walks the model × credential matrix until one attempt yields content.
///
/// Models are the outer loop: a better model is tried on every credential
/// before degrading to the next one. Attempts run strictly one after another.
#[derive(Debug, Clone)]
pub struct GenerationStrategy {
    pool: Arc<CredentialPool>,
    models: Vec<String>,
    generator: TextGenerator,
}

impl GenerationStrategy {
    pub fn new(pool: Arc<CredentialPool>, models: Vec<String>, generator: TextGenerator) -> Result<Self> {
        if models.is_empty() {
            return Err(GeneratorError::NoModels);
        }
        Ok(Self {
            pool,
            models,
            generator,
        })
    }

    /// Every pair in the order they are tried.
    pub fn attempts(&self) -> Vec<ModelAttempt> {
        self.models
            .iter()
            .flat_map(|model| {
                (0..self.pool.count()).map(move |client_index| ModelAttempt {
                    client_index,
                    model: model.clone(),
                })
            })
            .collect()
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Returns the first success, or [`GeneratorError::Exhausted`] carrying the
    /// error of the last attempt made.
    pub async fn generate_with_fallback(&self, category: &str) -> Result<GeneratedContent> {
        let attempts = self.attempts();
        let total = attempts.len();
        let mut last_error = None;

        for (n, attempt) in attempts.into_iter().enumerate() {
            let client = self.pool.client_at(attempt.client_index)?;

            match self.generator.generate(client.as_ref(), &attempt.model, category).await {
                Ok(content) => {
                    info!(
                        "Generated '{}' for '{}' with {} via {} (attempt {}/{})",
                        content.title,
                        category,
                        attempt.model,
                        client.label(),
                        n + 1,
                        total
                    );
                    return Ok(content);
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{} failed for '{}' ({} via {}): {}",
                        n + 1,
                        total,
                        category,
                        attempt.model,
                        client.label(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        let last = last_error.unwrap_or_else(|| GeneratorError::General("no attempts were made".to_string()));
        Err(GeneratorError::Exhausted {
            attempts: total,
            last: Box::new(last),
        })
    }
}
