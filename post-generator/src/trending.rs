use crate::parser::parse_generated_content;
use crate::prompts::trending_post_prompt;
use crate::provider::{ContentModel, Grounding};
use crate::types::Result;
use interfaces::defs::GeneratedContent;
use std::sync::Arc;
use tracing::info;

/// Single-attempt, web-search-grounded generation for short trending posts.
///
/// There is no model or credential fallback on this path: one designated
/// model, one client, one try.
pub struct SearchGroundedGenerator {
    client: Arc<dyn ContentModel>,
    model: String,
    language: String,
}

impl SearchGroundedGenerator {
    pub fn new(client: Arc<dyn ContentModel>, model: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            language: language.into(),
        }
    }

    pub async fn generate_trending(&self, category: &str) -> Result<GeneratedContent> {
        let prompt = trending_post_prompt(category, &self.language);
        let reply = self
            .client
            .generate_text(&self.model, &prompt, Grounding::WebSearch)
            .await?;

        let content = parse_generated_content(&reply)?;
        info!("Generated trending post '{}' for '{}' with {}", content.title, category, self.model);
        Ok(content)
    }
}
