use crate::parser::parse_generated_content;
use crate::prompts::blog_post_prompt;
use crate::provider::{ContentModel, Grounding};
use crate::types::Result;
use interfaces::defs::GeneratedContent;
use tracing::debug;

/// Runs one (client, model) attempt and turns the reply into content.
#[derive(Debug, Clone)]
pub struct TextGenerator {
    language: String,
}

impl TextGenerator {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// Network failures, missing JSON, bad JSON and missing fields all surface
    /// as an error; the caller treats every one of them as a failed attempt.
    pub async fn generate(
        &self,
        client: &dyn ContentModel,
        model: &str,
        category: &str,
    ) -> Result<GeneratedContent> {
        let prompt = blog_post_prompt(category, &self.language);
        let reply = client.generate_text(model, &prompt, Grounding::None).await?;

        debug!("{} / {} replied with {} bytes for '{}'", client.label(), model, reply.len(), category);

        parse_generated_content(&reply)
    }
}
