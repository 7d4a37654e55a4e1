//! Prompt templates for the text-generation paths.

const JSON_SHAPE: &str = r#"{
  "title": "catchy title, at most 70 characters",
  "excerpt": "one or two sentence hook",
  "content": "full post body in markdown",
  "seoTitle": "search-friendly title, at most 60 characters",
  "seoDescription": "meta description, at most 155 characters",
  "keywords": ["tag1", "tag2", "tag3", "tag4", "tag5"]
}"#;

/// Instruction for a regular long-form post in `category`.
pub fn blog_post_prompt(category: &str, language: &str) -> String {
    format!(
        "You are an experienced blog writer. Pick a timely, specific angle within the \
         category \"{category}\" and write an original blog post about it.\n\n\
         Requirements:\n\
         - Write in {language} with a friendly, informative tone.\n\
         - The body should be 600 to 900 words of markdown with `##` section headings.\n\
         - Provide a short excerpt, SEO title, SEO description and 5 keywords.\n\n\
         Return ONLY a JSON object with exactly this shape and no other text:\n{JSON_SHAPE}"
    )
}

/// Instruction for a short, search-grounded "what's happening now" post.
pub fn trending_post_prompt(category: &str, language: &str) -> String {
    format!(
        "Use web search to find the most relevant breaking news about \"{category}\" from \
         the last 24 hours. Pick one development and write a short, informal post about it, \
         styled like a social media update.\n\n\
         Requirements:\n\
         - Write in {language}, casual and energetic, emojis allowed.\n\
         - The body should be 150 to 300 words of markdown and mention where the news came from.\n\
         - Provide a short excerpt, SEO title, SEO description and 5 keywords.\n\n\
         Return ONLY a JSON object with exactly this shape and no other text:\n{JSON_SHAPE}"
    )
}

/// Instruction passed to the speech model along with the narration text.
pub fn narration_prompt(text: &str) -> String {
    format!("Read the following aloud in a clear, warm voice:\n\n{}", text)
}
