use crate::types::{GeneratorError, Result};
use interfaces::defs::GeneratedContent;
use tracing::debug;

/// Find the first balanced `{ ... }` object in free text.
///
/// Scans brace depth from the first `{`, ignoring braces that appear inside
/// JSON string literals. Returns `None` when no object closes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Turn an untrusted model reply into a validated [`GeneratedContent`].
pub fn parse_generated_content(reply: &str) -> Result<GeneratedContent> {
    let json = extract_json_object(reply)
        .ok_or_else(|| GeneratorError::Parse("reply contains no JSON object".to_string()))?;

    debug!("Extracted {} bytes of JSON from a {} byte reply", json.len(), reply.len());

    let content: GeneratedContent = serde_json::from_str(json)
        .map_err(|e| GeneratorError::Parse(format!("invalid JSON in reply: {}", e)))?;

    content.validate()?;
    Ok(content)
}
