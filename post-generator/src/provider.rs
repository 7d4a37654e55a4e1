use crate::credentials::Credential;
use crate::types::{GeneratorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Whether a text request may consult live web search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grounding {
    None,
    WebSearch,
}

/// A connection to the generative provider bound to one credential.
#[async_trait]
pub trait ContentModel: Send + Sync {
    /// Loggable name; never contains the full credential.
    fn label(&self) -> String;

    /// Run a single-turn text prompt against `model` and return the reply text.
    async fn generate_text(&self, model: &str, prompt: &str, grounding: Grounding) -> Result<String>;

    /// Ask `model` for spoken audio of `text`. Returns the raw candidates so the
    /// caller can decide what counts as usable audio.
    async fn generate_speech(&self, model: &str, text: &str, voice: &str) -> Result<Vec<Candidate>>;
}

// API request types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

// API response types

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
    #[serde(rename = "inlineData")]
    pub inline_data: Option<InlineData>,
}

/// Base64-encoded binary payload attached to a response part.
#[derive(Debug, Clone, Deserialize)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

impl Candidate {
    pub fn parts(&self) -> &[ResponsePart] {
        self.content.as_ref().map(|c| c.parts.as_slice()).unwrap_or(&[])
    }

    pub fn text(&self) -> String {
        self.parts()
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Gemini REST client for one credential.
pub struct GeminiClient {
    label: String,
    api_key: String,
    api_base: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(index: usize, credential: &Credential, api_base: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self::with_client(index, credential, api_base, client))
    }

    pub fn with_client(index: usize, credential: &Credential, api_base: &str, client: Client) -> Self {
        Self {
            label: format!("gemini#{} ({})", index + 1, credential.masked()),
            api_key: credential.secret().to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:generateContent", self.api_base, model)
    }

    async fn send(&self, model: &str, request: &GenerateContentRequest) -> Result<Vec<Candidate>> {
        let url = self.endpoint(model);
        debug!("POST {} via {}", url, self.label);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GenerateContentResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(GeneratorError::Provider {
                status: Some(status.as_u16()),
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| GeneratorError::provider(format!("malformed response from {}: {}", model, e)))?;

        if let Some(error) = parsed.error {
            return Err(GeneratorError::provider(error.message));
        }

        Ok(parsed.candidates)
    }
}

#[async_trait]
impl ContentModel for GeminiClient {
    fn label(&self) -> String {
        self.label.clone()
    }

    async fn generate_text(&self, model: &str, prompt: &str, grounding: Grounding) -> Result<String> {
        let tools = match grounding {
            Grounding::WebSearch => vec![Tool {
                google_search: GoogleSearch {},
            }],
            Grounding::None => Vec::new(),
        };

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![TextPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: Some(0.9),
                ..Default::default()
            },
            tools,
        };

        let candidates = self.send(model, &request).await?;
        let text = candidates.first().map(|c| c.text()).unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GeneratorError::provider(format!("{} returned no text", model)));
        }
        Ok(text)
    }

    async fn generate_speech(&self, model: &str, text: &str, voice: &str) -> Result<Vec<Candidate>> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![TextPart {
                    text: text.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    },
                }),
                ..Default::default()
            },
            tools: Vec::new(),
        };

        self.send(model, &request).await
    }
}
