//! Deterministic stand-ins for the provider and the publishing collaborators.
//!
//! Used by the integration tests and by the binary's `--dry-run` mode.

use crate::audio::SpeechFallback;
use crate::provider::{Candidate, CandidateContent, ContentModel, Grounding, InlineData, ResponsePart};
use crate::traits::{Announcer, ImageSource, PostStore};
use crate::types::{BlogPost, GeneratorError, PostImage, Result, Subscriber};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use interfaces::defs::GeneratedContent;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// A well-formed record for tests and dry runs.
pub fn sample_content(title: &str) -> GeneratedContent {
    GeneratedContent {
        title: title.to_string(),
        excerpt: format!("A quick look at {}.", title.to_lowercase()),
        content: format!("## {}\n\nThis post walks through the essentials in plain language.", title),
        seo_title: title.to_string(),
        seo_description: format!("Everything worth knowing about {}.", title.to_lowercase()),
        keywords: vec!["news".to_string(), "guide".to_string()],
    }
}

/// A reply the way models tend to send it: JSON wrapped in chatter.
pub fn chatty_reply(content: &GeneratedContent) -> String {
    let json = serde_json::to_string_pretty(content).unwrap_or_default();
    format!("Sure! Here is your post:\n```json\n{}\n```\nLet me know if you want changes.", json)
}

#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Fail(String),
}

/// One observed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub client: String,
    pub model: String,
    pub grounding: Grounding,
}

pub type CallLog = Arc<Mutex<Vec<RecordedCall>>>;

pub fn new_call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Whether a tracked request began or settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    Start,
    End,
}

/// Ordered start/end events for requests whose category has a scripted delay.
pub type Timeline = Arc<Mutex<Vec<(Span, String)>>>;

pub fn new_timeline() -> Timeline {
    Arc::new(Mutex::new(Vec::new()))
}

/// Tracks how many requests are in flight at once.
#[derive(Debug, Default)]
pub struct ConcurrencyProbe {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Provider client whose replies are scripted per model name.
///
/// Unscripted models fail, so a test only needs to script the pairs it cares about.
pub struct ScriptedModel {
    label: String,
    replies: HashMap<String, Scripted>,
    category_replies: HashMap<String, Scripted>,
    category_delays: HashMap<String, Duration>,
    timeline: Option<Timeline>,
    speech: Option<Scripted>,
    speech_mime: String,
    delay: Duration,
    log: CallLog,
    probe: Option<Arc<ConcurrencyProbe>>,
}

impl ScriptedModel {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            replies: HashMap::new(),
            category_replies: HashMap::new(),
            category_delays: HashMap::new(),
            timeline: None,
            speech: None,
            speech_mime: "audio/mpeg".to_string(),
            delay: Duration::ZERO,
            log: new_call_log(),
            probe: None,
        }
    }

    pub fn with_reply(mut self, model: &str, reply: impl Into<String>) -> Self {
        self.replies.insert(model.to_string(), Scripted::Reply(reply.into()));
        self
    }

    pub fn with_failure(mut self, model: &str, message: impl Into<String>) -> Self {
        self.replies.insert(model.to_string(), Scripted::Fail(message.into()));
        self
    }

    /// Fail any prompt mentioning `category`, whatever the model.
    pub fn failing_category(mut self, category: &str, message: impl Into<String>) -> Self {
        self.category_replies
            .insert(category.to_string(), Scripted::Fail(message.into()));
        self
    }

    pub fn with_speech(mut self, mime_type: &str, audio: &[u8]) -> Self {
        self.speech_mime = mime_type.to_string();
        self.speech = Some(Scripted::Reply(STANDARD.encode(audio)));
        self
    }

    pub fn with_speech_failure(mut self, message: impl Into<String>) -> Self {
        self.speech = Some(Scripted::Fail(message.into()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Latency for prompts mentioning `category`, overriding [`Self::with_delay`].
    pub fn with_category_delay(mut self, category: &str, delay: Duration) -> Self {
        self.category_delays.insert(category.to_string(), delay);
        self
    }

    pub fn with_timeline(mut self, timeline: Timeline) -> Self {
        self.timeline = Some(timeline);
        self
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    pub fn with_probe(mut self, probe: Arc<ConcurrencyProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn record(&self, model: &str, grounding: Grounding) {
        if let Ok(mut log) = self.log.lock() {
            log.push(RecordedCall {
                client: self.label.clone(),
                model: model.to_string(),
                grounding,
            });
        }
    }

    fn mark(&self, span: Span, category: Option<&str>) {
        if let (Some(timeline), Some(category)) = (&self.timeline, category) {
            if let Ok(mut events) = timeline.lock() {
                events.push((span, category.to_string()));
            }
        }
    }

    async fn simulate_latency(&self, prompt: &str) {
        let tracked = self
            .category_delays
            .iter()
            .find(|(category, _)| prompt.contains(&format!("\"{}\"", category)));
        let delay = tracked.map(|(_, delay)| *delay).unwrap_or(self.delay);
        let category = tracked.map(|(category, _)| category.as_str());

        if let Some(probe) = &self.probe {
            probe.enter();
        }
        self.mark(Span::Start, category);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.mark(Span::End, category);
        if let Some(probe) = &self.probe {
            probe.leave();
        }
    }
}

#[async_trait]
impl ContentModel for ScriptedModel {
    fn label(&self) -> String {
        self.label.clone()
    }

    async fn generate_text(&self, model: &str, prompt: &str, grounding: Grounding) -> Result<String> {
        self.record(model, grounding);
        self.simulate_latency(prompt).await;

        let by_category = self
            .category_replies
            .iter()
            .find(|(category, _)| prompt.contains(&format!("\"{}\"", category)))
            .map(|(_, scripted)| scripted);

        match by_category.or_else(|| self.replies.get(model)) {
            Some(Scripted::Reply(text)) => Ok(text.clone()),
            Some(Scripted::Fail(message)) => Err(GeneratorError::provider(message.clone())),
            None => Err(GeneratorError::provider(format!("{}: no script for {}", self.label, model))),
        }
    }

    async fn generate_speech(&self, model: &str, text: &str, _voice: &str) -> Result<Vec<Candidate>> {
        self.record(model, Grounding::None);
        self.simulate_latency(text).await;

        match &self.speech {
            Some(Scripted::Reply(data)) => Ok(vec![Candidate {
                content: Some(CandidateContent {
                    parts: vec![ResponsePart {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: self.speech_mime.clone(),
                            data: data.clone(),
                        }),
                    }],
                }),
                finish_reason: Some("STOP".to_string()),
            }]),
            Some(Scripted::Fail(message)) => Err(GeneratorError::provider(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}

/// External TTS stand-in that writes a file of a fixed size, or nothing.
pub struct FileWritingTts {
    bytes: Option<usize>,
    inputs: Mutex<Vec<String>>,
}

impl FileWritingTts {
    pub fn writing(bytes: usize) -> Self {
        Self {
            bytes: Some(bytes),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            bytes: None,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechFallback for FileWritingTts {
    fn name(&self) -> String {
        "file-writing-tts".to_string()
    }

    async fn synthesize_to(&self, text: &str, destination: &Path) -> Result<()> {
        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.push(text.to_string());
        }
        match self.bytes {
            Some(size) => {
                tokio::fs::write(destination, vec![0xFFu8; size]).await?;
                Ok(())
            }
            None => Err(GeneratorError::Audio("tts engine unavailable".to_string())),
        }
    }
}

/// In-memory [`PostStore`].
#[derive(Default)]
pub struct MemoryPostStore {
    posts: Mutex<Vec<BlogPost>>,
    subscribers: Vec<Subscriber>,
    reject_inserts: bool,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscribers(mut self, chat_ids: &[&str]) -> Self {
        self.subscribers = chat_ids
            .iter()
            .map(|chat_id| Subscriber {
                id: Uuid::new_v4(),
                chat_id: chat_id.to_string(),
                name: None,
            })
            .collect();
        self
    }

    /// Every insert fails, as if the database were down.
    pub fn rejecting_inserts(mut self) -> Self {
        self.reject_inserts = true;
        self
    }

    pub fn posts(&self) -> Vec<BlogPost> {
        self.posts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn lock_posts(&self) -> Result<std::sync::MutexGuard<'_, Vec<BlogPost>>> {
        self.posts
            .lock()
            .map_err(|_| GeneratorError::General("post store lock poisoned".to_string()))
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn insert_post(&self, post: &BlogPost) -> Result<Uuid> {
        if self.reject_inserts {
            return Err(GeneratorError::General("insert rejected".to_string()));
        }
        let mut posts = self.lock_posts()?;
        if posts.iter().any(|p| p.slug == post.slug) {
            return Err(GeneratorError::General(format!("duplicate slug {}", post.slug)));
        }
        posts.push(post.clone());
        Ok(post.id)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        Ok(self.lock_posts()?.iter().any(|p| p.slug == slug))
    }

    async fn count_posts(&self) -> Result<i64> {
        Ok(self.lock_posts()?.len() as i64)
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
        Ok(self.subscribers.clone())
    }
}

/// Image source that always answers the same way.
pub struct StaticImages {
    image: Option<PostImage>,
    fail: bool,
}

impl StaticImages {
    pub fn returning(url: &str) -> Self {
        Self {
            image: Some(PostImage {
                url: url.to_string(),
                credit: Some("Test Photographer".to_string()),
            }),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self { image: None, fail: true }
    }
}

#[async_trait]
impl ImageSource for StaticImages {
    async fn find_image(&self, _query: &str) -> Result<Option<PostImage>> {
        if self.fail {
            return Err(GeneratorError::General("image provider down".to_string()));
        }
        Ok(self.image.clone())
    }
}

/// Announcer that remembers what it was asked to send.
#[derive(Default)]
pub struct RecordingAnnouncer {
    sent: Mutex<Vec<(String, usize)>>,
    fail: bool,
}

impl RecordingAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// `(slug, subscriber count)` per announcement.
    pub fn sent(&self) -> Vec<(String, usize)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Announcer for RecordingAnnouncer {
    fn channel_name(&self) -> String {
        "recording".to_string()
    }

    async fn announce(&self, post: &BlogPost, subscribers: &[Subscriber]) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((post.slug.clone(), subscribers.len()));
        }
        if self.fail {
            return Err(GeneratorError::General("channel unreachable".to_string()));
        }
        Ok(())
    }
}
