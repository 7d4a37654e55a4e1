pub mod types;
pub mod utils;
pub mod credentials;
pub mod provider;
pub mod prompts;
pub mod parser;
pub mod generator;
pub mod strategy;
pub mod batch;
pub mod audio;
pub mod trending;
pub mod service;
pub mod traits;
pub mod store;
pub mod images;
pub mod notifier;
pub mod pipeline;
pub mod mock;

pub use types::*;
pub use credentials::{Credential, CredentialPool};
pub use provider::{ContentModel, GeminiClient, Grounding};
pub use parser::{extract_json_object, parse_generated_content};
pub use generator::TextGenerator;
pub use strategy::GenerationStrategy;
pub use batch::BatchGenerator;
pub use audio::{AudioSynthesizer, ExternalTtsCommand, SpeechFallback};
pub use trending::SearchGroundedGenerator;
pub use service::ContentService;
pub use traits::{Announcer, ImageSource, PostStore};
pub use store::PgPostStore;
pub use images::UnsplashImages;
pub use notifier::{AnnouncerConfig, TelegramAnnouncer};
pub use pipeline::PostPipeline;
pub use interfaces::defs::GeneratedContent;
