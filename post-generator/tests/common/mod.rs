// Shared setup for the integration tests
#![allow(dead_code)]

use post_generator::mock::{FileWritingTts, ScriptedModel};
use post_generator::{ContentModel, ContentService, CredentialPool, GeneratorConfig, SpeechFallback};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const MODEL_A: &str = "model-a";
pub const MODEL_B: &str = "model-b";
pub const MODEL_C: &str = "model-c";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A fresh directory under the system temp dir; tests never share one.
pub fn temp_audio_dir() -> PathBuf {
    std::env::temp_dir().join(format!("post-generator-test-{}", Uuid::new_v4()))
}

pub fn test_config(models: &[&str]) -> GeneratorConfig {
    GeneratorConfig {
        models: models.iter().map(|m| m.to_string()).collect(),
        trending_model: "trend-model".to_string(),
        tts_model: "tts-model".to_string(),
        audio_dir: temp_audio_dir(),
        chunk_delay: Duration::ZERO,
        categories: vec!["rust".to_string(), "databases".to_string(), "networking".to_string()],
        ..Default::default()
    }
}

pub fn pool_of(clients: Vec<ScriptedModel>) -> Arc<CredentialPool> {
    let clients = clients
        .into_iter()
        .map(|c| Arc::new(c) as Arc<dyn ContentModel>)
        .collect();
    Arc::new(CredentialPool::from_clients(clients).expect("at least one client"))
}

pub fn service_with(
    clients: Vec<ScriptedModel>,
    config: &GeneratorConfig,
    fallback: FileWritingTts,
) -> ContentService {
    let fallback: Arc<dyn SpeechFallback> = Arc::new(fallback);
    ContentService::new(pool_of(clients), config, fallback).expect("service builds")
}
