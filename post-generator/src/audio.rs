use crate::prompts::narration_prompt;
use crate::provider::{Candidate, ContentModel, InlineData};
use crate::types::{AudioArtifact, GeneratorError, Result};
use crate::utils::truncate_chars;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Longest text handed to the external TTS process.
pub const FALLBACK_MAX_CHARS: usize = 500;

/// Fallback output at or below this size is treated as a failed synthesis.
pub const MIN_AUDIO_BYTES: u64 = 100;

/// Second-tier speech synthesis that writes straight to a file.
#[async_trait]
pub trait SpeechFallback: Send + Sync {
    fn name(&self) -> String;

    async fn synthesize_to(&self, text: &str, destination: &Path) -> Result<()>;
}

/// Runs an external program as `<program> [args...] <text> <destination>`.
///
/// Arguments are passed as an array, never through a shell.
#[derive(Debug, Clone)]
pub struct ExternalTtsCommand {
    program: String,
    args: Vec<String>,
}

impl ExternalTtsCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build from a split command line: the first element is the program, the
    /// rest are leading arguments.
    pub fn from_command_line(parts: &[String]) -> Result<Self> {
        let (program, args) = parts
            .split_first()
            .ok_or_else(|| GeneratorError::Config("TTS fallback command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl SpeechFallback for ExternalTtsCommand {
    fn name(&self) -> String {
        self.program.clone()
    }

    async fn synthesize_to(&self, text: &str, destination: &Path) -> Result<()> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .arg(destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            // The produced file decides success, the exit code is only reported.
            warn!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// Generative audio first, external TTS second, `None` if both fail.
pub struct AudioSynthesizer {
    client: Arc<dyn ContentModel>,
    model: String,
    voice: String,
    audio_dir: PathBuf,
    fallback: Arc<dyn SpeechFallback>,
}

impl AudioSynthesizer {
    pub fn new(
        client: Arc<dyn ContentModel>,
        model: impl Into<String>,
        voice: impl Into<String>,
        audio_dir: impl Into<PathBuf>,
        fallback: Arc<dyn SpeechFallback>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            voice: voice.into(),
            audio_dir: audio_dir.into(),
            fallback,
        }
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Never fails. Missing audio is an expected outcome the caller can skip.
    pub async fn synthesize(&self, text: &str) -> Option<AudioArtifact> {
        match self.synthesize_primary(text).await {
            Ok(artifact) => {
                info!("Synthesized narration with {}: {}", self.model, artifact.path.display());
                return Some(artifact);
            }
            Err(e) => warn!("Primary audio synthesis failed, trying {}: {}", self.fallback.name(), e),
        }

        match self.synthesize_fallback(text).await {
            Ok(artifact) => {
                info!("Synthesized narration with {}: {}", self.fallback.name(), artifact.path.display());
                Some(artifact)
            }
            Err(e) => {
                warn!("Fallback audio synthesis failed, continuing without audio: {}", e);
                None
            }
        }
    }

    async fn synthesize_primary(&self, text: &str) -> Result<AudioArtifact> {
        let candidates = self
            .client
            .generate_speech(&self.model, &narration_prompt(text), &self.voice)
            .await?;

        let part = first_audio_part(&candidates)
            .ok_or_else(|| GeneratorError::Audio(format!("{} returned no audio part", self.model)))?;

        let bytes = STANDARD
            .decode(part.data.as_bytes())
            .map_err(|e| GeneratorError::Audio(format!("audio payload is not valid base64: {}", e)))?;
        if bytes.is_empty() {
            return Err(GeneratorError::Audio("audio payload is empty".to_string()));
        }

        let format = AudioFormat::from_mime(&part.mime_type);
        debug!("{} returned {} ({} bytes)", self.model, part.mime_type, bytes.len());

        let bytes = match format {
            AudioFormat::Pcm16 { sample_rate } => wav_from_pcm16(&bytes, sample_rate, 1),
            _ => bytes,
        };

        let path = self.new_audio_path("narration", format.extension()).await?;
        tokio::fs::write(&path, &bytes).await?;
        debug!("Wrote {} bytes of audio to {}", bytes.len(), path.display());

        Ok(AudioArtifact { path })
    }

    async fn synthesize_fallback(&self, text: &str) -> Result<AudioArtifact> {
        let path = self.new_audio_path("narration-tts", "mp3").await?;
        let input = truncate_chars(text, FALLBACK_MAX_CHARS);

        self.fallback.synthesize_to(input, &path).await?;

        let size = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata.len(),
            Err(_) => {
                return Err(GeneratorError::Audio(format!(
                    "{} did not create {}",
                    self.fallback.name(),
                    path.display()
                )))
            }
        };

        if size <= MIN_AUDIO_BYTES {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(GeneratorError::Audio(format!(
                "{} produced only {} bytes",
                self.fallback.name(),
                size
            )));
        }

        Ok(AudioArtifact { path })
    }

    async fn new_audio_path(&self, prefix: &str, extension: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.audio_dir).await?;
        Ok(self.audio_dir.join(format!("{}-{}.{}", prefix, Uuid::new_v4(), extension)))
    }
}

/// Container the primary tier's payload is stored in, decided by its MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Ogg,
    /// Raw signed 16-bit little-endian mono samples, wrapped in WAV on write.
    Pcm16 { sample_rate: u32 },
}

const DEFAULT_PCM_RATE: u32 = 24_000;

impl AudioFormat {
    /// Unknown `audio/*` subtypes are stored as MP3.
    pub fn from_mime(mime_type: &str) -> Self {
        let mut params = mime_type.split(';').map(|p| p.trim().to_ascii_lowercase());
        let essence = params.next().unwrap_or_default();

        match essence.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" => AudioFormat::Wav,
            "audio/ogg" | "audio/opus" => AudioFormat::Ogg,
            "audio/l16" | "audio/pcm" => {
                let sample_rate = params
                    .filter_map(|p| p.strip_prefix("rate=").and_then(|r| r.parse().ok()))
                    .next()
                    .unwrap_or(DEFAULT_PCM_RATE);
                AudioFormat::Pcm16 { sample_rate }
            }
            "audio/mpeg" | "audio/mp3" => AudioFormat::Mp3,
            other => {
                warn!("Unrecognized audio type {}, storing as mp3", other);
                AudioFormat::Mp3
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav | AudioFormat::Pcm16 { .. } => "wav",
            AudioFormat::Ogg => "ogg",
        }
    }
}

/// Prefix raw 16-bit PCM with a canonical 44-byte RIFF/WAVE header.
pub fn wav_from_pcm16(samples: &[u8], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let block_align = channels * bits_per_sample / 8;
    let byte_rate = sample_rate * block_align as u32;
    let data_len = samples.len() as u32;

    let mut wav = Vec::with_capacity(44 + samples.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(samples);
    wav
}

/// The first inline part carrying an `audio/*` MIME type.
pub fn first_audio_part(candidates: &[Candidate]) -> Option<&InlineData> {
    candidates
        .iter()
        .flat_map(|candidate| candidate.parts())
        .filter_map(|part| part.inline_data.as_ref())
        .find(|data| data.mime_type.starts_with("audio/"))
}

/// The base64 data of [`first_audio_part`].
pub fn first_audio_payload(candidates: &[Candidate]) -> Option<&str> {
    first_audio_part(candidates).map(|data| data.data.as_str())
}
