mod common;

use common::{init_tracing, temp_audio_dir};
use post_generator::audio::{first_audio_payload, wav_from_pcm16, AudioFormat, FALLBACK_MAX_CHARS};
use post_generator::mock::{FileWritingTts, ScriptedModel};
use post_generator::provider::{Candidate, CandidateContent, InlineData, ResponsePart};
use post_generator::{AudioSynthesizer, ContentModel, ExternalTtsCommand, GeneratorError, SpeechFallback};
use std::path::PathBuf;
use std::sync::Arc;

fn synthesizer(client: ScriptedModel, fallback: Arc<FileWritingTts>) -> (AudioSynthesizer, PathBuf) {
    let dir = temp_audio_dir();
    let client: Arc<dyn ContentModel> = Arc::new(client);
    let fallback: Arc<dyn SpeechFallback> = fallback;
    (AudioSynthesizer::new(client, "tts-model", "Kore", dir.clone(), fallback), dir)
}

fn cleanup(dir: &PathBuf) {
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_primary_audio_is_decoded_to_disk() {
    init_tracing();

    let audio = vec![7u8; 256];
    let tts = Arc::new(FileWritingTts::writing(500));
    let (synth, dir) = synthesizer(
        ScriptedModel::new("key-0").with_speech("audio/mpeg", &audio),
        tts.clone(),
    );

    let artifact = synth.synthesize("A short narration.").await.expect("primary succeeds");

    assert!(artifact.path.starts_with(&dir));
    assert_eq!(artifact.path.extension().and_then(|e| e.to_str()), Some("mp3"));
    assert_eq!(std::fs::read(&artifact.path).expect("file exists"), audio);
    assert!(tts.inputs().is_empty(), "fallback not consulted");
    cleanup(&dir);
}

#[tokio::test]
async fn test_falls_back_when_primary_fails() {
    init_tracing();

    let tts = Arc::new(FileWritingTts::writing(150));
    let (synth, dir) = synthesizer(
        ScriptedModel::new("key-0").with_speech_failure("speech model unavailable"),
        tts.clone(),
    );

    let artifact = synth.synthesize("Narrate this.").await.expect("fallback succeeds");

    let name = artifact.path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    assert!(name.starts_with("narration-tts-"));
    assert_eq!(std::fs::metadata(&artifact.path).expect("file exists").len(), 150);
    assert_eq!(tts.inputs(), vec!["Narrate this.".to_string()]);
    cleanup(&dir);
}

#[tokio::test]
async fn test_tiny_fallback_output_counts_as_failure() {
    init_tracing();

    let tts = Arc::new(FileWritingTts::writing(50));
    let (synth, dir) = synthesizer(ScriptedModel::new("key-0").with_speech_failure("down"), tts);

    assert!(synth.synthesize("Narrate this.").await.is_none());

    // the undersized file is cleaned up
    let leftovers = std::fs::read_dir(&dir).map(|entries| entries.count()).unwrap_or(0);
    assert_eq!(leftovers, 0);
    cleanup(&dir);
}

#[tokio::test]
async fn test_exactly_the_minimum_size_is_still_rejected() {
    init_tracing();

    let tts = Arc::new(FileWritingTts::writing(100));
    let (synth, dir) = synthesizer(ScriptedModel::new("key-0").with_speech_failure("down"), tts);

    assert!(synth.synthesize("Narrate this.").await.is_none());
    cleanup(&dir);
}

#[tokio::test]
async fn test_non_audio_payload_falls_back() {
    init_tracing();

    let tts = Arc::new(FileWritingTts::writing(300));
    let (synth, dir) = synthesizer(
        ScriptedModel::new("key-0").with_speech("text/plain", b"not really audio"),
        tts.clone(),
    );

    let artifact = synth.synthesize("Narrate this.").await.expect("fallback succeeds");
    assert!(artifact.path_string().contains("narration-tts-"));
    assert_eq!(tts.inputs().len(), 1);
    cleanup(&dir);
}

#[tokio::test]
async fn test_missing_audio_part_falls_back() {
    init_tracing();

    // no speech script: the model answers with no candidates at all
    let tts = Arc::new(FileWritingTts::writing(300));
    let (synth, dir) = synthesizer(ScriptedModel::new("key-0"), tts.clone());

    assert!(synth.synthesize("Narrate this.").await.is_some());
    assert_eq!(tts.inputs().len(), 1);
    cleanup(&dir);
}

#[tokio::test]
async fn test_fallback_input_is_truncated() {
    init_tracing();

    let long_text = "é".repeat(FALLBACK_MAX_CHARS * 3);
    let tts = Arc::new(FileWritingTts::writing(300));
    let (synth, dir) = synthesizer(ScriptedModel::new("key-0").with_speech_failure("down"), tts.clone());

    synth.synthesize(&long_text).await.expect("fallback succeeds");

    let inputs = tts.inputs();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].chars().count(), FALLBACK_MAX_CHARS);
    cleanup(&dir);
}

#[tokio::test]
async fn test_both_tiers_failing_yields_none() {
    init_tracing();

    let (synth, dir) = synthesizer(
        ScriptedModel::new("key-0").with_speech_failure("down"),
        Arc::new(FileWritingTts::failing()),
    );

    assert!(synth.synthesize("Narrate this.").await.is_none());
    cleanup(&dir);
}

#[test]
fn test_first_audio_payload_skips_text_parts() {
    let candidates = vec![Candidate {
        content: Some(CandidateContent {
            parts: vec![
                ResponsePart {
                    text: Some("preamble".to_string()),
                    inline_data: None,
                },
                ResponsePart {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: "image/png".to_string(),
                        data: "aW1hZ2U=".to_string(),
                    }),
                },
                ResponsePart {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: "audio/L16;codec=pcm;rate=24000".to_string(),
                        data: "YXVkaW8=".to_string(),
                    }),
                },
            ],
        }),
        finish_reason: None,
    }];

    assert_eq!(first_audio_payload(&candidates), Some("YXVkaW8="));
    assert_eq!(first_audio_payload(&[]), None);
}

#[test]
fn test_empty_fallback_command_is_a_config_error() {
    let err = ExternalTtsCommand::from_command_line(&[]).unwrap_err();
    assert!(matches!(err, GeneratorError::Config(_)));

    let command = ExternalTtsCommand::from_command_line(&["espeak-wrapper".to_string(), "--mp3".to_string()])
        .expect("program given");
    assert_eq!(command.name(), "espeak-wrapper");
}

#[tokio::test]
async fn test_raw_pcm_is_stored_as_wav() {
    init_tracing();

    let samples = vec![0x10u8; 480];
    let tts = Arc::new(FileWritingTts::writing(500));
    let (synth, dir) = synthesizer(
        ScriptedModel::new("key-0").with_speech("audio/L16;codec=pcm;rate=24000", &samples),
        tts.clone(),
    );

    let artifact = synth.synthesize("A short narration.").await.expect("primary succeeds");

    assert_eq!(artifact.path.extension().and_then(|e| e.to_str()), Some("wav"));
    let written = std::fs::read(&artifact.path).expect("file exists");
    assert_eq!(&written[0..4], b"RIFF");
    assert_eq!(&written[8..12], b"WAVE");
    assert_eq!(&written[44..], samples.as_slice());
    assert!(tts.inputs().is_empty());
    cleanup(&dir);
}

#[test]
fn test_format_follows_the_mime_type() {
    assert_eq!(AudioFormat::from_mime("audio/mpeg"), AudioFormat::Mp3);
    assert_eq!(AudioFormat::from_mime("audio/wav"), AudioFormat::Wav);
    assert_eq!(AudioFormat::from_mime("audio/ogg; codecs=opus"), AudioFormat::Ogg);
    assert_eq!(
        AudioFormat::from_mime("audio/L16;codec=pcm;rate=16000"),
        AudioFormat::Pcm16 { sample_rate: 16000 }
    );
    assert_eq!(AudioFormat::from_mime("audio/L16"), AudioFormat::Pcm16 { sample_rate: 24000 });
    assert_eq!(AudioFormat::from_mime("audio/x-unknown").extension(), "mp3");
    assert_eq!(AudioFormat::Pcm16 { sample_rate: 24000 }.extension(), "wav");
}

#[test]
fn test_wav_header_describes_the_samples() {
    let wav = wav_from_pcm16(&[0u8; 100], 24000, 1);

    assert_eq!(wav.len(), 144);
    assert_eq!(u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]), 136);
    assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 24000);
    assert_eq!(u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]), 48000);
    assert_eq!(&wav[36..40], b"data");
    assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 100);
}
