//! Integration tests for narrate-core

use narrate_core::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::str::FromStr;

/// Test transcription configuration
#[test]
fn test_transcription_config() {
    let config = TranscriptionConfig::new()
        .with_model(WhisperModel::Tiny)
        .with_language("en")
        .with_gpu(false)
        .with_threads(2);

    assert_eq!(config.model, WhisperModel::Tiny);
    assert_eq!(config.language, Some("en".to_string()));
    assert!(!config.use_gpu);
    assert_eq!(config.num_threads, Some(2));
}

/// Missing audio input surfaces as a media read error before any model loads
#[tokio::test]
async fn test_missing_audio_file() {
    let config = TranscriptionConfig::new().with_gpu(false);
    let result = transcribe_audio("nonexistent_file.wav", Some(config)).await;

    assert!(matches!(result, Err(NarrateError::MediaRead(_))));
}

/// Invalid video inputs fail the pipeline with an explicit error and
/// never create the output file
#[rstest]
#[case::missing("nonexistent_video.mp4")]
#[case::not_media("Cargo.toml")]
#[tokio::test]
async fn test_process_video_invalid_input(#[case] video_path: &str) {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("transcript.txt");

    let config = TranscriptionConfig::new().with_gpu(false);
    let result = process_video(video_path, &output_path, Some(config)).await;

    assert!(
        matches!(&result, Err(NarrateError::MediaRead(_))),
        "Expected MediaRead for {}, got: {:?}",
        video_path,
        result.map(|r| r.text)
    );
    assert!(
        !output_path.exists(),
        "Output file must not be created when extraction fails"
    );
}

/// Extraction of a file with no audio stream is a media read error
#[tokio::test]
async fn test_extract_rejects_non_media() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("clip.mp4");
    std::fs::write(&bogus, vec![0u8; 512]).unwrap();

    let wav_path = dir.path().join("audio.wav");
    let result = extract_audio(&bogus, &wav_path).await;

    assert!(matches!(result, Err(NarrateError::MediaRead(_))));
}

/// Saving writes exactly the given text and overwrites previous content
#[tokio::test]
async fn test_save_transcription_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    save_transcription("first pass", &path).await.unwrap();
    save_transcription("second pass", &path).await.unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "second pass");
}

/// An explicit model path that does not exist is a model load error,
/// never a download
#[tokio::test]
async fn test_missing_model_path() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("silence.wav");
    write_test_wav(&wav);

    let config = TranscriptionConfig::new()
        .with_gpu(false)
        .with_model_path(dir.path().join("no-such-model.bin"));
    let result = transcribe_audio(&wav, Some(config)).await;

    assert!(matches!(result, Err(NarrateError::ModelLoad(_))));
}

/// Unknown model names are rejected at parse time
#[rstest]
#[case("gigantic")]
#[case("base.en-q5_1")]
#[case("")]
fn test_unknown_model_identifier(#[case] name: &str) {
    let result = WhisperModel::from_str(name);
    assert!(matches!(result, Err(NarrateError::ModelLoad(_))));
}

/// Result types serialize for the CLI's JSON output
#[test]
fn test_result_serialization() {
    let result = TranscriptionResult {
        text: "hello world".to_string(),
        language: None,
        segments: vec![TranscriptionSegment {
            text: "hello world".to_string(),
            start: 0.0,
            end: 1.2,
        }],
        processing_time: 0.4,
        audio_duration: 1.2,
    };

    let json = serde_json::to_string(&result).unwrap();
    let back: TranscriptionResult = serde_json::from_str(&json).unwrap();

    assert_eq!(back.text, result.text);
    assert_eq!(back.segments.len(), 1);
}

/// Write a tiny valid 16 kHz mono WAV so model resolution is the first failure
fn write_test_wav(path: &std::path::Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..16_000 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}
