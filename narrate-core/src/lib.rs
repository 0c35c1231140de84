//! Narrate Core Library
//!
//! Extracts the audio track of a video file, transcribes it with whisper.cpp,
//! and writes the transcript to disk. FFmpeg handles demuxing and decoding.

pub mod audio;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod scratch;
pub mod transcription;

pub use audio::{AudioData, AudioProcessor};
pub use config::TranscriptionConfig;
pub use error::{NarrateError, Result};
pub use extract::extract_audio;
pub use model::{ModelManager, WhisperModel};
pub use pipeline::{save_transcription, Pipeline, PipelineReport};
pub use scratch::ScratchWav;
pub use transcription::{
    ModelCache, TranscriptionResult, TranscriptionSegment, WhisperTranscriber,
};

use std::path::Path;

/// High-level transcription of an audio file
pub async fn transcribe_audio<P: AsRef<Path>>(
    audio_path: P,
    config: Option<TranscriptionConfig>,
) -> Result<TranscriptionResult> {
    let config = config.unwrap_or_default();

    let audio_data = AudioProcessor::new().load_audio(audio_path).await?;

    let transcriber = WhisperTranscriber::new(config).await?;

    transcriber.transcribe(audio_data).await
}

/// High-level entry point: extract, transcribe, and persist in one call.
///
/// `None` config uses the defaults (base model, auto-detected language).
pub async fn process_video<P, Q>(
    video_path: P,
    output_path: Q,
    config: Option<TranscriptionConfig>,
) -> Result<PipelineReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let config = config.unwrap_or_default();

    Pipeline::new(config).process(video_path, output_path).await
}
