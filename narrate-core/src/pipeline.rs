//! The video-to-transcript pipeline: extract, transcribe, persist

use crate::{
    audio::AudioProcessor,
    config::TranscriptionConfig,
    error::{NarrateError, Result},
    extract::extract_audio,
    scratch::ScratchWav,
    transcription::{ModelCache, TranscriptionResult, WhisperTranscriber},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Outcome of a successful pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// The transcribed text, as written to the output file
    pub text: String,

    /// Where the transcript was written
    pub output_path: PathBuf,

    /// Duration of the extracted audio in seconds
    pub audio_duration: f32,

    /// Inference time in seconds
    pub processing_time: f64,
}

/// Video transcription pipeline.
///
/// Runs extraction, transcription, and transcript persistence in order. The
/// intermediate waveform lives at a unique scratch path that is removed on
/// every exit path. Failures from any stage are returned to the caller rather
/// than swallowed; nothing is retried.
pub struct Pipeline {
    config: TranscriptionConfig,
    cache: ModelCache,
}

impl Pipeline {
    /// Create a pipeline with its own model cache
    pub fn new(config: TranscriptionConfig) -> Self {
        Self::with_cache(config, ModelCache::new())
    }

    /// Create a pipeline that shares `cache` with other pipelines
    pub fn with_cache(config: TranscriptionConfig, cache: ModelCache) -> Self {
        Self { config, cache }
    }

    /// The model cache this pipeline loads through
    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    /// Extract the audio of `video_path` and transcribe it, without persisting
    /// the transcript.
    pub async fn transcribe_video<P: AsRef<Path>>(
        &self,
        video_path: P,
    ) -> Result<TranscriptionResult> {
        let video_path = video_path.as_ref();

        // The guard removes the waveform when this function returns, however it returns
        let scratch = ScratchWav::new()?;

        extract_audio(video_path, scratch.path()).await?;

        info!("Transcribing audio of {}", video_path.display());
        let transcriber = WhisperTranscriber::with_cache(self.config.clone(), &self.cache).await?;
        let audio_data = AudioProcessor::new().load_audio(scratch.path()).await?;
        let result = transcriber.transcribe(audio_data).await?;
        info!(
            "Transcription complete ({:.2}s audio in {:.2}s)",
            result.audio_duration, result.processing_time
        );

        Ok(result)
    }

    /// Extract the audio of `video_path`, transcribe it, and write the
    /// transcript to `output_path`, overwriting any existing file.
    pub async fn process<P, Q>(&self, video_path: P, output_path: Q) -> Result<PipelineReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let output_path = output_path.as_ref();

        let result = self.transcribe_video(video_path).await?;

        save_transcription(&result.text, output_path).await?;

        Ok(PipelineReport {
            text: result.text,
            output_path: output_path.to_path_buf(),
            audio_duration: result.audio_duration,
            processing_time: result.processing_time,
        })
    }
}

/// Write a transcript as UTF-8 to `output_path`, overwriting any existing content
pub async fn save_transcription<P: AsRef<Path>>(transcription: &str, output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();

    tokio::fs::write(output_path, transcription)
        .await
        .map_err(|e| {
            NarrateError::FileWrite(format!("Failed to write {}: {}", output_path.display(), e))
        })?;

    info!("Transcription saved to {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_transcription_writes_exact_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.txt");

        save_transcription("hello world", &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello world");

        // A second write overwrites the first
        save_transcription("goodbye", &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "goodbye");
    }

    #[tokio::test]
    async fn test_save_transcription_bad_path() {
        let result = save_transcription("text", "/no/such/dir/transcript.txt").await;
        assert!(matches!(result, Err(NarrateError::FileWrite(_))));
    }
}
