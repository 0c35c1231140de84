//! Whisper transcription functionality

use crate::{
    audio::AudioData,
    config::TranscriptionConfig,
    error::{NarrateError, Result},
    model::ModelManager,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::task;
use tracing::{debug, info, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Transcription result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// The transcribed text (concatenation of all segments)
    pub text: String,

    /// Language used for decoding, if one was configured
    pub language: Option<String>,

    /// Segments with timestamps
    pub segments: Vec<TranscriptionSegment>,

    /// Processing time in seconds
    pub processing_time: f64,

    /// Audio duration in seconds
    pub audio_duration: f32,
}

/// A transcription segment with timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionSegment {
    /// Segment text
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,
}

/// Explicit cache of loaded Whisper contexts, keyed by model file path.
///
/// Model weights are loaded once per path and shared between transcribers;
/// `evict` and `clear` give callers control over the lifecycle instead of the
/// weights living in hidden process-global state.
#[derive(Clone, Default)]
pub struct ModelCache {
    entries: Arc<Mutex<HashMap<PathBuf, Arc<WhisperContext>>>>,
}

impl ModelCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a loaded context for `model_path`, loading it on first use
    pub async fn get_or_load(&self, model_path: &Path, use_gpu: bool) -> Result<Arc<WhisperContext>> {
        if let Some(context) = self.lookup(model_path) {
            debug!("Reusing cached model {}", model_path.display());
            return Ok(context);
        }

        let context = load_context(model_path, use_gpu).await?;

        let mut entries = self.entries.lock().expect("model cache lock poisoned");
        // A concurrent load may have won the race; keep the first entry
        let entry = entries
            .entry(model_path.to_path_buf())
            .or_insert(context)
            .clone();
        Ok(entry)
    }

    fn lookup(&self, model_path: &Path) -> Option<Arc<WhisperContext>> {
        self.entries
            .lock()
            .expect("model cache lock poisoned")
            .get(model_path)
            .cloned()
    }

    /// Drop the cached context for one model path
    pub fn evict(&self, model_path: &Path) {
        self.entries
            .lock()
            .expect("model cache lock poisoned")
            .remove(model_path);
    }

    /// Drop every cached context
    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("model cache lock poisoned")
            .clear();
    }

    /// Number of loaded models
    pub fn len(&self) -> usize {
        self.entries.lock().expect("model cache lock poisoned").len()
    }

    /// Whether the cache holds no models
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Load a Whisper context from a model file in a blocking task
async fn load_context(model_path: &Path, use_gpu: bool) -> Result<Arc<WhisperContext>> {
    // Route whisper.cpp output through tracing
    whisper_rs::install_logging_hooks();

    if !model_path.exists() {
        return Err(NarrateError::ModelLoad(format!(
            "Model file not found: {}",
            model_path.display()
        )));
    }

    info!("Loading Whisper model: {}", model_path.display());

    let mut params = WhisperContextParameters::default();
    params.use_gpu(use_gpu);

    let model_path_str = model_path.to_string_lossy().to_string();
    let context =
        task::spawn_blocking(move || WhisperContext::new_with_params(&model_path_str, params))
            .await
            .map_err(|e| NarrateError::ModelLoad(format!("Task join error: {}", e)))?
            .map_err(|e| NarrateError::ModelLoad(e.to_string()))?;

    Ok(Arc::new(context))
}

/// Whisper transcriber
pub struct WhisperTranscriber {
    context: Arc<WhisperContext>,
    config: TranscriptionConfig,
}

impl WhisperTranscriber {
    /// Create a new transcriber with the given configuration and a private cache
    pub async fn new(config: TranscriptionConfig) -> Result<Self> {
        Self::with_cache(config, &ModelCache::new()).await
    }

    /// Create a new transcriber that loads its model through `cache`.
    ///
    /// When the configuration names a model tier rather than an explicit file
    /// path, a missing model is downloaded first.
    pub async fn with_cache(config: TranscriptionConfig, cache: &ModelCache) -> Result<Self> {
        let model_path = match &config.model_path {
            Some(path) => path.clone(),
            None => {
                let manager = ModelManager::new()?;
                manager.resolve_model(config.model).await?
            }
        };

        let context = cache.get_or_load(&model_path, config.use_gpu).await?;

        Ok(Self { context, config })
    }

    /// Transcribe audio data
    pub async fn transcribe(&self, audio_data: AudioData) -> Result<TranscriptionResult> {
        let context = Arc::clone(&self.context);
        let config = self.config.clone();

        // Inference is CPU/GPU bound, keep it off the async runtime
        task::spawn_blocking(move || Self::transcribe_sync(&context, audio_data, config))
            .await
            .map_err(|e| NarrateError::Transcription(format!("Task join error: {}", e)))?
    }

    /// Synchronous transcription implementation
    fn transcribe_sync(
        context: &WhisperContext,
        audio_data: AudioData,
        config: TranscriptionConfig,
    ) -> Result<TranscriptionResult> {
        let start_time = std::time::Instant::now();

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        if let Some(lang) = &config.language {
            params.set_language(Some(lang));
        }

        if let Some(threads) = config.num_threads {
            params.set_n_threads(threads as i32);
        }

        params.set_temperature(config.temperature);

        // Keep whisper.cpp from printing to the terminal on its own
        params.set_print_timestamps(false);
        params.set_print_progress(false);
        params.set_print_special(false);
        params.set_print_realtime(false);

        let mut state = context
            .create_state()
            .map_err(|e| NarrateError::Transcription(format!("Failed to create state: {}", e)))?;

        state
            .full(params, &audio_data.samples)
            .map_err(|e| NarrateError::Transcription(format!("Transcription failed: {}", e)))?;

        let processing_time = start_time.elapsed().as_secs_f64();

        let num_segments = state.full_n_segments().map_err(|e| {
            NarrateError::Transcription(format!("Failed to get segment count: {}", e))
        })?;

        let mut segments = Vec::new();
        let mut full_text = String::new();

        for i in 0..num_segments {
            let text = match state.full_get_segment_text(i) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to get text for segment {}: {}. Skipping.", i, e);
                    continue;
                }
            };

            let start = state.full_get_segment_t0(i).map_err(|e| {
                NarrateError::Transcription(format!("Failed to get segment start time: {}", e))
            })? as f64
                / 100.0;

            let end = state.full_get_segment_t1(i).map_err(|e| {
                NarrateError::Transcription(format!("Failed to get segment end time: {}", e))
            })? as f64
                / 100.0;

            full_text.push_str(&text);

            segments.push(TranscriptionSegment { text, start, end });
        }

        Ok(TranscriptionResult {
            text: full_text,
            language: config.language,
            segments,
            processing_time,
            audio_duration: audio_data.duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_starts_empty() {
        let cache = ModelCache::new();
        assert!(cache.is_empty());
        cache.clear();
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_missing_model_path_is_load_error() {
        let cache = ModelCache::new();
        let result = cache
            .get_or_load(Path::new("no-such-model.bin"), false)
            .await;
        assert!(matches!(result, Err(NarrateError::ModelLoad(_))));
    }

    #[test]
    fn test_transcription_result_serialization() {
        let result = TranscriptionResult {
            text: "Hello world".to_string(),
            language: Some("en".to_string()),
            segments: vec![TranscriptionSegment {
                text: "Hello world".to_string(),
                start: 0.0,
                end: 2.5,
            }],
            processing_time: 1.5,
            audio_duration: 3.0,
        };

        let json = serde_json::to_string(&result).unwrap();
        let deserialized: TranscriptionResult = serde_json::from_str(&json).unwrap();

        assert_eq!(result.text, deserialized.text);
        assert_eq!(result.language, deserialized.language);
        assert_eq!(result.segments.len(), deserialized.segments.len());
    }
}
