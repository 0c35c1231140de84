//! Configuration options for transcription

use crate::model::WhisperModel;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for transcription operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Model tier to use when no explicit path is given
    pub model: WhisperModel,

    /// Explicit path to a Whisper model file, overrides `model`
    pub model_path: Option<PathBuf>,

    /// Language code (e.g., "en", "es", "fr")
    pub language: Option<String>,

    /// Use GPU acceleration if available
    pub use_gpu: bool,

    /// Number of threads to use
    pub num_threads: Option<usize>,

    /// Temperature for sampling (0.0 = deterministic)
    pub temperature: f32,

    /// Enable verbose debug output
    pub verbose: bool,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: WhisperModel::Base,
            model_path: None, // Resolved from the model tier
            language: None,   // Auto-detect
            use_gpu: true,
            num_threads: None, // Use system default
            temperature: 0.0,
            verbose: false,
        }
    }
}

impl TranscriptionConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model tier
    pub fn with_model(mut self, model: WhisperModel) -> Self {
        self.model = model;
        self
    }

    /// Set an explicit model file path
    pub fn with_model_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Set the language
    pub fn with_language<S: Into<String>>(mut self, language: S) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Enable or disable GPU acceleration
    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = use_gpu;
        self
    }

    /// Set the number of threads
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Enable or disable verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = TranscriptionConfig::default();

        assert_eq!(config.model, WhisperModel::Base);
        assert!(config.model_path.is_none());
        assert!(config.language.is_none());
        assert!(config.use_gpu);
        assert_eq!(config.temperature, 0.0);
        assert!(!config.verbose);
    }

    #[test]
    fn test_config_builders() {
        let config = TranscriptionConfig::new()
            .with_model(WhisperModel::Small)
            .with_language("en")
            .with_gpu(false)
            .with_threads(2);

        assert_eq!(config.model, WhisperModel::Small);
        assert_eq!(config.language, Some("en".to_string()));
        assert!(!config.use_gpu);
        assert_eq!(config.num_threads, Some(2));
    }
}
