//! Model downloading and management functionality

use crate::error::{NarrateError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Available Whisper model tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhisperModel {
    /// Tiny model (39 MB, fastest)
    Tiny,
    /// Base model (142 MB, good balance)
    #[default]
    Base,
    /// Small model (466 MB)
    Small,
    /// Medium model (1.5 GB)
    Medium,
    /// Large model (3.0 GB, most accurate)
    Large,
}

impl WhisperModel {
    /// Get the model identifier string used in filenames and URLs
    pub const fn as_str(&self) -> &'static str {
        match self {
            WhisperModel::Tiny => "tiny",
            WhisperModel::Base => "base",
            WhisperModel::Small => "small",
            WhisperModel::Medium => "medium",
            WhisperModel::Large => "large-v3",
        }
    }

    /// Get the model description
    pub const fn description(&self) -> &'static str {
        match self {
            WhisperModel::Tiny => "Tiny model (39 MB, fastest, lowest accuracy)",
            WhisperModel::Base => "Base model (142 MB, good balance of speed and accuracy)",
            WhisperModel::Small => "Small model (466 MB, good accuracy)",
            WhisperModel::Medium => "Medium model (1.5 GB, high accuracy)",
            WhisperModel::Large => "Large v3 model (3.0 GB, most accurate)",
        }
    }

    /// Get all available models
    pub const fn all_models() -> &'static [WhisperModel] {
        &[
            WhisperModel::Tiny,
            WhisperModel::Base,
            WhisperModel::Small,
            WhisperModel::Medium,
            WhisperModel::Large,
        ]
    }

    /// Approximate download size in bytes
    pub const fn size(&self) -> u64 {
        match self {
            WhisperModel::Tiny => 39 * 1024 * 1024,
            WhisperModel::Base => 142 * 1024 * 1024,
            WhisperModel::Small => 466 * 1024 * 1024,
            WhisperModel::Medium => 1_500 * 1024 * 1024,
            WhisperModel::Large => 3_000 * 1024 * 1024,
        }
    }

    /// Get the download URL for this model
    fn get_url(&self) -> String {
        format!(
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-{}.bin",
            self.as_str()
        )
    }

    /// Get the filename for this model
    pub fn filename(&self) -> String {
        format!("ggml-{}.bin", self.as_str())
    }
}

impl FromStr for WhisperModel {
    type Err = NarrateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tiny" => Ok(WhisperModel::Tiny),
            "base" => Ok(WhisperModel::Base),
            "small" => Ok(WhisperModel::Small),
            "medium" => Ok(WhisperModel::Medium),
            "large" | "large-v3" => Ok(WhisperModel::Large),
            _ => Err(NarrateError::ModelLoad(format!(
                "Unknown Whisper model: {}",
                s
            ))),
        }
    }
}

/// Model manager for downloading and managing Whisper models
pub struct ModelManager {
    models_dir: PathBuf,
}

impl ModelManager {
    /// Create a new model manager
    pub fn new() -> Result<Self> {
        let project_dirs = ProjectDirs::from("dev", "", "narrate").ok_or_else(|| {
            NarrateError::ModelLoad("Failed to get XDG directories".to_string())
        })?;

        let models_dir = project_dirs.data_dir().join("models");

        Ok(Self { models_dir })
    }

    /// Create a model manager with an explicit models directory
    pub fn with_models_dir<P: Into<PathBuf>>(models_dir: P) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    /// Get the models directory path
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Ensure the models directory exists
    pub async fn ensure_models_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.models_dir).await.map_err(|e| {
            NarrateError::ModelLoad(format!("Failed to create models directory: {}", e))
        })?;
        Ok(())
    }

    /// Check if a model is already downloaded
    pub async fn is_model_downloaded(&self, model: WhisperModel) -> bool {
        self.get_model_path(model).exists()
    }

    /// Get the full path to a model file
    pub fn get_model_path(&self, model: WhisperModel) -> PathBuf {
        self.models_dir.join(model.filename())
    }

    /// Download a model
    pub async fn download_model(&self, model: WhisperModel) -> Result<PathBuf> {
        self.download_model_with_progress(model, |_, _| {}).await
    }

    /// Download a model with progress callback
    pub async fn download_model_with_progress<F>(
        &self,
        model: WhisperModel,
        mut progress_callback: F,
    ) -> Result<PathBuf>
    where
        F: FnMut(u64, Option<u64>), // (downloaded_bytes, total_bytes)
    {
        self.ensure_models_dir().await?;

        let model_path = self.get_model_path(model);

        debug!("Downloading model {} to {:?}", model.as_str(), model_path);

        let url = model.get_url();
        let response = reqwest::get(&url)
            .await
            .map_err(|e| NarrateError::ModelLoad(format!("Failed to download model: {}", e)))?;

        if !response.status().is_success() {
            return Err(NarrateError::ModelLoad(format!(
                "Failed to download model {}: HTTP {}",
                model.as_str(),
                response.status()
            )));
        }

        let total_size = response.content_length();

        // Download to a temporary file first, then rename
        let temp_path = model_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            NarrateError::ModelLoad(format!("Failed to create temporary file: {}", e))
        })?;

        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        use futures_util::StreamExt;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                NarrateError::ModelLoad(format!("Failed to read download chunk: {}", e))
            })?;

            file.write_all(&chunk).await.map_err(|e| {
                NarrateError::ModelLoad(format!("Failed to write to file: {}", e))
            })?;

            downloaded += chunk.len() as u64;
            progress_callback(downloaded, total_size);
        }

        file.flush()
            .await
            .map_err(|e| NarrateError::ModelLoad(format!("Failed to flush file: {}", e)))?;

        drop(file);

        fs::rename(&temp_path, &model_path).await.map_err(|e| {
            NarrateError::ModelLoad(format!("Failed to rename downloaded file: {}", e))
        })?;

        debug!(
            "Successfully downloaded model {} to {:?}",
            model.as_str(),
            model_path
        );
        Ok(model_path)
    }

    /// List all downloaded models
    pub async fn list_downloaded_models(&self) -> Result<Vec<WhisperModel>> {
        if !self.models_dir.exists() {
            return Ok(Vec::new());
        }

        let mut downloaded = Vec::new();

        for &model in WhisperModel::all_models() {
            if self.is_model_downloaded(model).await {
                downloaded.push(model);
            }
        }

        Ok(downloaded)
    }

    /// Delete a downloaded model
    pub async fn delete_model(&self, model: WhisperModel) -> Result<()> {
        let model_path = self.get_model_path(model);

        if model_path.exists() {
            fs::remove_file(&model_path).await.map_err(|e| {
                NarrateError::ModelLoad(format!("Failed to delete model file: {}", e))
            })?;
            info!("Deleted model {} from {:?}", model.as_str(), model_path);
        }

        Ok(())
    }

    /// Resolve a model tier to a local file path, downloading it on first use
    pub async fn resolve_model(&self, model: WhisperModel) -> Result<PathBuf> {
        let model_path = self.get_model_path(model);
        if model_path.exists() {
            return Ok(model_path);
        }

        info!(
            "Model {} not found locally, downloading ({})",
            model.as_str(),
            model.description()
        );
        self.download_model(model).await
    }
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new().expect("Failed to create ModelManager")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_parsing() {
        assert_eq!(WhisperModel::from_str("base"), Ok(WhisperModel::Base));
        assert_eq!(WhisperModel::from_str("large"), Ok(WhisperModel::Large));
        assert_eq!(WhisperModel::from_str("large-v3"), Ok(WhisperModel::Large));
        let invalid = WhisperModel::from_str("turbo-xl");
        assert!(
            matches!(invalid, Err(NarrateError::ModelLoad(_))),
            "Expected a ModelLoad error but got: {:?}",
            invalid
        );
    }

    #[test]
    fn test_model_filename() {
        assert_eq!(WhisperModel::Base.filename(), "ggml-base.bin");
        assert_eq!(WhisperModel::Large.filename(), "ggml-large-v3.bin");
    }

    #[test]
    fn test_model_description() {
        assert!(WhisperModel::Base.description().contains("142 MB"));
        assert!(WhisperModel::Tiny.description().contains("fastest"));
    }

    #[test]
    fn test_default_model_is_base() {
        assert_eq!(WhisperModel::default(), WhisperModel::Base);
    }

    #[tokio::test]
    async fn test_model_paths() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::with_models_dir(dir.path());

        assert_eq!(
            manager.get_model_path(WhisperModel::Tiny),
            dir.path().join("ggml-tiny.bin")
        );
        assert!(!manager.is_model_downloaded(WhisperModel::Tiny).await);
        assert!(manager.list_downloaded_models().await.unwrap().is_empty());
    }
}
