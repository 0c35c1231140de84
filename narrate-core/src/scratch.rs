//! Scratch file handling for the intermediate waveform

use crate::error::{NarrateError, Result};
use std::path::Path;
use tempfile::TempPath;
use tracing::debug;

/// RAII guard around the intermediate waveform file.
///
/// Each invocation gets its own unique path in the system temp directory, so
/// concurrent pipelines never collide. The file is removed when the guard is
/// dropped, whichever way the pipeline exits.
pub struct ScratchWav {
    path: TempPath,
}

impl ScratchWav {
    /// Create a fresh scratch file with a unique `.wav` path
    pub fn new() -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("narrate-audio-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| {
                NarrateError::MediaWrite(format!("Failed to create scratch file: {}", e))
            })?;

        let path = file.into_temp_path();
        debug!("Created scratch waveform at {}", path.display());

        Ok(Self { path })
    }

    /// Path the extractor should write to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for ScratchWav {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchWav")
            .field("path", &self.path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_scratch_removed_on_drop() {
        let path: PathBuf;
        {
            let scratch = ScratchWav::new().unwrap();
            path = scratch.path().to_path_buf();
            assert!(path.exists());
            std::fs::write(&path, b"RIFF").unwrap();
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_paths_are_unique() {
        let a = ScratchWav::new().unwrap();
        let b = ScratchWav::new().unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(a.path().extension().unwrap(), "wav");
    }
}
