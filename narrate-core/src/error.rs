//! Error types for the narrate-core library

use thiserror::Error;

/// Main error type for narrate operations
#[derive(Error, Debug)]
pub enum NarrateError {
    #[error("Media read error: {0}")]
    MediaRead(String),

    #[error("Media write error: {0}")]
    MediaWrite(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("File write error: {0}")]
    FileWrite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for narrate operations
pub type Result<T> = std::result::Result<T, NarrateError>;

impl From<ffmpeg_next::Error> for NarrateError {
    fn from(err: ffmpeg_next::Error) -> Self {
        NarrateError::MediaRead(err.to_string())
    }
}

impl From<hound::Error> for NarrateError {
    fn from(err: hound::Error) -> Self {
        NarrateError::MediaWrite(err.to_string())
    }
}

impl PartialEq for NarrateError {
    fn eq(&self, other: &Self) -> bool {
        match self {
            NarrateError::MediaRead(msg) => {
                matches!(other, NarrateError::MediaRead(o) if msg == o)
            }
            NarrateError::MediaWrite(msg) => {
                matches!(other, NarrateError::MediaWrite(o) if msg == o)
            }
            NarrateError::ModelLoad(msg) => {
                matches!(other, NarrateError::ModelLoad(o) if msg == o)
            }
            NarrateError::Transcription(msg) => {
                matches!(other, NarrateError::Transcription(o) if msg == o)
            }
            NarrateError::FileWrite(msg) => {
                matches!(other, NarrateError::FileWrite(o) if msg == o)
            }
            NarrateError::Io(err) => {
                matches!(other, NarrateError::Io(e) if err.to_string() == e.to_string())
            }
        }
    }
}
