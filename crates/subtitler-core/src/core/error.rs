//! Subtitler Error Definitions
//!
//! Defines error types used throughout the project.

use std::path::PathBuf;

use thiserror::Error;

use super::ffmpeg::FFmpegError;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Subtitle Errors
    // =========================================================================
    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("Subtitle entry index out of range: {0}")]
    EntryOutOfRange(usize),

    #[error("Subtitle {index} has an incomplete time range")]
    ExportIncomplete { index: usize },

    #[error("Failed to import {}: {source}", path.display())]
    ImportIoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Encode Errors
    // =========================================================================
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to start encoder: {0}")]
    ProcessSpawnFailure(String),

    #[error("{}", describe_exit(*code))]
    ProcessExitNonzero { code: Option<i32> },

    #[error(transparent)]
    FFmpeg(#[from] FFmpegError),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("Encoder exited with code {}", code),
        None => "Encoder was terminated by a signal".to_string(),
    }
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Convert to a user-facing message for the presentation layer
    pub fn to_user_message(&self) -> String {
        self.to_string()
    }
}
