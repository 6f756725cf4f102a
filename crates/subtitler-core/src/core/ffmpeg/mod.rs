//! FFmpeg Integration Module
//!
//! Locates the `ffmpeg` / `ffprobe` binaries and probes media duration.
//! The duration is the total used to turn encoder `time=` output into a
//! percentage.

mod detection;
mod probe;

pub use detection::*;
pub use probe::*;

/// FFmpeg-related error types
#[derive(Debug, thiserror::Error)]
pub enum FFmpegError {
    #[error("FFmpeg not found. Please install FFmpeg or set its path in the settings.")]
    NotFound,

    #[error("Invalid input file: {0}")]
    InvalidInput(String),

    #[error("FFprobe error: {0}")]
    ProbeError(String),

    #[error("Process error: {0}")]
    ProcessError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}

pub type FFmpegResult<T> = Result<T, FFmpegError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffmpeg_error_display() {
        let err = FFmpegError::NotFound;
        assert!(err.to_string().contains("FFmpeg not found"));

        let err = FFmpegError::ProbeError("exit code 1".to_string());
        assert!(err.to_string().contains("exit code 1"));
    }
}
