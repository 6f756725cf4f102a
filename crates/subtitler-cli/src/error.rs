//! Terminal outcomes that map to process exit codes

use std::process::ExitCode;

use thiserror::Error;

/// Encode outcomes reported through the exit status
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Encode failed: {0}")]
    EncodeFailed(String),

    #[error("Encode cancelled")]
    EncodeCancelled,
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::EncodeFailed(_) => ExitCode::from(1),
            Self::EncodeCancelled => ExitCode::from(130),
        }
    }
}
