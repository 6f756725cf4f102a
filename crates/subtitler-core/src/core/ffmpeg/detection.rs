//! FFmpeg Detection Module
//!
//! Resolves the FFmpeg/FFprobe binaries from explicit overrides, common
//! install locations, then the `PATH` environment variable.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{FFmpegError, FFmpegResult};
use crate::core::process::configure_tokio_command;

#[cfg(target_os = "windows")]
const FFMPEG_BINARY: &str = "ffmpeg.exe";
#[cfg(not(target_os = "windows"))]
const FFMPEG_BINARY: &str = "ffmpeg";

#[cfg(target_os = "windows")]
const FFPROBE_BINARY: &str = "ffprobe.exe";
#[cfg(not(target_os = "windows"))]
const FFPROBE_BINARY: &str = "ffprobe";

/// Resolved FFmpeg installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FFmpegInfo {
    /// Path to ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// Path to ffprobe binary
    pub ffprobe_path: PathBuf,
}

/// Resolves both binaries.
///
/// An override must point at an existing file; it is never silently replaced
/// by a binary found elsewhere.
pub fn detect_ffmpeg(
    ffmpeg_override: Option<&Path>,
    ffprobe_override: Option<&Path>,
) -> FFmpegResult<FFmpegInfo> {
    let ffmpeg_path = resolve_binary(ffmpeg_override, FFMPEG_BINARY)?;
    let ffprobe_path = resolve_binary(ffprobe_override, FFPROBE_BINARY)?;

    info!(
        "Using ffmpeg at {} (ffprobe at {})",
        ffmpeg_path.display(),
        ffprobe_path.display()
    );
    Ok(FFmpegInfo {
        ffmpeg_path,
        ffprobe_path,
    })
}

fn resolve_binary(override_path: Option<&Path>, binary_name: &str) -> FFmpegResult<PathBuf> {
    if let Some(path) = override_path {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(FFmpegError::NotFound)
        };
    }

    let path_dirs = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).collect::<Vec<_>>())
        .unwrap_or_default();

    find_in_dirs(binary_name, common_ffmpeg_paths().into_iter().chain(path_dirs))
        .ok_or(FFmpegError::NotFound)
}

/// Returns the first directory entry named `binary_name` that is a file.
fn find_in_dirs(binary_name: &str, dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter()
        .map(|dir| dir.join(binary_name))
        .inspect(|candidate| debug!("Probing {}", candidate.display()))
        .find(|candidate| candidate.is_file())
}

/// Common FFmpeg installation paths for the current platform
fn common_ffmpeg_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "windows")]
    {
        paths.push(PathBuf::from(r"C:\ffmpeg\bin"));
        paths.push(PathBuf::from(r"C:\Program Files\ffmpeg\bin"));

        if let Ok(programdata) = std::env::var("ProgramData") {
            paths.push(PathBuf::from(programdata).join("chocolatey").join("bin"));
        }
        if let Ok(userprofile) = std::env::var("USERPROFILE") {
            paths.push(PathBuf::from(userprofile).join("scoop").join("shims"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        paths.push(PathBuf::from("/opt/homebrew/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/opt/local/bin")); // MacPorts
    }

    #[cfg(target_os = "linux")]
    {
        paths.push(PathBuf::from("/usr/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/snap/bin"));
    }

    paths
}

/// Reads the version from the first line of `ffmpeg -version`.
pub async fn ffmpeg_version(ffmpeg_path: &Path) -> FFmpegResult<String> {
    let mut cmd = tokio::process::Command::new(ffmpeg_path);
    cmd.arg("-version");
    configure_tokio_command(&mut cmd);

    let output = cmd.output().await?;
    if !output.status.success() {
        return Err(FFmpegError::ProbeError(
            "Failed to get FFmpeg version".to_string(),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_version_line(&stdout)
        .ok_or_else(|| FFmpegError::ParseError("Could not parse FFmpeg version".to_string()))
}

fn parse_version_line(output: &str) -> Option<String> {
    let first_line = output.lines().next()?;
    match first_line.strip_prefix("ffmpeg version ") {
        Some(rest) => rest.split_whitespace().next().map(str::to_string),
        None => Some(first_line.to_string()),
    }
}
