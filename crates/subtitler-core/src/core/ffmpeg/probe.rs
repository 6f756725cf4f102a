//! Media probing through `ffprobe`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{FFmpegError, FFmpegResult};
use crate::core::{process::configure_tokio_command, seconds_to_millis, TimeMillis};

/// Subset of FFprobe output needed for encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration_sec: f64,
    /// Container format name
    pub format: String,
    /// Whether the file has a video stream
    pub has_video: bool,
    /// Whether the file has an audio stream
    pub has_audio: bool,
}

impl MediaInfo {
    /// Duration in whole milliseconds, `None` when unknown.
    pub fn duration_ms(&self) -> Option<TimeMillis> {
        Some(seconds_to_millis(self.duration_sec)).filter(|ms| *ms > 0)
    }
}

/// Runs `ffprobe` on a media file.
pub async fn probe_media(ffprobe_path: &Path, input: &Path) -> FFmpegResult<MediaInfo> {
    if !input.is_file() {
        return Err(FFmpegError::InvalidInput(format!(
            "Input file does not exist: {}",
            input.display()
        )));
    }

    let mut cmd = tokio::process::Command::new(ffprobe_path);
    cmd.args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(input);
    configure_tokio_command(&mut cmd);

    let output = cmd.output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FFmpegError::ProbeError(format!("FFprobe failed: {}", stderr.trim())));
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

/// Probes the total duration in milliseconds.
pub async fn probe_duration_ms(ffprobe_path: &Path, input: &Path) -> FFmpegResult<TimeMillis> {
    probe_media(ffprobe_path, input)
        .await?
        .duration_ms()
        .ok_or_else(|| FFmpegError::ProbeError(format!("Unknown duration: {}", input.display())))
}

/// Parses FFprobe JSON output
pub(crate) fn parse_probe_output(json_str: &str) -> FFmpegResult<MediaInfo> {
    let json: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FFmpegError::ParseError(format!("Failed to parse FFprobe output: {}", e)))?;

    let format = json
        .get("format")
        .ok_or_else(|| FFmpegError::ParseError("Missing format info".to_string()))?;

    let duration_sec = format
        .get("duration")
        .and_then(|d| d.as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let format_name = format
        .get("format_name")
        .and_then(|f| f.as_str())
        .unwrap_or("unknown")
        .to_string();

    let streams = json
        .get("streams")
        .and_then(|s| s.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();
    let has_stream = |kind: &str| {
        streams
            .iter()
            .any(|s| s.get("codec_type").and_then(|c| c.as_str()) == Some(kind))
    };

    Ok(MediaInfo {
        duration_sec,
        format: format_name,
        has_video: has_stream("video"),
        has_audio: has_stream("audio"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "format": { "duration": "65.250000", "format_name": "mov,mp4,m4a" },
            "streams": [
                { "codec_type": "video", "width": 1920, "height": 1080 },
                { "codec_type": "audio", "sample_rate": "48000" }
            ]
        }"#;

        let info = parse_probe_output(json).unwrap();

        assert_eq!(info.duration_sec, 65.25);
        assert_eq!(info.duration_ms(), Some(65_250));
        assert_eq!(info.format, "mov,mp4,m4a");
        assert!(info.has_video);
        assert!(info.has_audio);
    }

    #[test]
    fn test_parse_probe_without_duration() {
        let info = parse_probe_output(r#"{ "format": {} }"#).unwrap();
        assert_eq!(info.duration_ms(), None);
        assert!(!info.has_video);
    }

    #[test]
    fn test_parse_probe_rejects_garbage() {
        assert!(matches!(
            parse_probe_output("not json"),
            Err(FFmpegError::ParseError(_))
        ));
        assert!(matches!(
            parse_probe_output("{}"),
            Err(FFmpegError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_probe_missing_input() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = probe_media(Path::new("ffprobe"), &dir.path().join("missing.mp4")).await;
        assert!(matches!(result, Err(FFmpegError::InvalidInput(_))));
    }
}
