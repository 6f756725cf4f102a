//! Encode request and encoder selection

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult, TimeMillis};

/// Default target bitrate in kbps
pub const DEFAULT_BITRATE_KBPS: u32 = 2000;

/// Prefix prepended to the source file name for the default output path
pub const DEFAULT_OUTPUT_PREFIX: &str = "output_";

// =============================================================================
// Encoder Selection
// =============================================================================

/// Hardware acceleration backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareAccel {
    /// Software encoding
    #[default]
    None,
    /// NVIDIA NVENC
    Nvenc,
    /// Intel Quick Sync Video
    Qsv,
    /// AMD AMF
    Amf,
    /// Apple VideoToolbox
    Videotoolbox,
}

impl HardwareAccel {
    pub const ALL: [HardwareAccel; 5] = [
        Self::None,
        Self::Nvenc,
        Self::Qsv,
        Self::Amf,
        Self::Videotoolbox,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Nvenc => "nvenc",
            Self::Qsv => "qsv",
            Self::Amf => "amf",
            Self::Videotoolbox => "videotoolbox",
        }
    }
}

impl FromStr for HardwareAccel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|accel| accel.as_str() == wanted)
            .ok_or_else(|| CoreError::InvalidParameter(format!("Unknown hardware acceleration: {s}")))
    }
}

/// Video codec family
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    /// H.264 / AVC
    #[default]
    H264,
    /// H.265 / HEVC
    H265,
}

impl VideoCodec {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::H265 => "h265",
        }
    }
}

impl FromStr for VideoCodec {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('.', "").as_str() {
            "h264" | "avc" => Ok(Self::H264),
            "h265" | "hevc" => Ok(Self::H265),
            _ => Err(CoreError::InvalidParameter(format!("Unknown codec: {s}"))),
        }
    }
}

/// Maps an acceleration backend and codec family to the encoder name.
pub fn encoder_id(accel: HardwareAccel, codec: VideoCodec) -> &'static str {
    match (accel, codec) {
        (HardwareAccel::None, VideoCodec::H264) => "libx264",
        (HardwareAccel::None, VideoCodec::H265) => "libx265",
        (HardwareAccel::Nvenc, VideoCodec::H264) => "h264_nvenc",
        (HardwareAccel::Nvenc, VideoCodec::H265) => "hevc_nvenc",
        (HardwareAccel::Qsv, VideoCodec::H264) => "h264_qsv",
        (HardwareAccel::Qsv, VideoCodec::H265) => "hevc_qsv",
        (HardwareAccel::Amf, VideoCodec::H264) => "h264_amf",
        (HardwareAccel::Amf, VideoCodec::H265) => "hevc_amf",
        (HardwareAccel::Videotoolbox, VideoCodec::H264) => "h264_videotoolbox",
        (HardwareAccel::Videotoolbox, VideoCodec::H265) => "hevc_videotoolbox",
    }
}

/// `<source dir>/<prefix><source file name>`
pub fn default_output_path(source: &Path, prefix: &str) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    source.with_file_name(format!("{prefix}{file_name}"))
}

// =============================================================================
// Encode Request
// =============================================================================

/// Parameters of one encode, as confirmed by the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeRequest {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    /// Encoder name passed to `-c:v`
    pub encoder: String,
    /// Target bitrate in kbps, as entered
    pub bitrate_kbps: String,
    /// Total media duration used for progress, when known
    pub total_duration_ms: Option<TimeMillis>,
}

impl EncodeRequest {
    pub fn new(
        source_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        encoder: impl Into<String>,
        bitrate_kbps: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            output_path: output_path.into(),
            encoder: encoder.into(),
            bitrate_kbps: bitrate_kbps.into(),
            total_duration_ms: None,
        }
    }

    pub fn with_total_duration_ms(mut self, total_ms: TimeMillis) -> Self {
        self.total_duration_ms = Some(total_ms);
        self
    }

    /// Checks the request before anything is spawned.
    pub fn validate(&self) -> CoreResult<()> {
        parse_bitrate_kbps(&self.bitrate_kbps)?;
        if self.encoder.trim().is_empty() {
            return Err(CoreError::InvalidParameter("Encoder is empty".to_string()));
        }
        if self.source_path.as_os_str().is_empty() || self.output_path.as_os_str().is_empty() {
            return Err(CoreError::InvalidParameter(
                "Source and output paths are required".to_string(),
            ));
        }
        if self.source_path == self.output_path {
            return Err(CoreError::InvalidParameter(
                "Output path must differ from the source".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parses a bitrate entered as text. Only positive decimal integers pass.
pub fn parse_bitrate_kbps(value: &str) -> CoreResult<u32> {
    let invalid = || CoreError::InvalidParameter(format!("Bitrate must be a positive integer: {value:?}"));

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match value.parse::<u32>() {
        Ok(kbps) if kbps > 0 => Ok(kbps),
        _ => Err(invalid()),
    }
}
