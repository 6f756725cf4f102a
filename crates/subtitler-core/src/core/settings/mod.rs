//! Settings Persistence System
//!
//! Provides persistent application settings with:
//! - Atomic file writes (temp file + rename)
//! - Defaults for every missing field
//! - Normalization of out-of-range values
//!
//! Storage location: {data_dir}/subtitler/settings.json

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::encoding::{
    encoder_id, HardwareAccel, VideoCodec, DEFAULT_BITRATE_KBPS, DEFAULT_OUTPUT_PREFIX,
};
use crate::core::fs::atomic_write_json_pretty;
use crate::core::{CoreError, CoreResult};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Application directory name under the platform data directory
pub const APP_DIR_NAME: &str = "subtitler";

/// Platform data directory for the application, if the platform has one.
pub fn default_settings_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME))
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Schema version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Encode dialog defaults
    #[serde(default)]
    pub encode: EncodeSettings,

    /// Playback settings
    #[serde(default)]
    pub playback: PlaybackSettings,

    /// External tool locations
    #[serde(default)]
    pub ffmpeg: FfmpegSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            encode: EncodeSettings::default(),
            playback: PlaybackSettings::default(),
            ffmpeg: FfmpegSettings::default(),
        }
    }
}

impl AppSettings {
    /// Corrects bad values instead of failing, so an edited or old file
    /// still loads.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.encode.bitrate_kbps = self.encode.bitrate_kbps.clamp(1, 500_000);
        let prefix = self.encode.output_prefix.trim();
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            self.encode.output_prefix = default_output_prefix();
        }

        self.playback.small_seek_step =
            clamp_f64(self.playback.small_seek_step, 0.05, 60.0, default_small_seek_step());
        self.playback.large_seek_step =
            clamp_f64(self.playback.large_seek_step, 0.05, 60.0, default_large_seek_step());
        self.playback.default_speed =
            clamp_f64(self.playback.default_speed, 0.25, 4.0, default_speed());

        for path in [&mut self.ffmpeg.ffmpeg_path, &mut self.ffmpeg.ffprobe_path] {
            if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
                *path = None;
            }
        }
    }
}

fn clamp_f64(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}

/// Encode dialog defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EncodeSettings {
    /// Target video bitrate (kbps)
    #[serde(default = "default_bitrate")]
    pub bitrate_kbps: u32,

    #[serde(default)]
    pub hardware_accel: HardwareAccel,

    #[serde(default)]
    pub codec: VideoCodec,

    /// Prefix of the default output file name
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            bitrate_kbps: default_bitrate(),
            hardware_accel: HardwareAccel::default(),
            codec: VideoCodec::default(),
            output_prefix: default_output_prefix(),
        }
    }
}

impl EncodeSettings {
    /// Encoder name for the configured acceleration and codec
    pub fn encoder_id(&self) -> &'static str {
        encoder_id(self.hardware_accel, self.codec)
    }
}

fn default_bitrate() -> u32 {
    DEFAULT_BITRATE_KBPS
}

fn default_output_prefix() -> String {
    DEFAULT_OUTPUT_PREFIX.to_string()
}

/// Playback settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Fine seek step (seconds)
    #[serde(default = "default_small_seek_step")]
    pub small_seek_step: f64,

    /// Coarse seek step (seconds)
    #[serde(default = "default_large_seek_step")]
    pub large_seek_step: f64,

    /// Playback rate applied when a video is opened
    #[serde(default = "default_speed")]
    pub default_speed: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            small_seek_step: default_small_seek_step(),
            large_seek_step: default_large_seek_step(),
            default_speed: default_speed(),
        }
    }
}

fn default_small_seek_step() -> f64 {
    0.5
}

fn default_large_seek_step() -> f64 {
    1.0
}

fn default_speed() -> f64 {
    1.0
}

/// FFmpeg binary overrides; `None` means auto-detect
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FfmpegSettings {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}

// =============================================================================
// Settings Manager
// =============================================================================

/// Loads, saves and resets the settings file
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager with the given app data directory
    pub fn new(app_data_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: app_data_dir.into().join(SETTINGS_FILE),
        }
    }

    /// Settings manager in the platform data directory
    pub fn from_default_dir() -> CoreResult<Self> {
        default_settings_dir()
            .map(Self::new)
            .ok_or_else(|| CoreError::Internal("No data directory on this platform".to_string()))
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Load settings from disk. Missing or unreadable files yield defaults.
    pub fn load(&self) -> AppSettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(AppSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)?;
            let mut settings = serde_json::from_str::<AppSettings>(&content)?;

            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
                settings = migrate(settings);
            }

            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    /// Normalizes and saves settings atomically. Returns what was written.
    pub fn save(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();
            atomic_write_json_pretty(&self.settings_path, &normalized)?;
            info!("Settings saved to {}", self.settings_path.display());
            Ok(normalized)
        })
    }

    /// Deletes the settings file and returns defaults
    pub fn reset(&self) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)?;
                info!("Settings file deleted");
            }
            Ok(AppSettings::default())
        })
    }
}

/// Upgrades settings written by an older schema version
fn migrate(mut settings: AppSettings) -> AppSettings {
    settings.version = SETTINGS_VERSION;
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.encode.bitrate_kbps, 2000);
        assert_eq!(settings.encode.encoder_id(), "libx264");
        assert_eq!(settings.encode.output_prefix, "output_");
        assert_eq!(settings.playback.small_seek_step, 0.5);
        assert_eq!(settings.playback.large_seek_step, 1.0);
        assert!(settings.ffmpeg.ffmpeg_path.is_none());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path());
        assert_eq!(manager.load(), AppSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path());
        let mut settings = AppSettings::default();
        settings.encode.bitrate_kbps = 4500;
        settings.encode.hardware_accel = HardwareAccel::Nvenc;
        settings.encode.codec = VideoCodec::H265;

        manager.save(&settings).unwrap();
        let loaded = manager.load();

        assert_eq!(loaded, settings);
        assert_eq!(loaded.encode.encoder_id(), "hevc_nvenc");
        assert!(dir.path().join(SETTINGS_LOCK_FILE).exists());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{ "encode": { "hardwareAccel": "qsv" } }"#,
        )
        .unwrap();

        let loaded = SettingsManager::new(dir.path()).load();

        assert_eq!(loaded.encode.hardware_accel, HardwareAccel::Qsv);
        assert_eq!(loaded.encode.bitrate_kbps, 2000);
        assert_eq!(loaded.playback, PlaybackSettings::default());
    }

    #[test]
    fn test_corrupt_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "{ not json").unwrap();

        let loaded = SettingsManager::new(dir.path()).load();

        assert_eq!(loaded, AppSettings::default());
    }

    #[test]
    fn test_normalize_clamps_values() {
        let mut settings = AppSettings::default();
        settings.version = 0;
        settings.encode.bitrate_kbps = 0;
        settings.encode.output_prefix = "../".to_string();
        settings.playback.small_seek_step = f64::NAN;
        settings.playback.large_seek_step = 500.0;
        settings.playback.default_speed = 0.0;
        settings.ffmpeg.ffmpeg_path = Some(PathBuf::new());

        settings.normalize();

        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.encode.bitrate_kbps, 1);
        assert_eq!(settings.encode.output_prefix, "output_");
        assert_eq!(settings.playback.small_seek_step, 0.5);
        assert_eq!(settings.playback.large_seek_step, 60.0);
        assert_eq!(settings.playback.default_speed, 0.25);
        assert!(settings.ffmpeg.ffmpeg_path.is_none());
    }

    #[test]
    fn test_save_returns_normalized() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path());
        let mut settings = AppSettings::default();
        settings.encode.bitrate_kbps = 9_999_999;

        let saved = manager.save(&settings).unwrap();

        assert_eq!(saved.encode.bitrate_kbps, 500_000);
        assert_eq!(manager.load().encode.bitrate_kbps, 500_000);
    }

    #[test]
    fn test_reset_deletes_file() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path());
        manager.save(&AppSettings::default()).unwrap();
        assert!(manager.settings_path().exists());

        let settings = manager.reset().unwrap();

        assert_eq!(settings, AppSettings::default());
        assert!(!manager.settings_path().exists());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(AppSettings::default()).unwrap();
        assert_eq!(json["encode"]["bitrateKbps"], 2000);
        assert_eq!(json["encode"]["hardwareAccel"], "none");
        assert_eq!(json["playback"]["smallSeekStep"], 0.5);
    }
}
