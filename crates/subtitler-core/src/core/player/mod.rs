//! Media Playback Contract
//!
//! Video decoding and rendering belong to an external playback component.
//! This module defines what the application needs from it and the pure
//! helpers layered on top (relative seeks, play/pause toggle, time label).

use std::path::Path;

use crate::core::settings::PlaybackSettings;
use crate::core::subtitles::format_time_with_millis;
use crate::core::{CoreResult, TimeSec};

/// Receives position updates from a [`MediaPlayer`].
///
/// Called from the player's own thread.
pub trait PlaybackCallback: Send + Sync {
    fn on_time_changed(&self, seconds: TimeSec);
    fn on_duration_changed(&self, seconds: TimeSec);
}

/// Embedded media player
pub trait MediaPlayer {
    /// Opens a local video file, replacing the current one.
    fn open_video(&mut self, path: &Path) -> CoreResult<()>;
    fn play(&mut self);
    fn pause(&mut self);
    /// Seeks to an absolute position in seconds.
    fn seek(&mut self, seconds: TimeSec);
    fn current_time(&self) -> TimeSec;
    /// Total duration in seconds; `0.0` while unknown.
    fn duration(&self) -> TimeSec;
    fn is_playing(&self) -> bool;
    fn set_playback_speed(&mut self, rate: f64);
    fn set_callback(&mut self, callback: Box<dyn PlaybackCallback>);
}

/// Clamps a seek target to `[0, duration]`. An unknown (non-positive)
/// duration only clamps at zero.
pub fn clamp_seek_target(target: TimeSec, duration: TimeSec) -> TimeSec {
    let target = if target.is_finite() { target.max(0.0) } else { 0.0 };
    if duration.is_finite() && duration > 0.0 {
        target.min(duration)
    } else {
        target
    }
}

/// Seeks by `delta` seconds from the current position. Returns the target.
pub fn seek_relative(player: &mut dyn MediaPlayer, delta: TimeSec) -> TimeSec {
    let target = clamp_seek_target(player.current_time() + delta, player.duration());
    player.seek(target);
    target
}

/// Seek buttons of the player bar
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekStep {
    LargeBack,
    SmallBack,
    SmallForward,
    LargeForward,
}

impl SeekStep {
    /// Signed offset in seconds for the configured step sizes.
    pub fn delta(self, settings: &PlaybackSettings) -> TimeSec {
        match self {
            Self::LargeBack => -settings.large_seek_step,
            Self::SmallBack => -settings.small_seek_step,
            Self::SmallForward => settings.small_seek_step,
            Self::LargeForward => settings.large_seek_step,
        }
    }
}

/// Seeks by one configured step. Returns the target.
pub fn seek_step(
    player: &mut dyn MediaPlayer,
    settings: &PlaybackSettings,
    step: SeekStep,
) -> TimeSec {
    seek_relative(player, step.delta(settings))
}

/// Opens a video and applies the configured playback speed.
pub fn open_with_settings(
    player: &mut dyn MediaPlayer,
    path: &Path,
    settings: &PlaybackSettings,
) -> CoreResult<()> {
    player.open_video(path)?;
    player.set_playback_speed(settings.default_speed);
    Ok(())
}

/// Plays when paused, pauses when playing. Returns whether it now plays.
pub fn toggle_play(player: &mut dyn MediaPlayer) -> bool {
    if player.is_playing() {
        player.pause();
        false
    } else {
        player.play();
        true
    }
}

/// `HH:MM:SS,mmm / HH:MM:SS,mmm`
pub fn time_label(current: TimeSec, duration: TimeSec) -> String {
    format!(
        "{} / {}",
        format_time_with_millis(current),
        format_time_with_millis(duration)
    )
}
