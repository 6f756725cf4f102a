//! Encoder command construction

use std::ffi::OsString;
use std::path::PathBuf;

use tokio::process::Command;

use super::{parse_bitrate_kbps, EncodeRequest};
use crate::core::{process::configure_encoder_command, CoreResult};

/// Builds the external process for an encode request.
///
/// The engine pipes and reads both output streams of the returned command.
pub trait EncoderInvocation: Send + Sync {
    fn command(&self, request: &EncodeRequest) -> CoreResult<Command>;
}

/// Runs the `ffmpeg` binary.
#[derive(Clone, Debug)]
pub struct FfmpegInvocation {
    ffmpeg_path: PathBuf,
}

impl FfmpegInvocation {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Arguments for `request`: video re-encoded at the target bitrate,
    /// audio copied, output overwritten.
    pub fn args(request: &EncodeRequest) -> CoreResult<Vec<OsString>> {
        let kbps = parse_bitrate_kbps(&request.bitrate_kbps)?;

        let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(request.source_path.clone().into_os_string());
        args.extend(
            [
                "-c:v".to_string(),
                request.encoder.clone(),
                "-b:v".to_string(),
                format!("{kbps}k"),
                "-c:a".to_string(),
                "copy".to_string(),
                "-y".to_string(),
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(request.output_path.clone().into_os_string());
        Ok(args)
    }
}

impl EncoderInvocation for FfmpegInvocation {
    fn command(&self, request: &EncodeRequest) -> CoreResult<Command> {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(Self::args(request)?);
        configure_encoder_command(&mut cmd);
        Ok(cmd)
    }
}
