//! Subtitler CLI
//!
//! Headless front end: subtitle conversion and video encoding driven through
//! the same contracts a desktop UI uses.

mod error;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use subtitler_core::core::encoding::{
    default_output_path, encoder_id, EncodeRequest, EncodingEngine, HardwareAccel, TaskEvent,
    TaskRegistry, TaskStatus, VideoCodec,
};
use subtitler_core::core::ffmpeg::{
    detect_ffmpeg, ffmpeg_version, probe_duration_ms, probe_media, FFmpegInfo,
};
use subtitler_core::core::settings::{default_settings_dir, AppSettings, SettingsManager};
use subtitler_core::core::subtitles::{to_editor_line, SubtitleDocument, TimedEntry};
use subtitler_core::events::Notification;
use subtitler_core::logging::init_logging;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "subtitler", version, about = "Subtitle timing and video encoding")]
struct Cli {
    /// Settings directory (defaults to the platform data directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Print notifications and results as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import an SRT or plain-text file and print its editor lines
    Import {
        /// `.srt` files are parsed as SRT, anything else as editor text
        file: PathBuf,
    },
    /// Convert editor text (one cue per line) to an SRT file
    Export {
        /// Editor text file
        input: PathBuf,
        /// SRT file to write
        output: PathBuf,
    },
    /// Re-encode a video with the external encoder
    Encode {
        input: PathBuf,
        /// Output file (defaults to `<dir>/<prefix><name>`)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// none, nvenc, qsv, amf or videotoolbox
        #[arg(long)]
        hwaccel: Option<HardwareAccel>,
        /// h264 or h265
        #[arg(long)]
        codec: Option<VideoCodec>,
        /// Target video bitrate in kbps
        #[arg(long)]
        bitrate: Option<String>,
        /// Total duration for progress; probed with ffprobe when omitted
        #[arg(long)]
        duration_ms: Option<u64>,
    },
    /// Show media information and the encoder in use
    Probe { input: PathBuf },
    /// Show or reset the settings file
    Settings {
        #[arg(long)]
        reset: bool,
    },
}

/// One row of the subtitle table
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryRow<'a> {
    index: usize,
    #[serde(flatten)]
    entry: &'a TimedEntry,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings_dir = cli.config_dir.clone().or_else(default_settings_dir);
    let log_dir = settings_dir.as_ref().map(|dir| dir.join("logs"));
    let _log_guard = init_logging(log_dir.as_deref());

    match run(cli, settings_dir).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            err.downcast_ref::<CliError>()
                .map(CliError::exit_code)
                .unwrap_or(ExitCode::FAILURE)
        }
    }
}

async fn run(cli: Cli, settings_dir: Option<PathBuf>) -> Result<()> {
    let manager = settings_dir.map(SettingsManager::new);
    let settings = manager
        .as_ref()
        .map(SettingsManager::load)
        .unwrap_or_default();

    match cli.command {
        Command::Import { file } => import(&file, cli.json),
        Command::Export { input, output } => export(&input, &output),
        Command::Encode {
            input,
            output,
            hwaccel,
            codec,
            bitrate,
            duration_ms,
        } => {
            let accel = hwaccel.unwrap_or(settings.encode.hardware_accel);
            let codec = codec.unwrap_or(settings.encode.codec);
            let output = output
                .unwrap_or_else(|| default_output_path(&input, &settings.encode.output_prefix));
            let bitrate = bitrate.unwrap_or_else(|| settings.encode.bitrate_kbps.to_string());
            let request = EncodeRequest::new(&input, output, encoder_id(accel, codec), bitrate);
            encode(&settings, request, duration_ms, cli.json).await
        }
        Command::Probe { input } => probe(&settings, &input, cli.json).await,
        Command::Settings { reset } => {
            let manager = manager.context("No settings directory available")?;
            let shown = if reset { manager.reset()? } else { settings };
            println!("{}", serde_json::to_string_pretty(&shown)?);
            eprintln!("Settings file: {}", manager.settings_path().display());
            Ok(())
        }
    }
}

// =============================================================================
// Subtitles
// =============================================================================

fn import(file: &Path, json: bool) -> Result<()> {
    let mut doc = SubtitleDocument::new();
    let is_srt = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"));
    if is_srt {
        doc.import_srt(file)?;
    } else {
        doc.import_text(file)?;
    }

    if json {
        for (index, entry) in doc.entries().iter().enumerate() {
            println!("{}", serde_json::to_string(&EntryRow { index, entry })?);
        }
    } else {
        for entry in doc.entries() {
            println!("{}", to_editor_line(entry));
        }
    }
    Ok(())
}

fn export(input: &Path, output: &Path) -> Result<()> {
    let mut doc = SubtitleDocument::new();
    doc.import_text(input)?;
    doc.export_srt(output)
        .with_context(|| format!("Failed to export {}", output.display()))?;
    eprintln!("Wrote {} subtitles to {}", doc.entries().len(), output.display());
    Ok(())
}

// =============================================================================
// Encoding
// =============================================================================

fn resolve_ffmpeg(settings: &AppSettings) -> Result<FFmpegInfo> {
    let info = detect_ffmpeg(
        settings.ffmpeg.ffmpeg_path.as_deref(),
        settings.ffmpeg.ffprobe_path.as_deref(),
    )?;
    Ok(info)
}

async fn encode(
    settings: &AppSettings,
    mut request: EncodeRequest,
    duration_ms: Option<u64>,
    json: bool,
) -> Result<()> {
    request.validate()?;
    let ffmpeg = resolve_ffmpeg(settings)?;

    let total_ms = match duration_ms {
        Some(ms) => Some(ms),
        None => match probe_duration_ms(&ffmpeg.ffprobe_path, &request.source_path).await {
            Ok(ms) => Some(ms),
            Err(e) => {
                tracing::warn!("Could not probe duration, progress unavailable: {}", e);
                None
            }
        },
    };
    request.total_duration_ms = total_ms;

    let mut engine = EncodingEngine::with_ffmpeg(&ffmpeg.ffmpeg_path);
    let mut events = engine
        .take_event_receiver()
        .context("Event receiver already taken")?;
    let mut registry = TaskRegistry::new();

    let handle = engine.submit(request)?;
    let task_id = handle.id().to_string();
    registry.insert(handle);

    let mut cancel_sent = false;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c(), if !cancel_sent => {
                cancel_sent = true;
                registry.cancel(&task_id);
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                registry.apply(&event);
                report(&registry, &event, json)?;
                if matches!(event, TaskEvent::Finished { .. }) && event.task_id() == task_id {
                    break;
                }
            }
        }
    }

    let task = registry
        .get(&task_id)
        .context("Encode task disappeared from the registry")?;
    match task.status {
        TaskStatus::Completed => Ok(()),
        TaskStatus::Cancelled => Err(CliError::EncodeCancelled.into()),
        _ => Err(CliError::EncodeFailed(
            task.error_detail
                .clone()
                .unwrap_or_else(|| task.status_text()),
        )
        .into()),
    }
}

fn report(registry: &TaskRegistry, event: &TaskEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", Notification::from_task_event(event)?.to_json_line()?);
        return Ok(());
    }

    if let Some(task) = registry.get(event.task_id()) {
        match event {
            TaskEvent::Submitted { .. } => {
                println!(
                    "[{}] {} -> {}",
                    task.started_clock(),
                    task.source_path.display(),
                    task.source_label
                )
            }
            TaskEvent::Finished { .. } => {
                println!("[{}] {}", task.finished_clock(), task.status_text())
            }
            _ => println!("{}", task.status_text()),
        }
    }
    Ok(())
}

async fn probe(settings: &AppSettings, input: &Path, json: bool) -> Result<()> {
    let ffmpeg = resolve_ffmpeg(settings)?;
    let info = probe_media(&ffmpeg.ffprobe_path, input).await?;
    let version = ffmpeg_version(&ffmpeg.ffmpeg_path)
        .await
        .unwrap_or_else(|_| "unknown".to_string());

    if json {
        println!("{}", serde_json::to_string(&info)?);
    } else {
        println!("Format:   {}", info.format);
        println!("Duration: {} ms", info.duration_ms().unwrap_or(0));
        println!("Video:    {}", if info.has_video { "yes" } else { "no" });
        println!("Audio:    {}", if info.has_audio { "yes" } else { "no" });
        println!("Encoder:  {} ({})", ffmpeg.ffmpeg_path.display(), version);
        println!(
            "Default:  {} @ {}k",
            settings.encode.encoder_id(),
            settings.encode.bitrate_kbps
        );
    }
    Ok(())
}
