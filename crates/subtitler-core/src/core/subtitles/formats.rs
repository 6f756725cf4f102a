//! Subtitle File Formats
//!
//! SRT (SubRip) import/export and plain-text import.
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! First caption text
//!
//! 2
//! 00:00:05,500 --> 00:00:08,000
//! Second caption text
//! with multiple lines
//! ```

use std::path::Path;

use tracing::{info, warn};

use super::{normalize_timestamp, rebuild_list, TimedEntry};
use crate::core::{fs::atomic_write_str, CoreError, CoreResult};

/// Arrow used by SRT between start and end. Distinct from the editor's `->`.
pub const SRT_ARROW: &str = "-->";

// =============================================================================
// SRT Format
// =============================================================================

/// Parses SRT content into timed entries.
///
/// Index lines (digits only) are skipped, content lines of a block are joined
/// with `\n`, and a trailing block without a final blank line is kept.
/// Malformed timestamps leave the corresponding time unset.
pub fn parse_srt(content: &str) -> Vec<TimedEntry> {
    let mut entries = Vec::new();
    let mut block = SrtBlock::default();

    for raw in content.lines() {
        let line = raw.trim().trim_start_matches('\u{feff}');

        if line.is_empty() {
            block.flush_into(&mut entries);
        } else if line.contains(SRT_ARROW) {
            let (start, end) = parse_srt_time_line(line);
            block.start_time = start;
            block.end_time = end;
            block.has_times = true;
        } else if line.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        } else {
            block.lines.push(line.to_string());
        }
    }
    block.flush_into(&mut entries);

    entries
}

#[derive(Default)]
struct SrtBlock {
    start_time: Option<String>,
    end_time: Option<String>,
    has_times: bool,
    lines: Vec<String>,
}

impl SrtBlock {
    fn flush_into(&mut self, entries: &mut Vec<TimedEntry>) {
        let block = std::mem::take(self);
        if block.lines.is_empty() && !block.has_times {
            return;
        }
        entries.push(TimedEntry {
            content: block.lines.join("\n"),
            start_time: block.start_time,
            end_time: block.end_time,
        });
    }
}

fn parse_srt_time_line(line: &str) -> (Option<String>, Option<String>) {
    let (start, end) = line.split_once(SRT_ARROW).unwrap_or((line, ""));
    // Some writers append cue settings after the end time.
    let end = end.split_whitespace().next().unwrap_or("");

    let checked = |value: &str| {
        let normalized = normalize_timestamp(value);
        if normalized.is_none() {
            warn!("Ignoring malformed SRT timestamp: {:?}", value.trim());
        }
        normalized
    };

    (checked(start), checked(end))
}

/// Serializes entries as SRT.
///
/// Fails with [`CoreError::ExportIncomplete`] (1-based entry number) when any
/// entry is missing its start or end time.
pub fn export_srt(entries: &[TimedEntry]) -> CoreResult<String> {
    let mut output = String::new();

    for (i, entry) in entries.iter().enumerate() {
        let (Some(start), Some(end)) = (&entry.start_time, &entry.end_time) else {
            return Err(CoreError::ExportIncomplete { index: i + 1 });
        };
        output.push_str(&format!(
            "{}\n{} {} {}\n{}\n\n",
            i + 1,
            start,
            SRT_ARROW,
            end,
            entry.content.trim()
        ));
    }

    Ok(output)
}

// =============================================================================
// File Operations
// =============================================================================

fn read_source(path: &Path) -> CoreResult<String> {
    std::fs::read_to_string(path).map_err(|source| CoreError::ImportIoFailure {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and parses an SRT file.
pub fn import_srt_file(path: &Path) -> CoreResult<Vec<TimedEntry>> {
    let entries = parse_srt(&read_source(path)?);
    info!("Imported {} subtitles from {}", entries.len(), path.display());
    Ok(entries)
}

/// Reads a plain-text file; returns the raw text and the entries parsed from it
/// with no times carried over.
pub fn import_text_file(path: &Path) -> CoreResult<(String, Vec<TimedEntry>)> {
    let text = read_source(path)?;
    let entries = rebuild_list(&text, &[]);
    info!("Imported {} lines from {}", entries.len(), path.display());
    Ok((text, entries))
}

/// Exports entries to an SRT file. Nothing is written when validation fails.
pub fn export_srt_file(path: &Path, entries: &[TimedEntry]) -> CoreResult<()> {
    let content = export_srt(entries)?;
    atomic_write_str(path, &content)?;
    info!("Exported {} subtitles to {}", entries.len(), path.display());
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
