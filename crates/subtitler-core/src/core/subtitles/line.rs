//! Editor line grammar
//!
//! Converts between one line of editor text and a [`TimedEntry`], and rebuilds
//! the whole entry list after the editor text changes.

use super::{is_valid_timestamp, TimedEntry};

/// Separates the time range from the caption text.
pub const CONTENT_SEPARATOR: &str = " | ";

/// Separates start and end inside the time range.
pub const RANGE_SEPARATOR: &str = " -> ";

const END_ONLY_PREFIX: &str = "-> ";
const START_ONLY_SUFFIX: &str = " ->";

/// Parses one editor line into a timed entry.
///
/// Only the first `" | "` is significant, so caption text may itself contain
/// the separator. A line whose prefix is not a well-formed time range is kept
/// verbatim as content with both times unset.
pub fn parse_line(raw: &str) -> TimedEntry {
    let Some((time_part, content)) = raw.split_once(CONTENT_SEPARATOR) else {
        return TimedEntry::new(raw);
    };

    match parse_time_range(time_part) {
        Some((start_time, end_time)) => TimedEntry {
            content: content.to_string(),
            start_time,
            end_time,
        },
        None => TimedEntry::new(raw),
    }
}

/// Parses `START -> END`, `-> END` or `START ->`.
fn parse_time_range(time_part: &str) -> Option<(Option<String>, Option<String>)> {
    let (start, end) = if let Some(end) = time_part.strip_prefix(END_ONLY_PREFIX) {
        (None, Some(end))
    } else if let Some(start) = time_part.strip_suffix(START_ONLY_SUFFIX) {
        (Some(start), None)
    } else {
        let (start, end) = time_part.split_once(RANGE_SEPARATOR)?;
        (Some(start), Some(end))
    };

    let check = |side: Option<&str>| -> Option<Option<String>> {
        match side.map(str::trim) {
            None => Some(None),
            Some(value) if is_valid_timestamp(value) => Some(Some(value.to_string())),
            Some(_) => None,
        }
    };

    Some((check(start)?, check(end)?))
}

/// Serializes an entry back to its editor line.
pub fn to_line(entry: &TimedEntry) -> String {
    match (entry.start_time.as_deref(), entry.end_time.as_deref()) {
        (None, None) => entry.content.clone(),
        (None, Some(end)) => format!("{END_ONLY_PREFIX}{end}{CONTENT_SEPARATOR}{}", entry.content),
        (Some(start), None) => {
            format!("{start}{START_ONLY_SUFFIX}{CONTENT_SEPARATOR}{}", entry.content)
        }
        (Some(start), Some(end)) => format!(
            "{start}{RANGE_SEPARATOR}{end}{CONTENT_SEPARATOR}{}",
            entry.content
        ),
    }
}

/// Serializes an entry for the editor, flattening embedded newlines so the
/// entry stays on a single line.
pub fn to_editor_line(entry: &TimedEntry) -> String {
    if entry.content.contains('\n') {
        let flattened = TimedEntry {
            content: entry.content.lines().map(str::trim).collect::<Vec<_>>().join(" "),
            ..entry.clone()
        };
        to_line(&flattened)
    } else {
        to_line(entry)
    }
}

/// Rebuilds the entry list from editor text.
///
/// Blank lines are dropped and every remaining (trimmed) line is parsed.
/// Entry `i` of the result then takes its start and end times from
/// `previous[i]` when that exists; content always comes from the new text.
pub fn rebuild_list(text: &str, previous: &[TimedEntry]) -> Vec<TimedEntry> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| {
            let mut entry = parse_line(line);
            if let Some(existing) = previous.get(index) {
                entry.take_times_from(existing);
            }
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const T1: &str = "00:00:05,909";
    const T2: &str = "00:00:08,909";

    #[test]
    fn test_parse_full_range() {
        let entry = parse_line("00:00:05,909 -> 00:00:08,909 | Hello");
        assert_eq!(entry, TimedEntry::with_times("Hello", Some(T1), Some(T2)));
    }

    #[test]
    fn test_parse_end_only() {
        let entry = parse_line("-> 00:00:08,909 | Hello");
        assert_eq!(entry, TimedEntry::with_times("Hello", None, Some(T2)));
    }

    #[test]
    fn test_parse_start_only() {
        let entry = parse_line("00:00:05,909 -> | Hello");
        assert_eq!(entry, TimedEntry::with_times("Hello", Some(T1), None));
    }

    #[test]
    fn test_parse_plain_text() {
        assert_eq!(parse_line("Just text"), TimedEntry::new("Just text"));
    }

    #[test]
    fn test_parse_arrow_without_separator_is_content() {
        let raw = "00:00:05,909 -> 00:00:08,909";
        assert_eq!(parse_line(raw), TimedEntry::new(raw));
    }

    #[test]
    fn test_parse_non_time_prefix_is_content() {
        let raw = "left -> right | not a cue";
        assert_eq!(parse_line(raw), TimedEntry::new(raw));
    }

    #[test]
    fn test_parse_splits_on_first_separator_only() {
        let entry = parse_line("00:00:05,909 -> 00:00:08,909 | a | b -> c");
        assert_eq!(entry.content, "a | b -> c");
        assert_eq!(entry.start_time.as_deref(), Some(T1));
        assert_eq!(entry.end_time.as_deref(), Some(T2));
    }

    #[test]
    fn test_parse_empty_content() {
        let entry = parse_line("00:00:05,909 -> 00:00:08,909 | ");
        assert_eq!(entry.content, "");
        assert!(entry.is_fully_timed());
    }

    #[test]
    fn test_parse_inverted_range_is_allowed() {
        let entry = parse_line("00:00:08,909 -> 00:00:05,909 | Backwards");
        assert_eq!(entry.start_time.as_deref(), Some(T2));
        assert_eq!(entry.end_time.as_deref(), Some(T1));
    }

    #[test]
    fn test_to_line_variants() {
        assert_eq!(to_line(&TimedEntry::new("Hi")), "Hi");
        assert_eq!(
            to_line(&TimedEntry::with_times("Hi", None, Some(T2))),
            "-> 00:00:08,909 | Hi"
        );
        assert_eq!(
            to_line(&TimedEntry::with_times("Hi", Some(T1), None)),
            "00:00:05,909 -> | Hi"
        );
        assert_eq!(
            to_line(&TimedEntry::with_times("Hi", Some(T1), Some(T2))),
            "00:00:05,909 -> 00:00:08,909 | Hi"
        );
    }

    #[test]
    fn test_line_roundtrip_for_every_time_shape() {
        let entries = [
            TimedEntry::new("plain"),
            TimedEntry::with_times("end only", None, Some(T2)),
            TimedEntry::with_times("start only", Some(T1), None),
            TimedEntry::with_times("both", Some(T1), Some(T2)),
            TimedEntry::with_times("", Some(T1), Some(T2)),
        ];
        for entry in entries {
            assert_eq!(parse_line(&to_line(&entry)), entry);
        }
    }

    #[test]
    fn test_editor_line_flattens_newlines() {
        let entry = TimedEntry::with_times("first\nsecond", Some(T1), Some(T2));
        assert_eq!(
            to_editor_line(&entry),
            "00:00:05,909 -> 00:00:08,909 | first second"
        );
    }

    #[test]
    fn test_rebuild_reuses_times_by_position() {
        let previous = vec![
            TimedEntry::with_times("a", Some("00:00:01,000"), Some("00:00:02,000")),
            TimedEntry::with_times("b", Some("00:00:03,000"), Some("00:00:04,000")),
        ];

        let rebuilt = rebuild_list("a\nb\nc", &previous);

        assert_eq!(
            rebuilt,
            vec![
                previous[0].clone(),
                previous[1].clone(),
                TimedEntry::new("c"),
            ]
        );
    }

    #[test]
    fn test_rebuild_content_from_text_wins() {
        let previous = vec![TimedEntry::with_times(
            "old",
            Some("00:00:01,000"),
            Some("00:00:02,000"),
        )];

        let rebuilt = rebuild_list("new", &previous);

        assert_eq!(rebuilt[0].content, "new");
        assert_eq!(rebuilt[0].start_time.as_deref(), Some("00:00:01,000"));
    }

    #[test]
    fn test_rebuild_previous_times_override_parsed_times() {
        let previous = vec![TimedEntry::new("a")];
        let rebuilt = rebuild_list("00:00:05,909 -> 00:00:08,909 | a", &previous);

        assert_eq!(rebuilt[0].content, "a");
        assert!(rebuilt[0].start_time.is_none());
        assert!(rebuilt[0].end_time.is_none());
    }

    #[test]
    fn test_rebuild_drops_blank_lines() {
        let rebuilt = rebuild_list("a\n\n  \nb", &[]);
        assert_eq!(rebuilt, vec![TimedEntry::new("a"), TimedEntry::new("b")]);
    }

    #[test]
    fn test_rebuild_handles_crlf() {
        let rebuilt = rebuild_list("a\r\nb\r\n", &[]);
        assert_eq!(rebuilt.len(), 2);
        assert_eq!(rebuilt[1].content, "b");
    }
}
