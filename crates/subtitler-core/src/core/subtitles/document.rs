//! Subtitle Document
//!
//! Owns the editor text and the entry table and keeps them in sync. User
//! edits to the text rebuild the table; table actions regenerate the text
//! inside a suspended-sync scope so the regenerated text is not parsed back.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    export_srt_file, format_time_with_millis, import_srt_file, import_text_file, rebuild_list,
    to_editor_line, TimedEntry,
};
use crate::core::{CoreError, CoreResult, TimeSec};

/// Content of a row created by [`SubtitleDocument::insert_above`].
pub const PLACEHOLDER_TEXT: &str = "[Enter subtitle text here]";

/// Change notification published to document subscribers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DocumentEvent {
    /// The entry table was rebuilt from scratch
    EntriesRebuilt { count: usize },
    /// A single entry changed in place
    EntryChanged { index: usize },
    /// The editor text was regenerated from the entry table
    EditorTextReplaced,
}

type DocumentListener = Box<dyn Fn(&DocumentEvent) + Send + Sync>;

/// Editor text plus the timed entries parsed from it.
#[derive(Default)]
pub struct SubtitleDocument {
    entries: Vec<TimedEntry>,
    editor_text: String,
    sync_suspended: bool,
    listeners: Vec<DocumentListener>,
}

impl std::fmt::Debug for SubtitleDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubtitleDocument")
            .field("entries", &self.entries)
            .field("editor_text", &self.editor_text)
            .field("sync_suspended", &self.sync_suspended)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SubtitleDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TimedEntry] {
        &self.entries
    }

    pub fn editor_text(&self) -> &str {
        &self.editor_text
    }

    pub fn is_sync_suspended(&self) -> bool {
        self.sync_suspended
    }

    /// Registers a listener for document changes.
    pub fn subscribe(&mut self, listener: impl Fn(&DocumentEvent) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&self, event: DocumentEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    // =========================================================================
    // Editor Side
    // =========================================================================

    /// Replaces the editor text as a user edit would.
    ///
    /// Rebuilds the entry table unless synchronization is suspended, in which
    /// case only the text is stored.
    pub fn set_editor_text(&mut self, text: impl Into<String>) {
        self.editor_text = text.into();
        if self.sync_suspended {
            return;
        }

        let previous = self.previous_by_line();
        self.entries = rebuild_list(&self.editor_text, &previous);
        debug!("Rebuilt {} subtitle entries from editor text", self.entries.len());
        self.emit(DocumentEvent::EntriesRebuilt {
            count: self.entries.len(),
        });
    }

    /// Entries whose times carry over to the non-blank lines of the new text.
    ///
    /// Rows with empty content render as blank lines, which the rebuild drops.
    /// When such rows exist, times follow the raw line number instead, so the
    /// rows after a blank one keep their own times.
    fn previous_by_line(&self) -> Vec<TimedEntry> {
        let has_blank_rows = self
            .entries
            .iter()
            .any(|entry| to_editor_line(entry).trim().is_empty());
        if !has_blank_rows {
            return self.entries.clone();
        }

        self.editor_text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map_while(|(line_no, _)| self.entries.get(line_no).cloned())
            .collect()
    }

    /// Runs `f` with editor-to-table synchronization suspended.
    ///
    /// Scopes nest; the previous state is restored on exit.
    pub fn without_sync<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = std::mem::replace(&mut self.sync_suspended, true);
        let result = f(self);
        self.sync_suspended = previous;
        result
    }

    /// Renders the editor text from the entry table, one line per entry.
    pub fn render_editor_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| to_editor_line(entry) + "\n")
            .collect()
    }

    fn refresh_editor_text(&mut self) {
        let text = self.render_editor_text();
        self.without_sync(|doc| doc.set_editor_text(text));
        self.emit(DocumentEvent::EditorTextReplaced);
    }

    // =========================================================================
    // Table Side
    // =========================================================================

    fn check_index(&self, index: usize) -> CoreResult<()> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(CoreError::EntryOutOfRange(index))
        }
    }

    /// Insert position check: any existing row, or 0 on an empty table.
    fn check_insert_index(&self, index: usize) -> CoreResult<()> {
        if self.entries.is_empty() && index == 0 {
            Ok(())
        } else {
            self.check_index(index)
        }
    }

    fn entry_changed(&mut self, index: usize) {
        self.emit(DocumentEvent::EntryChanged { index });
        self.refresh_editor_text();
    }

    fn table_rebuilt(&mut self) {
        self.emit(DocumentEvent::EntriesRebuilt {
            count: self.entries.len(),
        });
        self.refresh_editor_text();
    }

    /// Sets the start time of an entry to a playback position.
    pub fn mark_start(&mut self, index: usize, seconds: TimeSec) -> CoreResult<()> {
        self.check_index(index)?;
        self.entries[index].start_time = Some(format_time_with_millis(seconds));
        self.entry_changed(index);
        Ok(())
    }

    /// Sets the end time of an entry to a playback position.
    pub fn mark_end(&mut self, index: usize, seconds: TimeSec) -> CoreResult<()> {
        self.check_index(index)?;
        self.entries[index].end_time = Some(format_time_with_millis(seconds));
        self.entry_changed(index);
        Ok(())
    }

    /// Replaces the caption text of an entry, keeping its times.
    pub fn set_content(&mut self, index: usize, content: impl Into<String>) -> CoreResult<()> {
        self.check_index(index)?;
        self.entries[index].content = content.into();
        self.entry_changed(index);
        Ok(())
    }

    /// Inserts a placeholder row at `index`, shifting the row there down.
    pub fn insert_above(&mut self, index: usize) -> CoreResult<()> {
        self.check_insert_index(index)?;
        self.entries.insert(index, TimedEntry::new(PLACEHOLDER_TEXT));
        self.table_rebuilt();
        Ok(())
    }

    /// Inserts an empty row right after `index`.
    pub fn insert_below(&mut self, index: usize) -> CoreResult<()> {
        self.check_insert_index(index)?;
        let at = (index + 1).min(self.entries.len());
        self.entries.insert(at, TimedEntry::new(""));
        self.table_rebuilt();
        Ok(())
    }

    /// Removes the row at `index`.
    pub fn delete_row(&mut self, index: usize) -> CoreResult<()> {
        self.check_index(index)?;
        self.entries.remove(index);
        self.table_rebuilt();
        Ok(())
    }

    /// Removes every row after `index`, keeping `index` itself.
    pub fn delete_rows_below(&mut self, index: usize) -> CoreResult<()> {
        self.check_index(index)?;
        if index + 1 < self.entries.len() {
            self.entries.truncate(index + 1);
            self.table_rebuilt();
        }
        Ok(())
    }

    /// Replaces the whole table, e.g. after an SRT import.
    pub fn replace_entries(&mut self, entries: Vec<TimedEntry>) {
        self.entries = entries;
        self.table_rebuilt();
    }

    // =========================================================================
    // File Actions
    // =========================================================================

    /// Imports an SRT file. The document is unchanged when reading fails.
    pub fn import_srt(&mut self, path: &Path) -> CoreResult<()> {
        let entries = import_srt_file(path)?;
        self.replace_entries(entries);
        Ok(())
    }

    /// Imports a plain-text file as editor text. No previous times survive.
    pub fn import_text(&mut self, path: &Path) -> CoreResult<()> {
        let (text, entries) = import_text_file(path)?;
        self.entries = entries;
        self.without_sync(|doc| doc.set_editor_text(text));
        self.emit(DocumentEvent::EntriesRebuilt {
            count: self.entries.len(),
        });
        self.emit(DocumentEvent::EditorTextReplaced);
        Ok(())
    }

    /// Exports the table as SRT. Nothing is written when an entry is incomplete.
    pub fn export_srt(&self, path: &Path) -> CoreResult<()> {
        export_srt_file(path, &self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn recorder(doc: &mut SubtitleDocument) -> Arc<Mutex<Vec<DocumentEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        doc.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        events
    }

    fn doc_with(text: &str) -> SubtitleDocument {
        let mut doc = SubtitleDocument::new();
        doc.set_editor_text(text);
        doc
    }

    #[test]
    fn test_user_edit_rebuilds_entries() {
        let mut doc = SubtitleDocument::new();
        let events = recorder(&mut doc);

        doc.set_editor_text("a\n\nb\n");

        assert_eq!(doc.entries().len(), 2);
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &[DocumentEvent::EntriesRebuilt { count: 2 }]
        );
    }

    #[test]
    fn test_mark_times_regenerates_text() {
        let mut doc = doc_with("Hello\nWorld");

        doc.mark_start(0, 5.909).unwrap();
        doc.mark_end(0, 8.909).unwrap();
        doc.mark_end(1, 12.0).unwrap();

        assert_eq!(
            doc.editor_text(),
            "00:00:05,909 -> 00:00:08,909 | Hello\n-> 00:00:12,000 | World\n"
        );
    }

    #[test]
    fn test_times_survive_text_edit() {
        let mut doc = doc_with("Hello\nWorld");
        doc.mark_start(0, 1.0).unwrap();
        doc.mark_end(0, 2.0).unwrap();

        doc.set_editor_text("Hello there\nWorld\nNew line");

        let entries = doc.entries();
        assert_eq!(entries[0].content, "Hello there");
        assert_eq!(entries[0].start_time.as_deref(), Some("00:00:01,000"));
        assert_eq!(entries[2], TimedEntry::new("New line"));
    }

    #[test]
    fn test_programmatic_update_does_not_rebuild() {
        let mut doc = doc_with("Hello");
        let events = recorder(&mut doc);

        doc.set_content(0, "Changed").unwrap();

        assert_eq!(doc.editor_text(), "Changed\n");
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &[
                DocumentEvent::EntryChanged { index: 0 },
                DocumentEvent::EditorTextReplaced,
            ]
        );
    }

    #[test]
    fn test_without_sync_nests_and_restores() {
        let mut doc = doc_with("a");

        doc.without_sync(|outer| {
            outer.without_sync(|inner| inner.set_editor_text("x\ny"));
            assert!(outer.is_sync_suspended());
        });

        assert!(!doc.is_sync_suspended());
        assert_eq!(doc.editor_text(), "x\ny");
        assert_eq!(doc.entries().len(), 1);
    }

    #[test]
    fn test_insert_above_and_below() {
        let mut doc = doc_with("a\nb");

        doc.insert_above(1).unwrap();
        doc.insert_below(0).unwrap();

        let contents: Vec<&str> = doc.entries().iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, ["a", "", PLACEHOLDER_TEXT, "b"]);
    }

    #[test]
    fn test_times_survive_edit_after_insert_below() {
        let mut doc = doc_with("A\nB");
        doc.mark_start(1, 3.0).unwrap();
        doc.mark_end(1, 4.0).unwrap();
        doc.insert_below(0).unwrap();
        assert_eq!(doc.editor_text(), "A\n\n00:00:03,000 -> 00:00:04,000 | B\n");

        let text = doc.editor_text().to_string();
        doc.set_editor_text(text);

        assert_eq!(doc.entries().len(), 2);
        assert_eq!(doc.entries()[1].content, "B");
        assert_eq!(doc.entries()[1].start_time.as_deref(), Some("00:00:03,000"));
        assert_eq!(doc.entries()[1].end_time.as_deref(), Some("00:00:04,000"));
    }

    #[test]
    fn test_typing_into_inserted_row_keeps_neighbour_times() {
        let mut doc = doc_with("A\nB");
        doc.mark_start(1, 3.0).unwrap();
        doc.insert_below(0).unwrap();

        doc.set_editor_text("A\nnew line\n00:00:03,000 -> | B\n");

        let entries = doc.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], TimedEntry::new("new line"));
        assert_eq!(entries[2].start_time.as_deref(), Some("00:00:03,000"));
    }

    #[test]
    fn test_insert_into_empty_document() {
        let mut doc = SubtitleDocument::new();
        doc.insert_below(0).unwrap();
        assert_eq!(doc.entries().len(), 1);
        assert!(matches!(doc.insert_above(5), Err(CoreError::EntryOutOfRange(5))));
    }

    #[test]
    fn test_delete_row_and_rows_below() {
        let mut doc = doc_with("a\nb\nc\nd");

        doc.delete_row(1).unwrap();
        assert_eq!(doc.editor_text(), "a\nc\nd\n");

        doc.delete_rows_below(0).unwrap();
        assert_eq!(doc.editor_text(), "a\n");

        doc.delete_rows_below(0).unwrap();
        assert_eq!(doc.entries().len(), 1);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut doc = doc_with("a");
        assert!(matches!(doc.mark_start(3, 1.0), Err(CoreError::EntryOutOfRange(3))));
        assert!(matches!(doc.delete_row(1), Err(CoreError::EntryOutOfRange(1))));
        assert_eq!(doc.entries().len(), 1);
    }

    #[test]
    fn test_import_srt_flattens_multiline_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.srt");
        std::fs::write(&path, "1\n00:00:01,000 --> 00:00:02,000\nTwo\nlines\n").unwrap();
        let mut doc = SubtitleDocument::new();

        doc.import_srt(&path).unwrap();

        assert_eq!(doc.entries()[0].content, "Two\nlines");
        assert_eq!(doc.editor_text(), "00:00:01,000 -> 00:00:02,000 | Two lines\n");
    }

    #[test]
    fn test_failed_import_leaves_document_untouched() {
        let dir = TempDir::new().unwrap();
        let mut doc = doc_with("keep me");

        let result = doc.import_srt(&dir.path().join("missing.srt"));

        assert!(matches!(result, Err(CoreError::ImportIoFailure { .. })));
        assert_eq!(doc.editor_text(), "keep me");
    }

    #[test]
    fn test_import_text_discards_previous_times() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.txt");
        std::fs::write(&path, "first\nsecond\n").unwrap();
        let mut doc = doc_with("old");
        doc.mark_start(0, 3.0).unwrap();

        doc.import_text(&path).unwrap();

        assert_eq!(doc.editor_text(), "first\nsecond\n");
        assert!(doc.entries().iter().all(|e| e.start_time.is_none()));
    }

    #[test]
    fn test_export_srt_roundtrip_through_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.srt");
        let mut doc = doc_with("00:00:01,000 -> 00:00:02,000 | Hello");

        doc.export_srt(&path).unwrap();
        let mut reloaded = SubtitleDocument::new();
        reloaded.import_srt(&path).unwrap();

        assert_eq!(reloaded.entries(), doc.entries());
    }
}
