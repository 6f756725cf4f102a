//! Encode task state

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{new_task_id, TaskId};

/// Encode task status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Created, worker not started yet
    #[default]
    Pending,
    /// Encoder process running
    Running,
    /// Encoder exited with code 0
    Completed,
    /// Spawn failure or nonzero exit
    Failed,
    /// Cancelled by the user
    Cancelled,
}

impl TaskStatus {
    /// Terminal states never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Encoding",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One background encode job, as published to observers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeTask {
    /// Unique task ID
    pub id: TaskId,
    /// Display label; the output path
    pub source_label: String,
    /// Input media file
    pub source_path: PathBuf,
    pub status: TaskStatus,
    /// 0..=100
    pub progress_percent: u8,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_detail: Option<String>,
    pub cancel_requested: bool,
}

impl EncodeTask {
    /// Creates a pending task for `source_path` writing to `output_path`.
    pub fn new(source_path: &Path, output_path: &Path) -> Self {
        Self {
            id: new_task_id(),
            source_label: output_path.display().to_string(),
            source_path: source_path.to_path_buf(),
            status: TaskStatus::Pending,
            progress_percent: 0,
            started_at: Utc::now(),
            finished_at: None,
            error_detail: None,
            cancel_requested: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TaskStatus::Running
    }

    pub fn is_done(&self) -> bool {
        self.status.is_terminal()
    }

    /// Status column text, e.g. `Encoding (42%)` or `Failed - <detail>`.
    pub fn status_text(&self) -> String {
        match (self.status, self.error_detail.as_deref()) {
            (TaskStatus::Running, _) => {
                format!("{} ({}%)", self.status.label(), self.progress_percent)
            }
            (TaskStatus::Failed, Some(detail)) => format!("{} - {}", self.status.label(), detail),
            (status, _) => status.label().to_string(),
        }
    }

    /// File name of the output, for compact listings.
    pub fn output_file_name(&self) -> String {
        Path::new(&self.source_label)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source_label.clone())
    }

    /// Local wall-clock start time (`HH:MM:SS`).
    pub fn started_clock(&self) -> String {
        self.started_at.with_timezone(&Local).format("%H:%M:%S").to_string()
    }

    /// Local wall-clock finish time (`HH:MM:SS`), empty while unfinished.
    pub fn finished_clock(&self) -> String {
        self.finished_at
            .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> EncodeTask {
        EncodeTask::new(Path::new("/videos/in.mp4"), Path::new("/videos/output_in.mp4"))
    }

    #[test]
    fn test_new_task_is_pending() {
        let task = task();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress_percent, 0);
        assert_eq!(task.source_label, "/videos/output_in.mp4");
        assert!(!task.is_done());
        assert!(task.finished_clock().is_empty());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_text() {
        let mut task = task();
        assert_eq!(task.status_text(), "Pending");

        task.status = TaskStatus::Running;
        task.progress_percent = 42;
        assert_eq!(task.status_text(), "Encoding (42%)");

        task.status = TaskStatus::Failed;
        assert_eq!(task.status_text(), "Failed");
        task.error_detail = Some("Encoder exited with code 1".to_string());
        assert_eq!(task.status_text(), "Failed - Encoder exited with code 1");

        task.status = TaskStatus::Cancelled;
        assert_eq!(task.status_text(), "Cancelled");
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(task().output_file_name(), "output_in.mp4");
    }

    #[test]
    fn test_task_serialization() {
        let json = serde_json::to_value(task()).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["progressPercent"], 0);
        assert_eq!(json["cancelRequested"], false);
    }
}
