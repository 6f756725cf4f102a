//! Caller-owned task list
//!
//! The presentation layer owns one [`TaskRegistry`], inserts handles on
//! submit and folds delivered [`TaskEvent`]s into it. Workers never touch it.

use std::collections::HashMap;

use super::{EncodeTask, TaskEvent, TaskHandle};
use crate::core::TaskId;

/// Ordered list of encode tasks plus their handles
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Vec<EncodeTask>,
    handles: HashMap<TaskId, TaskHandle>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a submitted task; a row created earlier by its `Submitted` event
    /// is refreshed instead of duplicated.
    pub fn insert(&mut self, handle: TaskHandle) {
        let snapshot = handle.snapshot();
        self.upsert(snapshot);
        self.handles.insert(handle.id().to_string(), handle);
    }

    /// Applies one notification. Returns whether a row changed.
    pub fn apply(&mut self, event: &TaskEvent) -> bool {
        match event {
            TaskEvent::Submitted { task } => {
                if self.get(&task.id).is_some() {
                    return false;
                }
                self.tasks.push(task.clone());
                true
            }
            TaskEvent::Finished { task } => self.upsert(task.clone()),
            TaskEvent::StatusChanged { task_id, status } => self.modify(task_id, |task| {
                task.status = *status;
            }),
            TaskEvent::Progress { task_id, percent } => self.modify(task_id, |task| {
                task.progress_percent = *percent;
            }),
            TaskEvent::CancelRequested { task_id } => self.modify(task_id, |task| {
                task.cancel_requested = true;
            }),
        }
    }

    fn upsert(&mut self, task: EncodeTask) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) if existing.is_done() => return false,
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
        true
    }

    /// Changes a live row; rows already in a terminal state are frozen.
    fn modify(&mut self, task_id: &str, f: impl FnOnce(&mut EncodeTask)) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) if !task.is_done() => {
                f(task);
                true
            }
            _ => false,
        }
    }

    pub fn tasks(&self) -> &[EncodeTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, task_id: &str) -> Option<&EncodeTask> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn handle(&self, task_id: &str) -> Option<&TaskHandle> {
        self.handles.get(task_id)
    }

    /// Requests cancellation of a task by id.
    pub fn cancel(&self, task_id: &str) -> bool {
        self.handles
            .get(task_id)
            .map(TaskHandle::cancel)
            .unwrap_or(false)
    }

    /// Removes completed, failed and cancelled tasks. Returns how many.
    pub fn clear_finished(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !task.is_done());
        let tasks = &self.tasks;
        self.handles
            .retain(|id, _| tasks.iter().any(|task| &task.id == id));
        before - self.tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encoding::TaskStatus;
    use std::path::Path;

    fn task() -> EncodeTask {
        EncodeTask::new(Path::new("/v/in.mp4"), Path::new("/v/output_in.mp4"))
    }

    fn finished(mut task: EncodeTask, status: TaskStatus) -> EncodeTask {
        task.status = status;
        task
    }

    #[test]
    fn test_apply_lifecycle() {
        let mut registry = TaskRegistry::new();
        let task = task();
        let id = task.id.clone();

        assert!(registry.apply(&TaskEvent::Submitted { task: task.clone() }));
        assert!(!registry.apply(&TaskEvent::Submitted { task: task.clone() }));
        registry.apply(&TaskEvent::StatusChanged {
            task_id: id.clone(),
            status: TaskStatus::Running,
        });
        registry.apply(&TaskEvent::Progress {
            task_id: id.clone(),
            percent: 40,
        });
        assert_eq!(registry.get(&id).unwrap().status_text(), "Encoding (40%)");

        let mut done = finished(task, TaskStatus::Completed);
        done.progress_percent = 100;
        registry.apply(&TaskEvent::Finished { task: done });

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_terminal_rows_are_frozen() {
        let mut registry = TaskRegistry::new();
        let task = finished(task(), TaskStatus::Cancelled);
        let id = task.id.clone();
        registry.apply(&TaskEvent::Finished { task });

        let changed = registry.apply(&TaskEvent::Progress {
            task_id: id.clone(),
            percent: 99,
        });

        assert!(!changed);
        assert_eq!(registry.get(&id).unwrap().progress_percent, 0);
    }

    #[test]
    fn test_events_for_unknown_tasks_are_ignored() {
        let mut registry = TaskRegistry::new();
        assert!(!registry.apply(&TaskEvent::CancelRequested {
            task_id: "missing".to_string()
        }));
        assert!(registry.is_empty());
        assert!(!registry.cancel("missing"));
    }

    #[test]
    fn test_clear_finished_keeps_live_tasks() {
        let mut registry = TaskRegistry::new();
        let running = finished(task(), TaskStatus::Running);
        let running_id = running.id.clone();
        for task in [
            running,
            finished(task(), TaskStatus::Completed),
            finished(task(), TaskStatus::Failed),
            finished(task(), TaskStatus::Cancelled),
            task(),
        ] {
            registry.apply(&TaskEvent::Submitted { task });
        }

        let removed = registry.clear_finished();

        assert_eq!(removed, 3);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&running_id).is_some());
    }

    #[tokio::test]
    async fn test_insert_handle_and_cancel_by_id() {
        let engine = crate::core::encoding::EncodingEngine::with_ffmpeg("/nonexistent/ffmpeg");
        let request = crate::core::encoding::EncodeRequest::new(
            "/v/in.mp4",
            "/v/out.mp4",
            "libx264",
            "2000",
        );
        let handle = engine.submit(request).unwrap();
        let id = handle.id().to_string();
        let mut registry = TaskRegistry::new();

        registry.insert(handle.clone());
        let task = handle.wait().await;
        registry.apply(&TaskEvent::Finished { task });

        assert_eq!(registry.len(), 1);
        assert!(registry.handle(&id).is_some());
        assert!(!registry.cancel(&id), "finished tasks ignore cancel");
        assert_eq!(registry.clear_finished(), 1);
        assert!(registry.handle(&id).is_none());
    }
}
