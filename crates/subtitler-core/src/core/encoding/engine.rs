//! Encoding Engine
//!
//! Runs every submitted encode in its own tokio task. The worker spawns the
//! encoder, merges its stdout/stderr into one line stream, turns `time=`
//! lines into progress, and classifies the exit. Each task's state lives in a
//! `watch` channel; every mutation is also pushed as a [`TaskEvent`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::{
    parse_progress_millis, progress_percent, EncodeRequest, EncodeTask, EncoderInvocation,
    FfmpegInvocation, TaskStatus,
};
use crate::core::{CoreError, CoreResult, TaskId, TimeMillis};
use crate::events::event_names;

/// Capacity of the merged output line channel
const LINE_CHANNEL_CAPACITY: usize = 256;

/// Longest line forwarded as a unit; longer runs are split at this size
const MAX_LINE_BYTES: usize = 64 * 1024;

// =============================================================================
// Events
// =============================================================================

/// Encode task notification
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TaskEvent {
    /// Task created in `Pending`
    Submitted { task: EncodeTask },
    /// Non-terminal status change
    #[serde(rename_all = "camelCase")]
    StatusChanged { task_id: TaskId, status: TaskStatus },
    /// New progress percentage (not necessarily increasing)
    #[serde(rename_all = "camelCase")]
    Progress { task_id: TaskId, percent: u8 },
    /// Cancellation accepted; the terminal event follows
    #[serde(rename_all = "camelCase")]
    CancelRequested { task_id: TaskId },
    /// Terminal state reached; always the last event of a task
    Finished { task: EncodeTask },
}

impl TaskEvent {
    pub fn task_id(&self) -> &str {
        match self {
            Self::Submitted { task } | Self::Finished { task } => &task.id,
            Self::StatusChanged { task_id, .. }
            | Self::Progress { task_id, .. }
            | Self::CancelRequested { task_id } => task_id,
        }
    }

    /// Event name for the presentation layer
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submitted { .. } => event_names::ENCODE_SUBMITTED,
            Self::StatusChanged { .. } => event_names::ENCODE_STATUS,
            Self::Progress { .. } => event_names::ENCODE_PROGRESS,
            Self::CancelRequested { .. } => event_names::ENCODE_CANCEL_REQUESTED,
            Self::Finished { .. } => event_names::ENCODE_FINISHED,
        }
    }
}

// =============================================================================
// Task Handle
// =============================================================================

struct TaskShared {
    state: watch::Sender<EncodeTask>,
    events: mpsc::UnboundedSender<TaskEvent>,
    cancel: CancellationToken,
}

impl TaskShared {
    /// Mutates the task unless it is terminal.
    ///
    /// `f` returns the event describing its change, or `None` when it changed
    /// nothing. The event is sent while the state is still locked, so the
    /// event order matches the publish order.
    fn update(&self, f: impl FnOnce(&mut EncodeTask) -> Option<TaskEvent>) -> bool {
        self.state.send_if_modified(|task| {
            if task.status.is_terminal() {
                return false;
            }
            match f(task) {
                Some(event) => {
                    let _ = self.events.send(event);
                    true
                }
                None => false,
            }
        })
    }

    fn request_cancel(&self) -> bool {
        let accepted = self.update(|task| {
            if task.cancel_requested {
                return None;
            }
            task.cancel_requested = true;
            Some(TaskEvent::CancelRequested {
                task_id: task.id.clone(),
            })
        });
        if accepted {
            self.cancel.cancel();
        }
        accepted
    }
}

/// Caller-side handle of a submitted task.
#[derive(Clone)]
pub struct TaskHandle {
    id: TaskId,
    state: watch::Receiver<EncodeTask>,
    shared: Arc<TaskShared>,
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle").field("id", &self.id).finish()
    }
}

impl TaskHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Latest published state. Never blocks on the worker.
    pub fn snapshot(&self) -> EncodeTask {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state publish.
    pub fn watch(&self) -> watch::Receiver<EncodeTask> {
        self.state.clone()
    }

    /// Requests cancellation.
    ///
    /// Returns `false` when the task is already terminal or cancellation was
    /// requested before.
    pub fn cancel(&self) -> bool {
        let accepted = self.shared.request_cancel();
        if accepted {
            tracing::info!("Cancellation requested for encode task {}", self.id);
        }
        accepted
    }

    /// Waits for the terminal state.
    pub async fn wait(&self) -> EncodeTask {
        let mut state = self.state.clone();
        let result = state
            .wait_for(|task| task.status.is_terminal())
            .await
            .map(|task| task.clone());
        result.unwrap_or_else(|_| self.snapshot())
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Submits encode tasks and publishes their notifications.
pub struct EncodingEngine {
    invocation: Arc<dyn EncoderInvocation>,
    event_tx: mpsc::UnboundedSender<TaskEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<TaskEvent>>,
}

impl EncodingEngine {
    pub fn new(invocation: Arc<dyn EncoderInvocation>) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            invocation,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Engine driving the given `ffmpeg` binary
    pub fn with_ffmpeg(ffmpeg_path: impl Into<std::path::PathBuf>) -> Self {
        Self::new(Arc::new(FfmpegInvocation::new(ffmpeg_path)))
    }

    /// Takes the event receiver (can only be called once)
    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<TaskEvent>> {
        self.event_rx.take()
    }

    /// Validates the request, creates a `Pending` task and starts its worker.
    ///
    /// Must be called within a tokio runtime. Invalid parameters fail here,
    /// before any process exists; spawn failures surface as a `Failed` task.
    pub fn submit(&self, request: EncodeRequest) -> CoreResult<TaskHandle> {
        request.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CoreError::Internal(format!("No async runtime: {}", e)))?;

        let task = EncodeTask::new(&request.source_path, &request.output_path);
        let id = task.id.clone();
        let (state_tx, state_rx) = watch::channel(task.clone());
        let shared = Arc::new(TaskShared {
            state: state_tx,
            events: self.event_tx.clone(),
            cancel: CancellationToken::new(),
        });

        let _ = self.event_tx.send(TaskEvent::Submitted { task });
        tracing::info!(
            "Submitted encode task {}: {} -> {} ({} @ {}k)",
            id,
            request.source_path.display(),
            request.output_path.display(),
            request.encoder,
            request.bitrate_kbps
        );

        let command = self.invocation.command(&request);
        runtime.spawn(run_task(
            Arc::clone(&shared),
            command,
            request.total_duration_ms,
        ));

        Ok(TaskHandle {
            id,
            state: state_rx,
            shared,
        })
    }

    /// Same as [`TaskHandle::cancel`].
    pub fn cancel(&self, handle: &TaskHandle) -> bool {
        handle.cancel()
    }
}

// =============================================================================
// Worker
// =============================================================================

/// How the encoder process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProcessOutcome {
    /// Exit status; `None` when killed by a signal
    Exited { code: Option<i32> },
    /// Spawning or waiting failed
    Error(String),
}

/// Terminal classification. Cancellation wins over every exit.
pub(crate) fn classify_outcome(
    cancel_requested: bool,
    outcome: &ProcessOutcome,
) -> (TaskStatus, Option<String>) {
    if cancel_requested {
        return (TaskStatus::Cancelled, None);
    }
    match outcome {
        ProcessOutcome::Exited { code: Some(0) } => (TaskStatus::Completed, None),
        ProcessOutcome::Exited { code } => (
            TaskStatus::Failed,
            Some(CoreError::ProcessExitNonzero { code: *code }.to_user_message()),
        ),
        ProcessOutcome::Error(detail) => (TaskStatus::Failed, Some(detail.clone())),
    }
}

async fn run_task(
    shared: Arc<TaskShared>,
    command: CoreResult<Command>,
    total_ms: Option<TimeMillis>,
) {
    shared.update(|task| {
        task.status = TaskStatus::Running;
        Some(TaskEvent::StatusChanged {
            task_id: task.id.clone(),
            status: TaskStatus::Running,
        })
    });

    if shared.cancel.is_cancelled() {
        finish(&shared, ProcessOutcome::Exited { code: None });
        return;
    }

    let spawned = command.and_then(|mut cmd| {
        cmd.spawn()
            .map_err(|e| CoreError::ProcessSpawnFailure(e.to_string()))
    });
    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            finish(&shared, ProcessOutcome::Error(e.to_user_message()));
            return;
        }
    };

    let mut lines = merge_output(&mut child);
    let mut cancelled = false;
    loop {
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => {
                cancelled = true;
                break;
            }
            line = lines.recv() => match line {
                Some(line) => handle_line(&shared, &line, total_ms),
                None => break,
            },
        }
    }

    let exited = if cancelled {
        None
    } else {
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => None,
            status = child.wait() => Some(status),
        }
    };

    let outcome = match exited {
        Some(Ok(status)) => ProcessOutcome::Exited {
            code: status.code(),
        },
        Some(Err(e)) => ProcessOutcome::Error(format!("Failed to wait for encoder: {}", e)),
        None => {
            let _ = child.start_kill();
            match child.wait().await {
                Ok(status) => ProcessOutcome::Exited {
                    code: status.code(),
                },
                Err(e) => ProcessOutcome::Error(format!("Failed to stop encoder: {}", e)),
            }
        }
    };

    finish(&shared, outcome);
}

fn handle_line(shared: &TaskShared, line: &str, total_ms: Option<TimeMillis>) {
    tracing::trace!("encoder: {}", line);

    let Some(elapsed_ms) = parse_progress_millis(line) else {
        return;
    };
    let Some(percent) = total_ms.and_then(|total| progress_percent(elapsed_ms, total)) else {
        return;
    };

    shared.update(|task| {
        if task.status != TaskStatus::Running || task.progress_percent == percent {
            return None;
        }
        task.progress_percent = percent;
        tracing::debug!("Encode task {} at {}%", task.id, percent);
        Some(TaskEvent::Progress {
            task_id: task.id.clone(),
            percent,
        })
    });
}

fn finish(shared: &TaskShared, outcome: ProcessOutcome) {
    shared.update(|task| {
        let (status, detail) = classify_outcome(task.cancel_requested, &outcome);
        task.status = status;
        task.error_detail = detail;
        task.finished_at = Some(chrono::Utc::now());
        if status == TaskStatus::Completed {
            task.progress_percent = 100;
        }

        match status {
            TaskStatus::Failed => tracing::error!(
                "Encode task {} failed: {}",
                task.id,
                task.error_detail.as_deref().unwrap_or("unknown error")
            ),
            _ => tracing::info!("Encode task {} finished: {}", task.id, status),
        }

        Some(TaskEvent::Finished { task: task.clone() })
    });
}

/// Merges the child's stdout and stderr into one line stream.
fn merge_output(child: &mut Child) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(pump_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(pump_lines(stderr, tx));
    }
    rx
}

/// Forwards lines from `reader`. Both `\n` and `\r` end a line, since FFmpeg
/// redraws its stats line with carriage returns. A run without terminator is
/// forwarded in chunks of [`MAX_LINE_BYTES`].
pub(crate) async fn pump_lines<R>(mut reader: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    let mut line = Vec::new();

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        for &byte in &buf[..n] {
            let terminator = byte == b'\n' || byte == b'\r';
            if !terminator {
                line.push(byte);
                if line.len() < MAX_LINE_BYTES {
                    continue;
                }
            }
            if line.is_empty() {
                continue;
            }
            let text = String::from_utf8_lossy(&line).into_owned();
            line.clear();
            if tx.send(text).await.is_err() {
                return;
            }
        }
    }

    if !line.is_empty() {
        let _ = tx.send(String::from_utf8_lossy(&line).into_owned()).await;
    }
}
