//! Run Progress Streaming
//!
//! Advisory progress for the fetch and summarize stages. Counters are
//! atomics shared by concurrently admitted tasks; events go out on a tokio
//! broadcast channel for whichever front-end is listening. Nothing here
//! feeds back into control flow.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use tokio::sync::broadcast;

/// Pipeline stage reporting progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Summarize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Summarize => write!(f, "summarize"),
        }
    }
}

/// Progress event types
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    StageStarted {
        stage: Stage,
        total: usize,
    },
    /// One item finished successfully
    ItemCompleted {
        stage: Stage,
        index: usize,
        item: String,
        completed: usize,
        total: usize,
        bytes: u64,
    },
    /// One item failed; the stage continues
    ItemFailed {
        stage: Stage,
        item: String,
        error: String,
    },
    StageFinished {
        stage: Stage,
        completed: usize,
        failed: usize,
        elapsed_ms: u64,
    },
}

/// Point-in-time counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub bytes: u64,
}

impl ProgressSnapshot {
    /// Items that have finished either way
    pub fn done(&self) -> usize {
        self.completed + self.failed
    }
}

/// Real-time progress tracker
#[derive(Clone)]
pub struct ProgressTracker {
    sender: broadcast::Sender<ProgressEvent>,
    total: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
    bytes: Arc<AtomicU64>,
    started: Arc<std::sync::Mutex<Option<Instant>>>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            sender,
            total: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicUsize::new(0)),
            failed: Arc::new(AtomicUsize::new(0)),
            bytes: Arc::new(AtomicU64::new(0)),
            started: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    /// Send an event; dropped silently when nobody is subscribed
    #[inline]
    fn emit(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    /// Reset counters and announce a stage
    pub fn start_stage(&self, stage: Stage, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        self.bytes.store(0, Ordering::SeqCst);
        *self
            .started
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Instant::now());

        self.emit(ProgressEvent::StageStarted { stage, total });
    }

    /// Record a success and return the running completed count
    pub fn record_success(&self, stage: Stage, index: usize, item: &str, bytes: u64) -> usize {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.bytes.fetch_add(bytes, Ordering::SeqCst);

        self.emit(ProgressEvent::ItemCompleted {
            stage,
            index,
            item: item.to_string(),
            completed,
            total: self.total.load(Ordering::SeqCst),
            bytes,
        });
        completed
    }

    /// Record a failure
    pub fn record_failure(&self, stage: Stage, item: &str, error: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.emit(ProgressEvent::ItemFailed {
            stage,
            item: item.to_string(),
            error: error.to_string(),
        });
    }

    /// Announce the end of a stage
    pub fn finish_stage(&self, stage: Stage) {
        let elapsed_ms = self
            .started
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .map(|s| s.elapsed().as_millis() as u64)
            .unwrap_or(0);
        let snapshot = self.snapshot();

        self.emit(ProgressEvent::StageFinished {
            stage,
            completed: snapshot.completed,
            failed: snapshot.failed,
            elapsed_ms,
        });
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            bytes: self.bytes.load(Ordering::SeqCst),
        }
    }
}

/// Render a simple progress bar
pub fn render_progress_bar(completed: usize, total: usize, width: usize) -> String {
    if total == 0 {
        return format!("[{}]", " ".repeat(width));
    }

    let progress = (completed as f32 / total as f32).min(1.0);
    let filled = (progress * width as f32) as usize;
    let empty = width.saturating_sub(filled);

    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}
