//! Console progress renderer
//!
//! Listens to [`ProgressEvent`]s and redraws one status line on stderr.

use console::{Term, style};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::progress::{ProgressEvent, ProgressTracker, render_progress_bar};

const BAR_WIDTH: usize = 30;

pub struct ConsoleRenderer {
    tracker: ProgressTracker,
}

impl ConsoleRenderer {
    pub fn new(tracker: ProgressTracker) -> Self {
        Self { tracker }
    }

    /// Render events until the task is aborted or every sender is gone
    pub fn spawn(self) -> JoinHandle<()> {
        let mut events = self.tracker.subscribe();
        drop(self.tracker);

        tokio::spawn(async move {
            let term = Term::stderr();
            loop {
                match events.recv().await {
                    Ok(event) => draw(&term, &event),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

fn draw(term: &Term, event: &ProgressEvent) {
    let Some(line) = format_event(event) else {
        return;
    };

    let _ = term.clear_line();
    match event {
        ProgressEvent::ItemCompleted { .. } if term.is_term() => {
            let _ = term.write_str(&line);
        }
        _ => {
            let _ = term.write_line(&line);
        }
    }
}

/// One display line for an event
pub fn format_event(event: &ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::StageStarted { stage, total } => Some(format!(
            "{} {} {} items",
            style("ℹ").blue(),
            style(stage).bold(),
            total
        )),
        ProgressEvent::ItemCompleted {
            stage,
            completed,
            total,
            item,
            ..
        } => Some(format!(
            "{} {} {}/{} {}",
            stage,
            render_progress_bar(*completed, *total, BAR_WIDTH),
            completed,
            total,
            style(item).dim()
        )),
        ProgressEvent::ItemFailed { stage, item, error } => Some(format!(
            "{} {} {}: {}",
            style("⚠").yellow(),
            stage,
            item,
            error
        )),
        ProgressEvent::StageFinished {
            stage,
            completed,
            failed,
            elapsed_ms,
        } => Some(format!(
            "{} {} done: {} ok, {} failed ({:.1}s)",
            style("✓").green(),
            stage,
            completed,
            failed,
            *elapsed_ms as f64 / 1000.0
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Stage;

    #[test]
    fn test_format_item_completed() {
        console::set_colors_enabled(false);
        let line = format_event(&ProgressEvent::ItemCompleted {
            stage: Stage::Fetch,
            index: 3,
            item: "src/lib.rs".into(),
            completed: 5,
            total: 10,
            bytes: 120,
        })
        .unwrap();

        assert!(line.starts_with("fetch ["));
        assert!(line.contains("5/10 src/lib.rs"));
    }

    #[test]
    fn test_format_stage_finished() {
        console::set_colors_enabled(false);
        let line = format_event(&ProgressEvent::StageFinished {
            stage: Stage::Summarize,
            completed: 3,
            failed: 1,
            elapsed_ms: 2500,
        })
        .unwrap();
        assert_eq!(line, "✓ summarize done: 3 ok, 1 failed (2.5s)");
    }
}
