//! Wall-clock accounting of top-level scheduled tasks.

use crate::phase::sanitize_elapsed;

/// The most recently observed top-level task start.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TaskWindow {
    /// Start time reported by the scheduler, in seconds
    start_time: f64,
}

/// Accumulates task durations, pairing begin and end by start time.
///
/// A reentrant scheduler can report the end of a task whose begin was
/// overwritten by a nested task. Matching on the start time keeps those
/// samples from being counted.
#[derive(Debug, Clone, Default)]
pub struct TaskTimeTracker {
    window: TaskWindow,
    total_duration: f64,
}

impl TaskTimeTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// A task is about to run.
    pub fn will_process(&mut self, start_time: f64) {
        self.window.start_time = start_time;
    }

    /// A task finished. Returns `true` when its start matched the window.
    ///
    /// A matched task whose end precedes its start, or whose times are not
    /// finite, contributes zero seconds, as bad phase samples do.
    pub fn did_process(&mut self, start_time: f64, end_time: f64) -> bool {
        if self.window.start_time != start_time {
            tracing::debug!(
                target: "perf::task",
                start_time,
                window_start = self.window.start_time,
                "task end does not match current window"
            );
            return false;
        }

        let duration = sanitize_elapsed(end_time - start_time);
        self.total_duration += duration;
        tracing::trace!(target: "perf::task", duration_s = duration, "task recorded");
        true
    }

    /// Drop the current window so a stale start cannot match.
    pub fn reset_window(&mut self) {
        self.window = TaskWindow::default();
    }

    /// Total duration of all matched tasks, in seconds.
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

}
