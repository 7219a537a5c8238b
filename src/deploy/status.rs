//! Per-task status lines.
//!
//! Every lifecycle transition produces one line of the form
//! `<status> task #<index> (<user>@<host>)` so that interleaved output from
//! concurrent tasks can be traced back to its target.

use crate::types::{TargetConfig, TaskStatus};
use std::sync::Mutex;
use tracing::{info, warn};

pub trait StatusReporter: Send + Sync {
    fn report(&self, task_id: usize, target: &TargetConfig, status: &TaskStatus);
}

pub fn status_line(task_id: usize, target: &TargetConfig, status: &TaskStatus) -> String {
    format!("{status} task #{task_id} ({}@{})", target.user, target.host)
}

/// Writes status lines through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl StatusReporter for TracingReporter {
    fn report(&self, task_id: usize, target: &TargetConfig, status: &TaskStatus) {
        let line = status_line(task_id, target, status);
        match status {
            TaskStatus::Starting | TaskStatus::Completed => {
                info!(task = task_id, user = %target.user, host = %target.host, "{line}")
            }
            TaskStatus::Aborted(_) | TaskStatus::Errored(_) => {
                warn!(task = task_id, user = %target.user, host = %target.host, "{line}")
            }
        }
    }
}

/// Keeps status lines in memory, in the order they were reported.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<(usize, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.iter().map(|(_, line)| line.clone()).collect())
            .unwrap_or_default()
    }

    pub fn lines_for(&self, task_id: usize) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| {
                lines
                    .iter()
                    .filter(|(id, _)| *id == task_id)
                    .map(|(_, line)| line.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl StatusReporter for MemoryReporter {
    fn report(&self, task_id: usize, target: &TargetConfig, status: &TaskStatus) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((task_id, status_line(task_id, target, status)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuthConfig;

    #[test]
    fn test_status_line_format() {
        let target = TargetConfig::new("bob", "h1:22", AuthConfig::password("pw"));

        assert_eq!(
            status_line(0, &target, &TaskStatus::Starting),
            "Starting task #0 (bob@h1:22)"
        );
        assert_eq!(
            status_line(7, &target, &TaskStatus::Errored("boom".to_string())),
            "Errored: boom task #7 (bob@h1:22)"
        );
    }

    #[test]
    fn test_memory_reporter_groups_by_task() {
        let reporter = MemoryReporter::new();
        let a = TargetConfig::new("bob", "a:22", AuthConfig::password(""));
        let b = TargetConfig::new("eve", "b:22", AuthConfig::password(""));

        reporter.report(0, &a, &TaskStatus::Starting);
        reporter.report(1, &b, &TaskStatus::Aborted("nope".to_string()));
        reporter.report(0, &a, &TaskStatus::Completed);

        assert_eq!(reporter.lines().len(), 3);
        assert_eq!(
            reporter.lines_for(0),
            vec!["Starting task #0 (bob@a:22)", "Completed task #0 (bob@a:22)"]
        );
    }
}
