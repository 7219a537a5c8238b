use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

/// Script bytes shared read-only by every task.
#[derive(Clone, PartialEq, Eq)]
pub struct ScriptPayload(Arc<[u8]>);

impl ScriptPayload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for ScriptPayload {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ScriptPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptPayload({} bytes)", self.0.len())
    }
}

/// Which remote output streams get copied to the local process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputStreams {
    pub stdout: bool,
    pub stderr: bool,
}

impl OutputStreams {
    pub fn discard() -> Self {
        Self::default()
    }

    pub fn any(&self) -> bool {
        self.stdout || self.stderr
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Trust whatever key the server presents.
    #[default]
    AcceptAny,
    /// Require a matching entry in the operator's known_hosts file.
    KnownHosts,
}

/// Execution-wide settings for one deployment run.
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    pub output: OutputStreams,
    pub max_concurrency: Option<usize>,
    pub task_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub host_keys: HostKeyPolicy,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            output: OutputStreams::discard(),
            max_concurrency: None,
            task_timeout: None,
            connect_timeout: Duration::from_secs(30),
            host_keys: HostKeyPolicy::AcceptAny,
        }
    }
}

/// Lifecycle status of a single deployment task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    Starting,
    Aborted(String),
    Errored(String),
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Starting => write!(f, "Starting"),
            TaskStatus::Aborted(reason) => write!(f, "Aborted: {reason}"),
            TaskStatus::Errored(reason) => write!(f, "Errored: {reason}"),
            TaskStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// Terminal result of one task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub task_id: usize,
    pub user: String,
    pub host: String,
    pub status: TaskStatus,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    pub total_targets: usize,
    pub completed: usize,
    pub errored: usize,
    pub aborted: usize,
    pub outcomes: Vec<TaskOutcome>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl DeploymentReport {
    pub fn new(total_targets: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            total_targets,
            completed: 0,
            errored: 0,
            aborted: 0,
            outcomes: Vec::with_capacity(total_targets),
            started_at,
            completed_at: started_at,
        }
    }

    pub fn record(&mut self, outcome: TaskOutcome) {
        match outcome.status {
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::Errored(_) => self.errored += 1,
            TaskStatus::Aborted(_) => self.aborted += 1,
            TaskStatus::Starting => {}
        }
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.outcomes.sort_by_key(|o| o.task_id);
        self.completed_at = Utc::now();
    }

    pub fn failed(&self) -> usize {
        self.errored + self.aborted
    }

    pub fn outcome(&self, task_id: usize) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.task_id == task_id)
    }

    /// Pretty-printed JSON form written by `--report`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(task_id: usize, status: TaskStatus) -> TaskOutcome {
        TaskOutcome {
            task_id,
            user: "bob".to_string(),
            host: format!("h{task_id}:22"),
            status,
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TaskStatus::Starting.to_string(), "Starting");
        assert_eq!(TaskStatus::Completed.to_string(), "Completed");
        assert_eq!(
            TaskStatus::Aborted("no key".to_string()).to_string(),
            "Aborted: no key"
        );
        assert_eq!(
            TaskStatus::Errored("refused".to_string()).to_string(),
            "Errored: refused"
        );
    }

    #[test]
    fn test_report_counts_and_order() {
        let mut report = DeploymentReport::new(3, Utc::now());
        report.record(outcome(2, TaskStatus::Errored("x".into())));
        report.record(outcome(0, TaskStatus::Completed));
        report.record(outcome(1, TaskStatus::Aborted("y".into())));
        report.finish();

        assert_eq!(report.completed, 1);
        assert_eq!(report.errored, 1);
        assert_eq!(report.aborted, 1);
        assert_eq!(report.failed(), 2);
        let ids: Vec<_> = report.outcomes.iter().map(|o| o.task_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(report.completed_at >= report.started_at);
    }

    #[test]
    fn test_script_payload_shares_bytes() {
        let script = ScriptPayload::new(b"echo hi\n".to_vec());
        let clone = script.clone();

        assert_eq!(&*clone, b"echo hi\n");
        assert_eq!(script.len(), 8);
        assert_eq!(format!("{script:?}"), "ScriptPayload(8 bytes)");
    }

    #[test]
    fn test_report_json() {
        let mut report = DeploymentReport::new(2, Utc::now());
        report.record(outcome(1, TaskStatus::Errored("refused".into())));
        report.record(outcome(0, TaskStatus::Completed));
        report.finish();

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["total_targets"], 2);
        assert_eq!(json["errored"], 1);
        assert_eq!(json["outcomes"][0]["status"], "Completed");
        assert_eq!(json["outcomes"][1]["status"]["Errored"], "refused");
        assert_eq!(json["outcomes"][1]["host"], "h1:22");
        assert_eq!(json["outcomes"][1]["elapsed"], 5);
    }
}
