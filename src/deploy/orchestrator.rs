use crate::auth::{self, Credential};
use crate::deploy::{ExecError, RemoteExecutor, StatusReporter, TaskError, TracingReporter};
use crate::inventory::{self, Identity, SystemIdentity};
use crate::transport::Transport;
use crate::types::*;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Fans one script out to every target, one independent task per target.
///
/// A task's failure is reported through the [`StatusReporter`] and counted in
/// the returned [`DeploymentReport`]; it never affects other tasks or the
/// outcome of [`DeploymentOrchestrator::run`] itself.
pub struct DeploymentOrchestrator<T: Transport> {
    executor: Arc<RemoteExecutor<T>>,
    identity: Arc<dyn Identity>,
    reporter: Arc<dyn StatusReporter>,
    config: DeploymentConfig,
}

impl<T: Transport> DeploymentOrchestrator<T> {
    pub fn new(transport: T, config: DeploymentConfig) -> Self {
        Self {
            executor: Arc::new(RemoteExecutor::new(transport, config.output)),
            identity: Arc::new(SystemIdentity),
            reporter: Arc::new(TracingReporter),
            config,
        }
    }

    pub fn with_identity(mut self, identity: Arc<dyn Identity>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn StatusReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub async fn run(
        &self,
        targets: Vec<TargetConfig>,
        script: ScriptPayload,
        cancel: CancellationToken,
    ) -> DeploymentReport {
        let mut report = DeploymentReport::new(targets.len(), Utc::now());
        let limiter = self
            .config
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        info!(
            "Deploying {} byte script to {} targets",
            script.len(),
            targets.len()
        );

        let mut tasks = JoinSet::new();
        for (id, target) in targets.into_iter().enumerate() {
            let task = DeploymentTask {
                id,
                target,
                script: script.clone(),
                executor: self.executor.clone(),
                identity: self.identity.clone(),
                reporter: self.reporter.clone(),
                limiter: limiter.clone(),
                task_timeout: self.config.task_timeout,
                cancel: cancel.clone(),
            };
            tasks.spawn(task.run());
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    error!("Deployment task did not finish: {}", e);
                    report.errored += 1;
                }
            }
        }

        report.finish();
        debug!(
            "All tasks finished: {} completed, {} errored, {} aborted",
            report.completed, report.errored, report.aborted
        );
        report
    }
}

/// Execution context for one target. Lives only as long as its attempt.
struct DeploymentTask<T: Transport> {
    id: usize,
    target: TargetConfig,
    script: ScriptPayload,
    executor: Arc<RemoteExecutor<T>>,
    identity: Arc<dyn Identity>,
    reporter: Arc<dyn StatusReporter>,
    limiter: Option<Arc<Semaphore>>,
    task_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl<T: Transport> DeploymentTask<T> {
    async fn run(mut self) -> TaskOutcome {
        let started = Instant::now();
        let status = self.execute().await;
        self.reporter.report(self.id, &self.target, &status);

        TaskOutcome {
            task_id: self.id,
            user: self.target.user,
            host: self.target.host,
            status,
            elapsed: started.elapsed(),
        }
    }

    async fn execute(&mut self) -> TaskStatus {
        if let Err(e) = inventory::preprocess(&mut self.target, self.identity.as_ref()) {
            return TaskStatus::Aborted(TaskError::from(e).to_string());
        }

        let credential = match auth::resolve(&self.target) {
            Ok(credential) => credential,
            Err(e) => return TaskStatus::Aborted(TaskError::from(e).to_string()),
        };

        let _permit = match self.acquire_slot().await {
            Ok(permit) => permit,
            Err(e) => return TaskStatus::Aborted(e.to_string()),
        };

        self.reporter
            .report(self.id, &self.target, &TaskStatus::Starting);

        match self.deploy(&credential).await {
            Ok(()) => TaskStatus::Completed,
            Err(e) => TaskStatus::Errored(e.to_string()),
        }
    }

    /// Waits for a concurrency slot, if the run is limited.
    async fn acquire_slot(&self) -> Result<Option<OwnedSemaphorePermit>, TaskError> {
        if self.cancel.is_cancelled() {
            return Err(TaskError::Cancelled);
        }

        let Some(limiter) = self.limiter.clone() else {
            return Ok(None);
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TaskError::Cancelled),
            permit = limiter.acquire_owned() => permit.map(Some).map_err(|_| TaskError::Cancelled),
        }
    }

    /// Runs the executor under the task deadline and the run-wide cancellation.
    /// Either one stops the executor, which still closes what it opened.
    async fn deploy(&self, credential: &Credential) -> Result<(), TaskError> {
        let stop = self.cancel.child_token();
        let execution = self
            .executor
            .run(&self.target.host, credential, &self.script, &stop);

        let result = match self.task_timeout {
            Some(timeout) => {
                tokio::pin!(execution);
                match tokio::time::timeout(timeout, &mut execution).await {
                    Ok(result) => result,
                    Err(_) => {
                        stop.cancel();
                        if let Err(e) = execution.await {
                            debug!("Task #{} stopped after deadline: {}", self.id, e);
                        }
                        return Err(TaskError::Timeout { timeout });
                    }
                }
            }
            None => execution.await,
        };

        result.map_err(|e| match e {
            ExecError::Interrupted => TaskError::Cancelled,
            e => TaskError::Exec(e),
        })
    }
}
