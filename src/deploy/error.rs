use crate::auth::AuthError;
use crate::inventory::PreprocessError;
use crate::transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// A failed step while running the script on one host.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to dial target: {0}")]
    DialFailed(#[source] TransportError),

    #[error("failed to start session: {0}")]
    SessionFailed(#[source] TransportError),

    #[error("failed setting up stdin: {0}")]
    StdinSetupFailed(#[source] TransportError),

    #[error("error starting remote shell: {0}")]
    ShellStartFailed(#[source] TransportError),

    #[error("error writing script: {0}")]
    ScriptWriteFailed(#[source] TransportError),

    #[error("error closing session stdin: {0}")]
    StdinCloseFailed(#[source] TransportError),

    #[error("error during shell session: {0}")]
    SessionWaitFailed(#[source] TransportError),

    /// Stopped from outside before the run finished.
    #[error("deployment interrupted")]
    Interrupted,
}

/// Anything that ends a single task early. Never escapes the task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("deployment timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("deployment cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ExecError>;
