use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("ssh: {0}")]
    Ssh(#[from] russh::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to authenticate as {user} using {method}")]
    AuthRejected { user: String, method: String },

    #[error("timed out connecting to {host}")]
    ConnectTimeout { host: String },

    #[error("remote shell exited with status {0}")]
    ExitStatus(u32),

    #[error("remote shell killed by signal {0}")]
    ExitSignal(String),

    #[error("remote shell exited without exit status")]
    MissingExitStatus,

    #[error("{0}")]
    Other(String),
}
