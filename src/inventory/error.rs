use std::path::PathBuf;
use thiserror::Error;

/// Failures loading the target list or script. These abort the whole run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid target list: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("target #{index} has no host")]
    EmptyHost { index: usize },
}

/// Failures normalizing a single target before authentication.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("failed resolving username: {reason}")]
    IdentityResolutionFailed { reason: String },

    #[error("failed expanding ~ to home dir: {reason}")]
    HomeResolutionFailed { reason: String },
}
