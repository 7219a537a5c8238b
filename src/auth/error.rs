use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("target config requires a username")]
    MissingUsername,

    #[error("unknown authentication method {method}")]
    UnsupportedAuthMethod { method: String },

    #[error("failed reading key {path}: {source}")]
    KeyReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed parsing key {path}: {reason}")]
    KeyParseError { path: PathBuf, reason: String },
}
