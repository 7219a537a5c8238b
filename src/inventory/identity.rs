//! Lookups of the invoking operator's account.

use std::path::PathBuf;

/// Source of the local operator's username and home directory.
pub trait Identity: Send + Sync {
    fn username(&self) -> Result<String, String>;

    fn home_dir(&self) -> Result<PathBuf, String>;
}

/// Identity of the user running this process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentity;

impl Identity for SystemIdentity {
    fn username(&self) -> Result<String, String> {
        platform_username().map(|name| strip_domain(&name).to_string())
    }

    fn home_dir(&self) -> Result<PathBuf, String> {
        dirs::home_dir().ok_or_else(|| "unable to find home directory".to_string())
    }
}

/// A fixed identity, for tests and for running on behalf of another account.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    pub username: Option<String>,
    pub home_dir: Option<PathBuf>,
}

impl StaticIdentity {
    pub fn new(username: impl Into<String>, home_dir: impl Into<PathBuf>) -> Self {
        Self {
            username: Some(username.into()),
            home_dir: Some(home_dir.into()),
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }
}

impl Identity for StaticIdentity {
    fn username(&self) -> Result<String, String> {
        self.username
            .as_deref()
            .map(|name| strip_domain(name).to_string())
            .ok_or_else(|| "no active user".to_string())
    }

    fn home_dir(&self) -> Result<PathBuf, String> {
        self.home_dir
            .clone()
            .ok_or_else(|| "no home directory".to_string())
    }
}

/// Drops a Windows-style `DOMAIN\` qualifier from a username.
pub fn strip_domain(username: &str) -> &str {
    match username.split_once('\\') {
        Some((_, user)) => user,
        None => username,
    }
}

#[cfg(unix)]
fn platform_username() -> Result<String, String> {
    use nix::unistd::{Uid, User};

    match User::from_uid(Uid::current()) {
        Ok(Some(user)) => Ok(user.name),
        Ok(None) => Err(format!("no passwd entry for uid {}", Uid::current())),
        Err(e) => Err(format!("failed getting active user: {e}")),
    }
}

#[cfg(not(unix))]
fn platform_username() -> Result<String, String> {
    std::env::var("USERNAME").map_err(|e| format!("failed getting active user: {e}"))
}
