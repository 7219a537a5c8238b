use crate::types::{DeploymentConfig, HostKeyPolicy, OutputStreams};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Run one shell script on many hosts over SSH
#[derive(Debug, Parser)]
#[command(name = "shell-fanout")]
#[command(about = "Run a shell script on every target host concurrently over SSH")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct ShellFanoutCli {
    /// Path to the file with JSON-formatted targets
    #[arg(long, value_name = "FILE", default_value = "target.json")]
    pub target: PathBuf,

    /// Path to the shell script file
    #[arg(long, value_name = "FILE", default_value = "script.sh")]
    pub script: PathBuf,

    /// Pipe remote shell stdout to local stdout
    #[arg(long)]
    pub stdout: bool,

    /// Pipe remote shell stderr to local stderr
    #[arg(long)]
    pub stderr: bool,

    /// Maximum number of hosts deployed to at once (unbounded if unset)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_concurrency: Option<u64>,

    /// Per-host deadline in seconds (none if unset)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Seconds allowed for connecting and authenticating
    #[arg(long, value_name = "SECS", default_value = "30")]
    pub connect_timeout: u64,

    /// Write a JSON report of every target's outcome to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Only connect to hosts listed in ~/.ssh/known_hosts
    #[arg(long)]
    pub strict_host_keys: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl From<&ShellFanoutCli> for DeploymentConfig {
    fn from(cli: &ShellFanoutCli) -> Self {
        Self {
            output: OutputStreams {
                stdout: cli.stdout,
                stderr: cli.stderr,
            },
            max_concurrency: cli.max_concurrency.map(|n| n as usize),
            task_timeout: cli.timeout.map(Duration::from_secs),
            connect_timeout: Duration::from_secs(cli.connect_timeout),
            host_keys: if cli.strict_host_keys {
                HostKeyPolicy::KnownHosts
            } else {
                HostKeyPolicy::AcceptAny
            },
        }
    }
}
