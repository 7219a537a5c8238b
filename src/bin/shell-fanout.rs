use anyhow::{Context, Result};
use clap::Parser;
use shell_fanout::cli::ShellFanoutCli;
use shell_fanout::inventory::{load_script, load_targets};
use shell_fanout::transport::SshTransport;
use shell_fanout::types::DeploymentConfig;
use shell_fanout::DeploymentOrchestrator;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ShellFanoutCli::parse();

    // Status lines go to stderr so streamed remote stdout stays clean.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let targets = load_targets(&cli.target).context("Failed to read target config")?;
    let script = load_script(&cli.script).context("Couldn't read script file")?;

    let config = DeploymentConfig::from(&cli);
    if config.task_timeout.is_none() {
        warn!("No --timeout set: a remote shell that never exits will hang its task");
    }

    let transport = SshTransport::new(config.connect_timeout, config.host_keys);
    let orchestrator = DeploymentOrchestrator::new(transport, config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling remaining deployments");
            on_interrupt.cancel();
        }
    });

    let report = orchestrator.run(targets, script, cancel).await;

    let elapsed = report.completed_at - report.started_at;
    info!(
        "Finished {} targets in {}ms: {} completed, {} errored, {} aborted",
        report.total_targets,
        elapsed.num_milliseconds(),
        report.completed,
        report.errored,
        report.aborted
    );

    if let Some(path) = &cli.report {
        let json = report.to_json().context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
