use shell_fanout::deploy::{DeploymentOrchestrator, MemoryReporter};
use shell_fanout::inventory::{parse_targets, StaticIdentity};
use shell_fanout::transport::{FailAt, MockTransport};
use shell_fanout::types::{DeploymentConfig, ScriptPayload, TaskStatus};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const SCRIPT: &[u8] = b"#!/bin/sh\napt-get update\nsystemctl restart nginx\n";

fn orchestrator(
    transport: MockTransport,
) -> (DeploymentOrchestrator<MockTransport>, Arc<MemoryReporter>) {
    let reporter = Arc::new(MemoryReporter::new());
    let orchestrator = DeploymentOrchestrator::new(transport, DeploymentConfig::default())
        .with_identity(Arc::new(StaticIdentity::new("CORP\\operator", "/home/operator")))
        .with_reporter(reporter.clone());
    (orchestrator, reporter)
}

#[tokio::test]
async fn test_end_to_end_password_target() {
    let json = r#"[{"host":"h1:22","auth":{"method":"password","artifact":"pw"}}]"#;
    let targets = parse_targets(json.as_bytes()).unwrap();
    let transport = MockTransport::new();
    let (orchestrator, reporter) = orchestrator(transport.clone());

    let report = orchestrator
        .run(targets, ScriptPayload::new(SCRIPT.to_vec()), CancellationToken::new())
        .await;

    assert_eq!(report.total_targets, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(
        reporter.lines(),
        vec![
            "Starting task #0 (operator@h1:22)",
            "Completed task #0 (operator@h1:22)",
        ]
    );
    assert_eq!(transport.received("h1:22"), Some(SCRIPT.to_vec()));
    assert_eq!(transport.user_for("h1:22"), Some("operator".to_string()));
}

#[tokio::test]
async fn test_one_unreachable_host_does_not_affect_others() {
    let json = r#"[
        {"username": "deploy", "host": "web1:22", "auth": {"method": "password", "artifact": "pw"}},
        {"username": "deploy", "host": "web2:22", "auth": {"method": "password", "artifact": "pw"}},
        {"username": "deploy", "host": "down:22", "auth": {"method": "password", "artifact": "pw"}},
        {"username": "deploy", "host": "web3:22", "auth": {"method": "password", "artifact": ""}}
    ]"#;
    let targets = parse_targets(json.as_bytes()).unwrap();
    let transport = MockTransport::new().fail("down:22", FailAt::Dial);
    let (orchestrator, reporter) = orchestrator(transport.clone());

    let report = orchestrator
        .run(targets, ScriptPayload::new(SCRIPT.to_vec()), CancellationToken::new())
        .await;

    assert_eq!(report.completed, 3);
    assert_eq!(report.errored, 1);
    assert_eq!(report.aborted, 0);

    let down = report.outcome(2).unwrap();
    match &down.status {
        TaskStatus::Errored(reason) => assert!(reason.starts_with("failed to dial target")),
        other => panic!("Expected errored status, got {other:?}"),
    }

    for host in ["web1:22", "web2:22", "web3:22"] {
        assert_eq!(transport.received(host), Some(SCRIPT.to_vec()));
    }
    assert_eq!(transport.received("down:22"), None);

    let lines = reporter.lines_for(2);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Starting task #2 (deploy@down:22)");
    assert!(lines[1].starts_with("Errored: failed to dial target"));
    assert!(lines[1].ends_with("task #2 (deploy@down:22)"));
}

#[tokio::test]
async fn test_every_failure_kind_is_isolated() {
    let json = r#"[
        {"username": "ops", "host": "ok:22", "auth": {"method": "password", "artifact": "pw"}},
        {"username": "ops", "host": "ftp:22", "auth": {"method": "ftp", "artifact": ""}},
        {"username": "ops", "host": "nokey:22", "auth": {"method": "pki", "artifact": "/nonexistent/id"}},
        {"username": "ops", "host": "shell:22", "auth": {"method": "password", "artifact": "pw"}},
        {"username": "ops", "host": "exit:22", "auth": {"method": "password", "artifact": "pw"}}
    ]"#;
    let targets = parse_targets(json.as_bytes()).unwrap();
    let transport = MockTransport::new()
        .fail("shell:22", FailAt::Shell)
        .fail("exit:22", FailAt::Exit(1));
    let (orchestrator, reporter) = orchestrator(transport.clone());

    let report = orchestrator
        .run(targets, ScriptPayload::new(SCRIPT.to_vec()), CancellationToken::new())
        .await;

    assert_eq!(report.completed, 1);
    assert_eq!(report.aborted, 2);
    assert_eq!(report.errored, 2);
    assert_eq!(transport.dial_count(), 3);

    // Aborted tasks never report Starting.
    assert_eq!(reporter.lines_for(1).len(), 1);
    assert_eq!(reporter.lines_for(2).len(), 1);
    assert!(reporter.lines_for(2)[0].starts_with("Aborted: failed reading key"));

    assert_eq!(
        report.outcome(4).unwrap().status,
        TaskStatus::Errored(
            "error during shell session: remote shell exited with status 1".to_string()
        )
    );
}

#[tokio::test]
async fn test_empty_target_list() {
    let (orchestrator, reporter) = orchestrator(MockTransport::new());

    let report = orchestrator
        .run(Vec::new(), ScriptPayload::new(SCRIPT.to_vec()), CancellationToken::new())
        .await;

    assert_eq!(report.total_targets, 0);
    assert!(report.outcomes.is_empty());
    assert!(reporter.lines().is_empty());
}

#[tokio::test]
async fn test_targets_do_not_share_preprocessing() {
    let json = r#"[
        {"host": "a:22", "auth": {"method": "password", "artifact": "pw"}},
        {"username": "root", "host": "b:22", "auth": {"method": "password", "artifact": "pw"}}
    ]"#;
    let targets = parse_targets(json.as_bytes()).unwrap();
    let transport = MockTransport::new();
    let (orchestrator, _reporter) = orchestrator(transport.clone());

    let report = orchestrator
        .run(targets, ScriptPayload::new(SCRIPT.to_vec()), CancellationToken::new())
        .await;

    assert_eq!(report.completed, 2);
    assert_eq!(report.outcome(0).unwrap().user, "operator");
    assert_eq!(report.outcome(1).unwrap().user, "root");
    assert_eq!(transport.user_for("b:22"), Some("root".to_string()));
}
