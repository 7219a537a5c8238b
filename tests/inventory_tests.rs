use shell_fanout::auth::{resolve, AuthError, Credential};
use shell_fanout::inventory::{load_targets, parse_targets, preprocess, LoadError, StaticIdentity};
use shell_fanout::types::{AuthConfig, TargetConfig};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn sample_targets() -> Vec<TargetConfig> {
    vec![
        TargetConfig::new("bob", "myserver:22", AuthConfig::password("s3cret")),
        TargetConfig::new("", "10.0.0.7:2222", AuthConfig::password("")),
        TargetConfig::new("deploy", "build:22", AuthConfig::pki("~/.ssh/id_ed25519")),
    ]
}

#[test]
fn test_target_list_round_trip() {
    let targets = sample_targets();
    let json = serde_json::to_string_pretty(&targets).unwrap();

    let reloaded = parse_targets(json.as_bytes()).unwrap();
    assert_eq!(reloaded, targets);
}

#[test]
fn test_load_targets_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    serde_json::to_writer(&mut file, &sample_targets()).unwrap();
    file.flush().unwrap();

    let targets = load_targets(file.path()).unwrap();
    assert_eq!(targets, sample_targets());
}

#[test]
fn test_malformed_file_fails_whole_load() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"[{"host": "a:22", "auth": {"method": "password", "artifact": "x"}}, {"#)
        .unwrap();

    assert!(matches!(
        load_targets(file.path()),
        Err(LoadError::InvalidJson(_))
    ));
}

#[test]
fn test_pki_key_found_through_home_expansion() {
    let home = TempDir::new().unwrap();
    std::fs::create_dir(home.path().join(".ssh")).unwrap();
    std::fs::copy(
        concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/id_ed25519"),
        home.path().join(".ssh/id_ed25519"),
    )
    .unwrap();

    let identity = StaticIdentity::new("operator", home.path());
    let mut target = TargetConfig::new("", "build:22", AuthConfig::pki("~/.ssh/id_ed25519"));

    preprocess(&mut target, &identity).unwrap();
    assert_eq!(target.user, "operator");
    assert!(!target.auth.artifact.contains('~'));

    let credential = resolve(&target).unwrap();
    assert!(matches!(credential, Credential::PublicKey { ref user, .. } if user == "operator"));
}

#[test]
fn test_resolve_before_preprocess_requires_username() {
    let target = TargetConfig::new("", "h1:22", AuthConfig::password("pw"));
    assert!(matches!(resolve(&target), Err(AuthError::MissingUsername)));
}

#[test]
fn test_credential_debug_hides_secrets() {
    let target = TargetConfig::new("bob", "h1:22", AuthConfig::password("s3cret"));
    let credential = resolve(&target).unwrap();

    let debug = format!("{credential:?}");
    assert!(debug.contains("bob"));
    assert!(!debug.contains("s3cret"));
}
