//! KubectlSource against a scripted stand-in for kubectl

#![cfg(unix)]

use s3_operator_controller::{KubectlSource, SecretSource, SourceError};
use s3_operator_core::EventKind;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const LIST_OUTPUT: &str = r#"{"apiVersion":"v1","kind":"List","items":[
  {"metadata":{"namespace":"team-a","name":"creds","resourceVersion":"42",
    "annotations":{"s3-resource-operator.io/enabled":"true"}},
   "data":{"bucket-name":"cGhvdG9z","access-key":"YWxpY2U=","secret-key":"czNjcmV0"}}
]}"#;

const WATCH_OUTPUT: &str = r#"{"type":"ADDED","object":{"metadata":{"namespace":"team-a","name":"creds","resourceVersion":"42"}}}
{"type":"MODIFIED","object":{"metadata":{"namespace":"team-a","name":"creds","resourceVersion":"43"}}}
{"type":"DELETED","object":{"metadata":{"namespace":"team-a","name":"creds","resourceVersion":"44"}}}
"#;

/// Write an executable shell script standing in for kubectl
fn fake_kubectl(dir: &Path, body: &str) -> String {
    fs::write(dir.join("list.json"), LIST_OUTPUT).unwrap();
    fs::write(dir.join("watch.json"), WATCH_OUTPUT).unwrap();

    let script = dir.join("kubectl");
    fs::write(&script, format!("#!/bin/sh\ncd \"{}\"\n{}\n", dir.display(), body)).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script.to_string_lossy().to_string()
}

const ROUTING_SCRIPT: &str = r#"case "$*" in
  *--watch*) cat watch.json ;;
  *) cat list.json ;;
esac"#;

#[tokio::test]
async fn test_list_decodes_secrets() {
    let dir = TempDir::new().unwrap();
    let source = KubectlSource::new().with_binary_path(fake_kubectl(dir.path(), ROUTING_SCRIPT));

    let records = source.list().await.unwrap();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.key(), "team-a/creds");
    assert_eq!(record.resource_version, "42");
    let fields = record.fields();
    assert_eq!(fields.get("bucket-name").map(String::as_str), Some("photos"));
    assert_eq!(fields.get("access-key").map(String::as_str), Some("alice"));
    assert_eq!(fields.get("secret-key").map(String::as_str), Some("s3cret"));
}

#[tokio::test]
async fn test_list_passes_kubeconfig() {
    let dir = TempDir::new().unwrap();
    let script = fake_kubectl(
        dir.path(),
        r#"[ "$1" = "--kubeconfig" ] && [ "$2" = "/etc/operator/kubeconfig" ] || exit 3
cat list.json"#,
    );
    let source = KubectlSource::new()
        .with_binary_path(script)
        .with_kubeconfig(Some("/etc/operator/kubeconfig".into()));

    assert_eq!(source.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_reports_command_failure() {
    let dir = TempDir::new().unwrap();
    let script = fake_kubectl(dir.path(), "echo 'error: forbidden' >&2\nexit 1");
    let source = KubectlSource::new().with_binary_path(script);

    match source.list().await.unwrap_err() {
        SourceError::CommandFailed { status, stderr, .. } => {
            assert_eq!(status, Some(1));
            assert_eq!(stderr, "error: forbidden");
        }
        other => panic!("expected command failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_reports_missing_binary() {
    let source = KubectlSource::new().with_binary_path("/nonexistent/kubectl");
    assert!(matches!(source.list().await, Err(SourceError::Spawn { .. })));
}

#[tokio::test]
async fn test_watch_streams_events_then_closes() {
    let dir = TempDir::new().unwrap();
    let source = KubectlSource::new()
        .with_binary_path(fake_kubectl(dir.path(), ROUTING_SCRIPT))
        .with_watch_timeout(Duration::from_secs(30));

    let mut events = source.watch().await.unwrap();
    let mut kinds = Vec::new();
    while let Some(event) = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .unwrap()
    {
        assert_eq!(event.record.key(), "team-a/creds");
        kinds.push(event.kind);
    }

    assert_eq!(kinds, vec![EventKind::Added, EventKind::Modified, EventKind::Deleted]);
}

#[tokio::test]
async fn test_watch_receives_timeout_argument() {
    let dir = TempDir::new().unwrap();
    let script = fake_kubectl(
        dir.path(),
        r#"case "$*" in
  *--request-timeout=45s*) cat watch.json ;;
  *) exit 2 ;;
esac"#,
    );
    let source = KubectlSource::new()
        .with_binary_path(script)
        .with_watch_timeout(Duration::from_secs(45));

    let mut events = source.watch().await.unwrap();
    let first = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .unwrap();
    assert!(first.is_some());
}

#[tokio::test]
async fn test_list_receives_request_timeout_argument() {
    let dir = TempDir::new().unwrap();
    let script = fake_kubectl(
        dir.path(),
        r#"case "$*" in
  *--watch*) exit 2 ;;
  *--request-timeout=7s*) cat list.json ;;
  *) exit 2 ;;
esac"#,
    );
    let source = KubectlSource::new()
        .with_binary_path(script)
        .with_request_timeout(Duration::from_secs(7));

    assert_eq!(source.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_gives_up_on_wedged_process() {
    let dir = TempDir::new().unwrap();
    let script = fake_kubectl(dir.path(), "exec sleep 60");
    let source = KubectlSource::new()
        .with_binary_path(script)
        .with_request_timeout(Duration::from_secs(1));

    let result = tokio::time::timeout(Duration::from_secs(10), source.list())
        .await
        .expect("listing should be bounded");
    assert!(matches!(result, Err(SourceError::TimedOut { .. })));
}
