//! Unit tests for the subprocess bridge
//!
//! These run real child processes through `sh`, with throwaway script
//! files standing in for the analytics capabilities.

use macropulse::bridge::{AnalyticsBridge, BridgeError, Capability, ProcessBridge};
use serde_json::json;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn bridge_with_script(body: &str) -> (TempDir, ProcessBridge) {
    let dir = TempDir::new().expect("create temp scripts dir");
    fs::write(dir.path().join(Capability::Analysis.script_name()), body)
        .expect("write script");
    let bridge = ProcessBridge::new(
        "sh".to_string(),
        dir.path().to_path_buf(),
        Some(Duration::from_secs(5)),
    );
    (dir, bridge)
}

#[tokio::test]
async fn missing_script_is_reported_before_spawning() {
    let dir = TempDir::new().expect("create temp scripts dir");
    let bridge = ProcessBridge::new("sh".to_string(), dir.path().to_path_buf(), None);

    let err = bridge
        .invoke(Capability::Analysis, &[])
        .await
        .expect_err("no script on disk");

    match err {
        BridgeError::CapabilityNotFound(script, path) => {
            assert_eq!(script, "analysis.py");
            assert!(path.contains("analysis.py"));
        }
        other => panic!("expected CapabilityNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn successful_invocation_returns_parsed_output_verbatim() {
    let (_dir, bridge) =
        bridge_with_script(r#"echo '{"correlation": {"GDP": {"GDP": 1.0}}, "count": 3}'"#);

    let output = bridge
        .invoke(Capability::Analysis, &["correlation".to_string()])
        .await
        .expect("script succeeds");

    assert_eq!(output["correlation"]["GDP"]["GDP"], json!(1.0));
    assert_eq!(output["count"], json!(3));
}

#[tokio::test]
async fn arguments_are_passed_through() {
    let (_dir, bridge) = bridge_with_script(r#"printf '{"argc": "%s"}' "$#""#);

    let argv = vec![
        "forecast".to_string(),
        "--series".to_string(),
        "GDP".to_string(),
    ];
    let output = bridge
        .invoke(Capability::Analysis, &argv)
        .await
        .expect("script succeeds");

    assert_eq!(output["argc"], json!("3"));
}

#[tokio::test]
async fn empty_stdout_parses_as_empty_object() {
    let (_dir, bridge) = bridge_with_script("exit 0");

    let output = bridge
        .invoke(Capability::Analysis, &[])
        .await
        .expect("script succeeds");

    assert_eq!(output, json!({}));
}

#[tokio::test]
async fn nonzero_exit_carries_code_and_stderr() {
    let (_dir, bridge) = bridge_with_script("echo 'series not found' >&2; exit 3");

    let err = bridge
        .invoke(Capability::Analysis, &[])
        .await
        .expect_err("script fails");

    match err {
        BridgeError::Execution {
            script,
            code,
            stderr,
        } => {
            assert_eq!(script, "analysis.py");
            assert_eq!(code, 3);
            assert_eq!(stderr, "series not found");
        }
        other => panic!("expected Execution, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_output_yields_parse_error_with_sample() {
    let (_dir, bridge) = bridge_with_script("echo 'Traceback (most recent call last):'");

    let err = bridge
        .invoke(Capability::Analysis, &[])
        .await
        .expect_err("output is not JSON");

    match err {
        BridgeError::Parse { script, sample, .. } => {
            assert_eq!(script, "analysis.py");
            assert!(sample.starts_with("Traceback"));
        }
        other => panic!("expected Parse, got {:?}", other),
    }
}

#[tokio::test]
async fn deadline_exceeded_yields_timeout() {
    let dir = TempDir::new().expect("create temp scripts dir");
    fs::write(dir.path().join("etl_pipeline.py"), "sleep 5").expect("write script");
    let bridge = ProcessBridge::new(
        "sh".to_string(),
        dir.path().to_path_buf(),
        Some(Duration::from_millis(100)),
    );

    let err = bridge
        .invoke(Capability::SeriesFetch, &["GDP".to_string()])
        .await
        .expect_err("script outlives the deadline");

    match err {
        BridgeError::Timeout { script, .. } => assert_eq!(script, "etl_pipeline.py"),
        other => panic!("expected Timeout, got {:?}", other),
    }
}
