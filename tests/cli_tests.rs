// The lavanderio binary: JSON on stdout, `{error, timestamp}` on stderr with exit code 1

use serde_json::Value;
use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn lavanderio(data_dir: &PathBuf, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lavanderio"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env("RUST_LOG", "off")
        .env_remove("LAVANDERIO_DATA_DIR")
        .output()
        .unwrap()
}

fn parse(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[test]
fn test_analyze_prints_json() {
    let output = lavanderio(&fixture_dir(), &["analyze", "--type", "summary"]);

    assert!(output.status.success());
    let summary = parse(&output.stdout);
    assert_eq!(summary["total_clients"], 20);
}

#[test]
fn test_chart_prints_chart_data() {
    let output = lavanderio(&fixture_dir(), &["chart", "--type", "pie", "--query", "setor"]);

    assert!(output.status.success());
    assert_eq!(parse(&output.stdout)["chartData"]["type"], "pie");
}

#[test]
fn test_detect_needs_no_data() {
    let output = lavanderio(
        &PathBuf::from("/nonexistent/lavanderio"),
        &["detect", "--content", "Olá", "--query", "oi"],
    );

    assert!(output.status.success());
    assert_eq!(parse(&output.stdout)["isChartable"], false);
}

#[test]
fn test_failure_reports_error_and_exits_one() {
    let output = lavanderio(
        &PathBuf::from("/nonexistent/lavanderio"),
        &["analyze", "--type", "summary"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let report = parse(&output.stderr);
    assert!(report["error"].as_str().unwrap().contains("sample_clients.csv"));
    assert!(report["timestamp"].is_string());
}

#[test]
fn test_unknown_analysis_type_fails() {
    let output = lavanderio(&fixture_dir(), &["analyze", "--type", "forecast"]);

    assert_eq!(output.status.code(), Some(1));
    let report = parse(&output.stderr);
    assert_eq!(report["error"], "Invalid analysisType: forecast");
}
