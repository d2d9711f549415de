// CLI integration tests for generate/config flows and exit codes.
use std::process::Command;

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_kvpgen");
    Command::new(exe)
}

fn parse_json(value: &str) -> Value {
    serde_json::from_str(value).expect("valid json")
}

#[test]
fn generate_writes_both_files_and_reports_summary() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("in.txt");
    let expected = temp.path().join("out.json");

    let output = cmd()
        .args([
            "generate",
            "--valid",
            "500",
            "--invalid",
            "50",
            "--workers",
            "4",
            "--seed",
            "7",
            "--input-out",
            input.to_str().unwrap(),
            "--expected-out",
            expected.to_str().unwrap(),
        ])
        .output()
        .expect("generate");
    assert!(output.status.success());

    let summary = parse_json(std::str::from_utf8(&output.stdout).expect("utf8"));
    assert_eq!(summary["seed"].as_u64(), Some(7));
    assert_eq!(summary["valid"]["requested"].as_u64(), Some(500));
    assert_eq!(summary["valid"]["generated"].as_u64(), Some(500));
    assert_eq!(summary["invalid"]["requested"].as_u64(), Some(50));
    assert_eq!(summary["valid"]["workers"].as_u64(), Some(4));
    assert!(summary["generated_at"].as_str().is_some());

    let expected_text = std::fs::read_to_string(&expected).expect("expected file");
    let expected_json = parse_json(&expected_text);
    assert_eq!(expected_json.as_object().expect("object").len(), 500);
    assert_eq!(
        summary["expected"]["bytes"].as_u64(),
        Some(expected_text.len() as u64)
    );

    let input_text = std::fs::read_to_string(&input).expect("input file");
    assert_eq!(
        summary["input"]["bytes"].as_u64(),
        Some(input_text.len() as u64)
    );
    let records = summary["input"]["records"].as_u64().unwrap();
    let invalid = summary["invalid"]["generated"].as_u64().unwrap();
    assert_eq!(records, 500 + invalid);
}

#[test]
fn same_seed_reproduces_files() {
    let temp = tempfile::tempdir().expect("tempdir");
    let run = |tag: &str, workers: &str| {
        let input = temp.path().join(format!("{tag}.txt"));
        let expected = temp.path().join(format!("{tag}.json"));
        let status = cmd()
            .args([
                "generate",
                "--valid",
                "300",
                "--invalid",
                "30",
                "--workers",
                workers,
                "--seed",
                "99",
                "--input-out",
                input.to_str().unwrap(),
                "--expected-out",
                expected.to_str().unwrap(),
            ])
            .output()
            .expect("generate")
            .status;
        assert!(status.success());
        (
            std::fs::read(&input).expect("input"),
            std::fs::read(&expected).expect("expected"),
        )
    };

    assert_eq!(run("a", "1"), run("b", "5"));
}

#[test]
fn config_prints_effective_settings() {
    let temp = tempfile::tempdir().expect("tempdir");
    let file = temp.path().join("fixture.json");
    std::fs::write(&file, r#"{"valid_count": 12, "probabilities": {"noise": 0.0}}"#)
        .expect("write config");

    let output = cmd()
        .args([
            "config",
            "--config",
            file.to_str().unwrap(),
            "--workers",
            "2",
            "--remainder",
            "truncate",
        ])
        .output()
        .expect("config");
    assert!(output.status.success());
    let config = parse_json(std::str::from_utf8(&output.stdout).expect("utf8"));
    assert_eq!(config["valid_count"].as_u64(), Some(12));
    assert_eq!(config["workers"].as_u64(), Some(2));
    assert_eq!(config["remainder"].as_str(), Some("truncate"));
    assert_eq!(config["probabilities"]["noise"].as_f64(), Some(0.0));
    assert_eq!(config["probabilities"]["padding"].as_f64(), Some(0.4));
    assert_eq!(config["syntax"]["kv_delimiter"].as_str(), Some(":"));
}

#[test]
fn usage_exit_code() {
    let output = cmd()
        .args(["generate", "--workers", "0"])
        .output()
        .expect("generate");
    assert_eq!(output.status.code().unwrap(), 2);
    let err = parse_json(String::from_utf8_lossy(&output.stderr).trim());
    assert_eq!(err["error"]["kind"].as_str(), Some("Usage"));

    let bad_flag = cmd()
        .args(["generate", "--noise-prob", "lots"])
        .output()
        .expect("generate");
    assert_eq!(bad_flag.status.code().unwrap(), 2);
}

#[test]
fn io_exit_code_for_missing_directory() {
    let temp = tempfile::tempdir().expect("tempdir");
    let missing = temp.path().join("missing").join("out.json");
    let input = temp.path().join("in.txt");

    let output = cmd()
        .args([
            "generate",
            "--valid",
            "10",
            "--invalid",
            "0",
            "--seed",
            "1",
            "--input-out",
            input.to_str().unwrap(),
            "--expected-out",
            missing.to_str().unwrap(),
        ])
        .output()
        .expect("generate");
    assert_eq!(output.status.code().unwrap(), 8);
    let err = parse_json(String::from_utf8_lossy(&output.stderr).trim());
    assert_eq!(err["error"]["kind"].as_str(), Some("Io"));
    assert!(err["error"]["path"].as_str().unwrap().ends_with("out.json"));
    assert!(err["error"]["hint"].as_str().is_some());
    assert!(!input.exists(), "no input may be left behind by a failed run");
}

#[test]
fn workers_are_reported_after_clamping() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("in.txt");
    let expected = temp.path().join("out.json");

    let output = cmd()
        .args([
            "generate",
            "--valid",
            "5",
            "--invalid",
            "2",
            "--workers",
            "24",
            "--seed",
            "3",
            "--input-out",
            input.to_str().unwrap(),
            "--expected-out",
            expected.to_str().unwrap(),
        ])
        .output()
        .expect("generate");
    assert!(output.status.success());

    let summary = parse_json(std::str::from_utf8(&output.stdout).expect("utf8"));
    assert_eq!(summary["valid"]["workers"].as_u64(), Some(5));
    assert_eq!(summary["invalid"]["workers"].as_u64(), Some(2));
}
