use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "battleground-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_policies_writes_output() {
    let exe = env!("CARGO_BIN_EXE_battleground-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-policies", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert!(content.contains("Available strategies"));
    assert!(content.contains("scholar"));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_runs_and_writes_json_report() {
    let exe = env!("CARGO_BIN_EXE_battleground-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--policies",
            "idle,eager",
            "--seeds",
            "1,2",
            "--iterations",
            "2",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Bachelors Battleground Automated Tester"));

    let content = std::fs::read_to_string(&output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    assert_eq!(report["policies"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["runs"].as_array().map(Vec::len), Some(8));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_rejects_unknown_strategy() {
    let exe = env!("CARGO_BIN_EXE_battleground-tester");
    let output = Command::new(exe)
        .args(["--policies", "wizard"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown strategy"), "{stderr}");
}
