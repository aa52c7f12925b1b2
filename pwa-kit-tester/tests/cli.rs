use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "pwa-kit-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_pwa-kit-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
}

#[test]
fn cli_runs_all_scenarios_with_markdown_report() {
    let exe = env!("CARGO_BIN_EXE_pwa-kit-tester");
    let output_path = temp_path("run");
    let status = Command::new(exe)
        .args(["--report", "markdown", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("# pwa-kit Scenario Results"));
    assert!(!content.contains("Fail"));
}

#[test]
fn cli_rejects_unknown_scenario() {
    let exe = env!("CARGO_BIN_EXE_pwa-kit-tester");
    let output = Command::new(exe)
        .args(["--scenarios", "does-not-exist"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown scenario"));
}

#[test]
fn cli_passes_with_a_disabled_config() {
    let exe = env!("CARGO_BIN_EXE_pwa-kit-tester");
    let config_path = temp_path("disabled-config");
    std::fs::write(&config_path, r#"{"isPWA": false, "pwaName": "Off"}"#).expect("write config");
    let output = Command::new(exe)
        .args(["--report", "json", "--config"])
        .arg(&config_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"disabled\""));
    assert!(!stdout.contains("\"passed\": false"));
}
