mod common;

use common::{fixture_path, spawn_command};

fn fixture(name: &str) -> String {
    fixture_path(name).to_str().unwrap().to_owned()
}

#[test]
fn version_human() {
    let output = spawn_command(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("breathcycle "), "unexpected: {stdout}");
}

#[test]
fn version_json() {
    let output = spawn_command(&["version", "--format", "json"]);
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["name"], "breathcycle");
}

#[test]
fn presets_lists_builtins() {
    let output = spawn_command(&["presets"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for id in ["box", "478", "relaxing", "focus"] {
        assert!(
            stdout.lines().any(|l| l.starts_with(id)),
            "missing preset {id} in:\n{stdout}"
        );
    }
}

#[test]
fn presets_json_includes_custom() {
    let config = fixture("valid_config.yaml");
    let output = spawn_command(&["presets", "--config", &config, "--format", "json"]);
    assert!(
        output.status.success(),
        "presets failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[4]["id"], "coherent");
    assert_eq!(rows[4]["builtin"], false);
}

#[test]
fn validate_valid_config() {
    let output = spawn_command(&["validate", &fixture("valid_config.yaml")]);
    assert!(
        output.status.success(),
        "validate should succeed for valid config: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains(": ok"));
}

#[test]
fn validate_invalid_config() {
    let output = spawn_command(&["validate", &fixture("invalid_config.yaml")]);
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("invalid"));
    assert!(stdout.contains("duplicate preset id 'broken'"));
    assert!(stdout.contains("unknown preset 'missing'"));
}

#[test]
fn validate_json_reports_each_file() {
    let output = spawn_command(&[
        "validate",
        "--format",
        "json",
        &fixture("valid_config.yaml"),
        &fixture("invalid_config.yaml"),
    ]);
    assert_eq!(output.status.code(), Some(2));
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let files = parsed.as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["valid"], true);
    assert_eq!(files[1]["valid"], false);
    assert!(files[1]["errors"].as_array().unwrap().len() >= 4);
}

#[test]
fn validate_strict_fails_on_warnings() {
    let config = fixture("shadowing_config.yaml");

    let lenient = spawn_command(&["validate", &config]);
    assert!(lenient.status.success());
    assert!(String::from_utf8_lossy(&lenient.stdout).contains("warning:"));

    let strict = spawn_command(&["validate", "--strict", &config]);
    assert_eq!(strict.status.code(), Some(2));
}

#[test]
fn validate_malformed_yaml() {
    let output = spawn_command(&["validate", &fixture("malformed.yaml")]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn validate_missing_file() {
    let output = spawn_command(&["validate", "/tmp/nonexistent_breathcycle_test_file.yaml"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn run_unknown_preset_suggests() {
    let output = spawn_command(&["run", "--preset", "boxx", "--duration", "1s"]);
    assert_eq!(output.status.code(), Some(5));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("did you mean 'box'"), "stderr: {stderr}");
}

#[test]
fn run_invalid_config_is_config_error() {
    let output = spawn_command(&[
        "run",
        "--config",
        &fixture("invalid_config.yaml"),
        "--duration",
        "1s",
    ]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn run_zero_duration_is_usage_error() {
    let output = spawn_command(&["run", "--duration", "0s"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn run_unwritable_events_file_is_io_error() {
    let output = spawn_command(&[
        "run",
        "--duration",
        "1s",
        "--events-file",
        "/nonexistent_breathcycle_dir/events.jsonl",
    ]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn completions_bash() {
    let output = spawn_command(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("breathcycle"));
}
