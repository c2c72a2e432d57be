//! Shared integration-test helpers for running the `breathcycle` binary.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};

/// Path to the built binary.
pub const BIN: &str = env!("CARGO_BIN_EXE_breathcycle");

/// Runs `breathcycle` with `args` to completion and captures its output.
///
/// Logging is silenced with `--quiet` so stdout holds only command output.
#[allow(clippy::missing_panics_doc)]
#[must_use]
pub fn spawn_command(args: &[&str]) -> Output {
    Command::new(BIN)
        .arg("--quiet")
        .args(args)
        .env_remove("BREATHCYCLE_CONFIG")
        .env_remove("BREATHCYCLE_PRESET")
        .env_remove("BREATHCYCLE_EVENTS_FILE")
        .stdin(Stdio::null())
        .output()
        .expect("failed to run breathcycle")
}

/// Starts `breathcycle` with `args` in the background, stdout piped.
#[allow(clippy::missing_panics_doc)]
#[must_use]
pub fn spawn_background(args: &[&str]) -> Child {
    Command::new(BIN)
        .arg("--quiet")
        .args(args)
        .env_remove("BREATHCYCLE_CONFIG")
        .env_remove("BREATHCYCLE_PRESET")
        .env_remove("BREATHCYCLE_EVENTS_FILE")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn breathcycle")
}

/// Returns the path to a test fixture.
#[must_use]
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Parses every non-empty stdout line as JSON.
#[allow(clippy::missing_panics_doc)]
#[must_use]
pub fn json_lines(bytes: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(bytes)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("bad JSON line {l:?}: {e}")))
        .collect()
}
