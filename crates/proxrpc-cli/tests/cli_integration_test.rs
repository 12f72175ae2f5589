//! CLI Integration Tests
//!
//! Runs the built `proxrpc` binary and checks its output.
//!
//! Test Scenarios:
//! 1. Describing proxies as JSON
//! 2. Converting proxies to the hex binary form and back
//! 3. Retry schedules from `--Proxrpc` options and config files
//! 4. Error handling for bad input and unknown commands

use std::io::Write;
use std::process::{Command, Output, Stdio};

// ============================================================================
// Test Helpers
// ============================================================================

fn proxrpc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_proxrpc"))
        .args(args)
        .env_remove("PROXRPC_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run proxrpc")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim_end().to_string()
}

/// Creates a config file with the given lines.
fn config_file(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

// ============================================================================
// Proxy Commands
// ============================================================================

#[test]
fn test_parse_prints_json() {
    let output = proxrpc(&["parse", "printer -f admin @ Printers"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["name"], "printer");
    assert_eq!(value["facet"], "admin");
    assert_eq!(value["kind"], "adapter");
    assert_eq!(value["mode"], "Twoway");
}

#[test]
fn test_parse_invalid_proxy_fails() {
    let output = proxrpc(&["parse", "printer -x"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot parse proxy"));
}

#[test]
fn test_encode_decode_round_trip() {
    let encoded = proxrpc(&["encode", "office/printer -o:tcp -h 10.0.0.5 -p 4061 -t 500"]);
    assert!(encoded.status.success());
    let hex = stdout(&encoded);

    let decoded = proxrpc(&["decode", &hex]);
    assert!(decoded.status.success());
    assert_eq!(stdout(&decoded), "office/printer -o:tcp -h 10.0.0.5 -p 4061 -t 500");
}

#[test]
fn test_decode_from_stdin() {
    let hex = stdout(&proxrpc(&["encode", "printer @ Printers"]));

    let mut child = Command::new(env!("CARGO_BIN_EXE_proxrpc"))
        .args(["decode", "-"])
        .env_remove("PROXRPC_CONFIG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    writeln!(child.stdin.take().unwrap(), "{}", hex).unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(stdout(&output), "printer -t @ Printers");
}

// ============================================================================
// Configuration Commands
// ============================================================================

#[test]
fn test_schedule_from_reserved_option() {
    let output = proxrpc(&["--Proxrpc.RetryIntervals=0 100", "schedule"]);
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.starts_with("2 retries (0 100)"));
    assert!(out.contains("  retry 2: after 100ms"));
}

#[test]
fn test_schedule_disabled() {
    let output = proxrpc(&["schedule", "-1"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "retries disabled");
}

#[test]
fn test_props_from_config_file() {
    let config = config_file(&[
        "# client settings",
        "Proxrpc.RetryIntervals = 0 250",
        "App.Greeting = hello world",
    ]);
    let config_arg = format!("--Proxrpc.Config={}", config.path().display());

    let output = proxrpc(&[&config_arg, "props", "--prefix", "App."]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "App.Greeting=hello world");

    let output = proxrpc(&[&config_arg, "schedule"]);
    assert!(stdout(&output).starts_with("2 retries (0 250)"));
}

#[test]
fn test_missing_config_file_fails() {
    let output = proxrpc(&["--Proxrpc.Config=/nonexistent/proxrpc.cfg", "props"]);
    assert!(!output.status.success());
}

#[test]
fn test_unknown_command_fails() {
    let output = proxrpc(&["resolve", "printer"]);
    assert!(!output.status.success());
}
