//! CLI integration tests for svemu.
//!
//! These tests run the built binary and check its output for the decode
//! and run commands.

use std::process::{Command, Output};

/// Get the path to the svemu binary.
fn svemu_bin() -> String {
    env!("CARGO_BIN_EXE_svemu").to_string()
}

/// Run svemu with the given arguments.
fn run_svemu(args: &[&str]) -> Output {
    Command::new(svemu_bin())
        .args(args)
        .output()
        .expect("Failed to execute svemu")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// =============================================================================
// Basic Command Tests
// =============================================================================

#[test]
fn test_help() {
    let output = run_svemu(&["--help"]);
    assert!(output.status.success(), "svemu --help should succeed");
    let stdout = stdout(&output);
    assert!(stdout.contains("decode"), "Help should list the decode command");
    assert!(stdout.contains("run"), "Help should list the run command");
}

#[test]
fn test_missing_words_fails() {
    let output = run_svemu(&["decode"]);
    assert!(!output.status.success());
}

// =============================================================================
// Decode Tests
// =============================================================================

#[test]
fn test_decode_words() {
    let output = run_svemu(&["decode", "2518e3e0", "0x0411_0000", "-a", "0x1000"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "one line per word: {}", stdout);
    assert!(lines[0].starts_with("0x00001000"));
    assert!(lines[0].contains("ptrue"));
    assert!(lines[1].starts_with("0x00001004"));
    assert!(lines[1].contains("unallocated"));
}

#[test]
fn test_decode_with_ops() {
    let output = run_svemu(&["decode", "2518e3e0", "--ops", "--vl", "64"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("PredInit"));
}

// =============================================================================
// Run Tests
// =============================================================================

#[test]
fn test_run_text() {
    let output = run_svemu(&["run", "2518e3e0", "25404001", "--trace"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Instructions executed: 2"));
    assert!(stdout.contains("Flags: N---"));
    assert!(stdout.contains("Trace (2 steps)"));
}

#[test]
fn test_run_json() {
    let output = run_svemu(&["run", "2518e3e0", "25404001", "--json", "--vl", "16"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["result"]["instruction_count"], 2);
    assert_eq!(value["result"]["stop_reason"], "EndOfInstructions");
    assert_eq!(value["registers"]["vector_length"], 16);
    assert_eq!(value["registers"]["flags"]["n"], true);
    assert_eq!(value["trace"]["steps"].as_array().unwrap().len(), 2);
}

#[test]
fn test_run_stops_at_unallocated() {
    let output = run_svemu(&["run", "2518e3e0", "04110000", "--json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["result"]["instruction_count"], 1);
    assert_eq!(value["result"]["stop_reason"]["Undefined"]["address"], 0x1004);
}

#[test]
fn test_run_rejects_bad_vector_length() {
    let output = run_svemu(&["run", "2518e3e0", "--vl", "24"]);
    assert!(!output.status.success());
}

#[test]
fn test_run_memory_fault() {
    // ld1w {z0.s}, p0/z, [x0] with nothing mapped
    let output = run_svemu(&["run", "2518e3e0", "a540a000", "-r", "x0=0x8000"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("memory fault"));

    let output = run_svemu(&[
        "run", "2518e3e0", "a540a000", "-r", "x0=0x8000", "--map", "0x8000:0x1000",
    ]);
    assert!(output.status.success());
}
