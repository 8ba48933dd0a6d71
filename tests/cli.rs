//! End-to-end checks of the `bomb-bench` binary: exit codes, stderr, and
//! what lands in the ledger file.

#![cfg(unix)]

use std::path::Path;
use std::process::{Command, Output};

use serde_json::json;
use tempfile::TempDir;

fn bomb_bench(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bomb-bench"))
        .current_dir(dir)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run bomb-bench")
}

fn write_config(dir: &TempDir, config: serde_json::Value) -> String {
    let path = dir.path().join("bench.json");
    std::fs::write(&path, config.to_string()).unwrap();
    path.to_str().unwrap().to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_unknown_command_prints_usage_and_succeeds() {
    let dir = TempDir::new().unwrap();
    let output = bomb_bench(dir.path(), &["frobnicate"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Unknown command: frobnicate"));
    assert!(stdout(&output).contains("Usage"));
}

#[test]
fn test_generator_exit_code_becomes_process_exit_code() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        json!({
            "perlin": {
                "generator": ["sh", "-c", "exit 5"],
                "baseline": "/bin/cat",
                "submission": "/bin/cat"
            }
        }),
    );

    let output = bomb_bench(dir.path(), &["--config", &config, "bench", "perlin"]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("[error]"), "stderr: {}", stderr(&output));
}

#[test]
fn test_save_via_command_with_one_metric_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let ledger = dir.path().join("perf.json");
    let config = write_config(
        &dir,
        json!({ "aggregate_command": ["sh", "-c", "echo 'Speedup: 2.50x'"] }),
    );

    let output = bomb_bench(
        dir.path(),
        &[
            "--config",
            &config,
            "--ledger",
            ledger.to_str().unwrap(),
            "save",
            "--via-command",
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("[error]"));
    assert!(!ledger.exists());
}

#[test]
fn test_save_then_show_and_compare() {
    let dir = TempDir::new().unwrap();
    let ledger = dir.path().join("perf.json");
    let ledger_arg = ledger.to_str().unwrap();
    let config = write_config(
        &dir,
        json!({
            "aggregate_command": [
                "sh", "-c", "echo 'Speedup: 2.50x'; echo 'Speedup: 1.20x' >&2"
            ]
        }),
    );
    let save = |note: &str| {
        bomb_bench(
            dir.path(),
            &[
                "--config", &config, "--ledger", ledger_arg, "--no-color",
                "save", "M", note, "--via-command",
            ],
        )
    };

    let first = save("first");
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    assert!(stdout(&first).contains("record #1"));
    assert!(ledger.exists());

    // One record is not enough history to compare.
    let compare = bomb_bench(dir.path(), &["--ledger", ledger_arg, "compare"]);
    assert_eq!(compare.status.code(), Some(1));

    assert!(save("second").status.success());
    let show = bomb_bench(dir.path(), &["--ledger", ledger_arg, "show"]);
    assert!(show.status.success());
    assert!(stdout(&show).contains("(2 records)"));
    assert!(stdout(&show).contains("[SIZE=M]"));

    let compare = bomb_bench(dir.path(), &["--ledger", ledger_arg, "--no-color", "compare"]);
    assert!(compare.status.success());
    assert!(stdout(&compare).contains("Total optimizations: 2"));
    assert!(stdout(&compare).contains("0.00x →"));
}
