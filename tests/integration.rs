//! End-to-end integration tests for the autotest binary
//!
//! These tests verify the complete harness workflow by:
//! 1. Laying out a project tree with a shell stand-in for the target program
//! 2. Running the autotest binary against it
//! 3. Verifying exit codes, the summary, and the files left behind

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

const PENDING: &str = "Alien\nBrazil\nChinatown\n";
const PROCESSED: &str = "Dune\nEraserhead\n";
const MISSING_TRANSCRIPT: &str = "Error: unable to open movie_queue.txt or movie_history.txt\n";

/// Test context with paths and cleanup
struct TestContext {
    /// Temporary root the harness is started from
    temp_dir: TempDir,
    /// Path to the autotest binary
    autotest_bin: PathBuf,
    /// Extra environment for the run
    env: Vec<(String, String)>,
}

/// Output of one harness run
struct HarnessOutput {
    stdout: String,
    stderr: String,
    code: Option<i32>,
}

impl TestContext {
    /// Create `<tmp>/Stack_Project_AutoTest/build/main` plus baselines
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let ctx = Self {
            temp_dir,
            autotest_bin: PathBuf::from(env!("CARGO_BIN_EXE_autotest")),
            env: Vec::new(),
        };

        fs::create_dir_all(ctx.build_dir()).expect("Failed to create build dir");
        ctx.install_target();
        ctx.write_data("AutoTest_movie_queue.txt", PENDING);
        ctx.write_data("AutoTest_movie_history.txt", PROCESSED);
        ctx
    }

    fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    fn project_dir(&self) -> PathBuf {
        self.root().join("Stack_Project_AutoTest")
    }

    fn build_dir(&self) -> PathBuf {
        self.project_dir().join("build")
    }

    /// Copy the shell fixture in as the target executable
    fn install_target(&self) {
        let source = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("movie_queue.sh");
        let target = self.build_dir().join("main");
        fs::copy(&source, &target).expect("Failed to copy fixture");
        fs::set_permissions(&target, fs::Permissions::from_mode(0o755))
            .expect("Failed to make fixture executable");
    }

    /// Write a file into the data directory (the project dir)
    fn write_data(&self, name: &str, contents: &str) {
        fs::write(self.project_dir().join(name), contents).expect("Failed to write data file");
    }

    fn build_file(&self, name: &str) -> PathBuf {
        self.build_dir().join(name)
    }

    fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Run the harness from the temp root
    fn run(&self, args: &[&str]) -> HarnessOutput {
        self.run_in(self.root(), args)
    }

    fn run_in(&self, dir: &Path, args: &[&str]) -> HarnessOutput {
        let output = Command::new(&self.autotest_bin)
            .args(args)
            .current_dir(dir)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()
            .expect("Failed to run autotest");

        HarnessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code(),
        }
    }

    /// Run with `--json` and parse the summary
    fn run_json(&self, args: &[&str]) -> (Option<i32>, serde_json::Value) {
        let mut all = vec!["--json"];
        all.extend_from_slice(args);
        let output = self.run(&all);
        let summary = serde_json::from_str(&output.stdout).unwrap_or_else(|e| {
            panic!(
                "summary is not JSON ({}):\nstdout: {}\nstderr: {}",
                e, output.stdout, output.stderr
            )
        });
        (output.code, summary)
    }
}

fn outcome<'a>(summary: &'a serde_json::Value, key: &str) -> &'a str {
    summary["verdicts"]
        .as_array()
        .expect("verdicts array")
        .iter()
        .find(|v| v["key"] == key)
        .and_then(|v| v["outcome"].as_str())
        .unwrap_or_else(|| panic!("no verdict for {}", key))
}

#[test]
fn test_correct_target_passes() {
    let ctx = TestContext::new();
    let output = ctx.run(&[]);

    assert_eq!(
        output.code,
        Some(0),
        "stdout: {}\nstderr: {}",
        output.stdout,
        output.stderr
    );
    assert!(output.stdout.contains("[==========]"));
    assert!(output.stdout.contains("8 passed, 0 failed"));

    // expected files derived next to the working copies
    let expected = fs::read_to_string(ctx.build_file("movie_queue_add.txt")).unwrap();
    assert_eq!(expected, format!("{}Black Widow\n", PENDING));
    let expected = fs::read_to_string(ctx.build_file("movie_history_watch.txt")).unwrap();
    assert_eq!(expected, format!("Alien\n{}", PROCESSED));
}

#[test]
fn test_broken_watch_is_reported() {
    let ctx = TestContext::new().with_env("MOVIE_QUEUE_FAULT", "watch");
    let (code, summary) = ctx.run_json(&[]);

    assert_eq!(code, Some(1));
    assert_eq!(outcome(&summary, "watch"), "mismatch");
    assert_eq!(outcome(&summary, "delete"), "pass");
    assert_eq!(summary["policy"], "first-failure");
}

#[test]
fn test_last_policy_reports_final_scenario_only() {
    let ctx = TestContext::new().with_env("MOVIE_QUEUE_FAULT", "watch");
    let (code, summary) = ctx.run_json(&["--policy", "last", "-t", "watch", "queue"]);

    assert_eq!(outcome(&summary, "watch"), "mismatch");
    assert_eq!(code, Some(0));
}

#[test]
fn test_crash_is_classified_and_fail_fast_stops() {
    let ctx = TestContext::new().with_env("MOVIE_QUEUE_FAULT", "crash");
    let (code, summary) = ctx.run_json(&["--policy", "fail-fast"]);

    assert_eq!(code, Some(139));
    let verdicts = summary["verdicts"].as_array().unwrap();
    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0]["outcome"], "crash");
    assert_eq!(verdicts[0]["detail"], "Segmentation Fault");
}

#[test]
fn test_unregistered_test_is_neutral() {
    let ctx = TestContext::new();
    let output = ctx.run(&["-t", "rewind"]);

    assert_eq!(output.code, Some(0));
    assert!(output.stdout.contains("Test function rewind not found."));
}

#[test]
fn test_missing_file_transcript() {
    let ctx = TestContext::new();
    ctx.write_data("AutoTest_main_missing_file.txt", MISSING_TRANSCRIPT);
    let (code, summary) = ctx.run_json(&["-t", "missing_file"]);

    assert_eq!(code, Some(0), "{}", summary);
    assert_eq!(outcome(&summary, "missing_file"), "pass");
    assert!(ctx.build_file("test_main_missing_file.txt").exists());
}

#[test]
fn test_missing_baseline_aborts() {
    let ctx = TestContext::new();
    fs::remove_file(ctx.project_dir().join("AutoTest_movie_history.txt")).unwrap();
    let output = ctx.run(&["-t", "add"]);

    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("Error:"), "stderr: {}", output.stderr);
    assert!(output.stderr.contains("AutoTest_movie_history.txt"));
}

#[test]
fn test_dry_run_builds_inputs_only() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--debug", "-t", "add", "watch"]);

    assert_eq!(output.code, Some(0), "stderr: {}", output.stderr);
    let script = fs::read_to_string(ctx.build_file("test_input_add.txt")).unwrap();
    assert_eq!(script, "a\nBlack Widow\nx\n");
    assert!(ctx.build_file("movie_queue_watch.txt").exists());
    assert!(!ctx.build_file("test_output_add.txt").exists());
    assert!(!ctx.build_file("movie_queue_updated.txt").exists());
}

#[test]
fn test_config_file_overrides_operand() {
    let ctx = TestContext::new();
    let config = ctx.root().join("harness.toml");
    fs::write(&config, "[scenario]\nadd_record = \"The Thing\"\n").unwrap();

    let output = ctx.run(&["-c", config.to_str().unwrap(), "-t", "add"]);
    assert_eq!(output.code, Some(0), "stdout: {}", output.stdout);

    let expected = fs::read_to_string(ctx.build_file("movie_queue_add.txt")).unwrap();
    assert!(expected.ends_with("The Thing\n"));
}

#[test]
fn test_nosetup_runs_in_place() {
    let ctx = TestContext::new();
    let output = ctx.run_in(&ctx.build_dir(), &["--nosetup", "-q", "-t", "next"]);

    assert_eq!(output.code, Some(0), "stdout: {}", output.stdout);
    assert!(!output.stdout.contains("[==========]"));
    assert!(ctx.build_file("test_output_next.txt").exists());
}

#[test]
fn test_missing_project_dir_fails_setup() {
    let ctx = TestContext::new();
    fs::remove_dir_all(ctx.project_dir()).unwrap();
    let output = ctx.run(&[]);

    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("Error:"));
}

#[test]
fn test_list_scenarios() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--list"]);

    assert_eq!(output.code, Some(0));
    for key in ["exit", "add", "watch", "delete", "history", "recent", "queue", "next"] {
        assert!(output.stdout.contains(key), "missing {}", key);
    }
    assert!(output.stdout.contains("missing_file"));
    assert!(output.stdout.contains("not in default set"));
}
