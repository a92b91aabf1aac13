//! CLI integration tests for the crashpage binary

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

fn crashpage(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_crashpage"))
        .args(args)
        .env_remove("DISPLAY_ERRORS")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run CLI")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Helper to create temporary test files
struct TestFiles {
    _temp_dir: TempDir,
    dir: PathBuf,
}

impl TestFiles {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();
        Self { _temp_dir: temp_dir, dir }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }
}

#[test]
fn test_cli_version() {
    let output = crashpage(&["--no-color", "version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_excerpt_marks_requested_line() {
    let files = TestFiles::new();
    let file = files.write("main.rs", "fn main() {\n    let x = 1;\n    run(x);\n    done();\n}\n");

    let output = crashpage(&["excerpt", file.to_str().unwrap(), "2"]);
    assert!(output.status.success());

    let html = stdout(&output);
    assert!(html.starts_with("<pre><code>"));
    assert_eq!(html.matches("class=\"line").count(), 5);
    assert!(html.contains("<span class=\"line highlight\"><span class=\"number\"> 2</span>     let x = 1;"));
}

#[test]
fn test_excerpt_past_end_of_file_is_empty() {
    let files = TestFiles::new();
    let file = files.write("short.rs", "a\nb\n");
    let max = usize::MAX.to_string();

    let output = crashpage(&["excerpt", file.to_str().unwrap(), &max, "-n", &max]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "<pre><code></code></pre>\n");
}

#[test]
fn test_excerpt_of_missing_file_fails() {
    let output = crashpage(&["excerpt", "/definitely/not/here.rs", "3"]);
    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_demo_with_errors_off_prints_generic_report() {
    let output = crashpage(&["--no-color", "--display-errors", "OFF", "demo", "-m", "secret detail"]);

    assert_eq!(output.status.code(), Some(1));
    let report = stdout(&output);
    assert!(report.starts_with("Running demo job\n"));
    assert!(report.contains("could not continue"));
    assert!(!report.contains("secret detail"));
}

#[test]
fn test_demo_with_errors_on_prints_details() {
    let output = crashpage(&["--no-color", "--display-errors", "1", "demo", "-m", "disk is full"]);

    assert_eq!(output.status.code(), Some(1));
    let report = stdout(&output);
    assert!(report.contains("An uncaught error was encountered"));
    assert!(report.contains("Message:     disk is full"));
}

#[test]
fn test_demo_panic_is_reported() {
    let output = Command::new(env!("CARGO_BIN_EXE_crashpage"))
        .args(["--no-color", "demo", "--panic", "-m", "wires crossed"])
        .env("DISPLAY_ERRORS", "on")
        .output()
        .expect("Failed to run CLI");

    assert_eq!(output.status.code(), Some(1));
    let report = stdout(&output);
    assert!(report.contains("Type:        panic"));
    assert!(report.contains("Message:     wires crossed"));
    assert!(report.contains("demo.rs"));
}

#[test]
fn test_config_file_sets_display_errors() {
    let files = TestFiles::new();
    let config = files.write("crashpage.yaml", "reporter:\n  display_errors: stdout\n  use_colors: false\n");

    let output = crashpage(&["-c", config.to_str().unwrap(), "demo", "-m", "from config"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Message:     from config"));
}
