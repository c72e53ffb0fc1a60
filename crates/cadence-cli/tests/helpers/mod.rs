#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Date every harness command treats as today.
pub const TODAY: &str = "2024-01-10";

/// Test harness for running CLI commands against a throwaway database
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("cadence-test.db");

        Self { temp_dir, db_path }
    }

    /// A command running inside the temp directory, so a `cadence.toml`
    /// there is picked up and nothing else is.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cadence").expect("Failed to find cadence binary");
        cmd.current_dir(self.temp_dir.path())
            .env("CADENCE_DATABASE_PATH", &self.db_path)
            .env_remove("CADENCE_USER")
            .env_remove("RUST_LOG")
            .args(["--today", TODAY]);
        cmd
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Plain stdout of a successful run, colors removed.
    pub fn stdout(&self, args: &[&str]) -> String {
        let output = self.run_success(args).get_output().stdout.clone();
        strip_ansi(&String::from_utf8_lossy(&output))
    }

    /// Runs `add` and returns the short id it printed.
    pub fn add(&self, args: &[&str]) -> String {
        let mut full = vec!["add"];
        full.extend_from_slice(args);
        let out = self.stdout(&full);
        let start = out
            .find("Task ID: [")
            .map(|i| i + "Task ID: [".len())
            .expect("add did not print a task id");
        out[start..start + 8].to_string()
    }
}

pub fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Common argument sets
pub struct TestFixtures;

impl TestFixtures {
    /// Weekly series of three starting Monday 2024-01-01.
    pub fn weekly_three() -> Vec<&'static str> {
        vec![
            "Weekly review",
            "--repeat",
            "week",
            "--count",
            "3",
            "--starts",
            "2024-01-01",
        ]
    }

    pub fn dated_task() -> Vec<&'static str> {
        vec!["Dentist", "--date", "2024-01-12", "--time", "09:30"]
    }
}

pub mod assertions {
    use predicates::prelude::*;

    pub fn task_created_successfully() -> impl Predicate<str> {
        predicate::str::contains("✓").and(predicate::str::contains("Created"))
    }

    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
