//! Black-box tests of the `cadence` binary.
//!
//! Every command runs with `--today 2024-01-10` against a database in a
//! fresh temp directory.

use predicates::prelude::*;
use std::fs;

mod helpers;
use helpers::{assertions, CliTestHarness, TestFixtures};

const JANUARY: [&str; 5] = ["agenda", "--from", "2024-01-01", "--to", "2024-01-31"];

#[test]
fn test_cli_help_and_version() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["--help"])
        .stdout(predicate::str::contains("recurring tasks"));
    harness
        .run_success(&["--version"])
        .stdout(predicate::str::contains("cadence"));
    harness
        .run_failure(&["invalid-command"])
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_add_single_and_recurring() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["add", "Buy milk"])
        .stdout(assertions::task_created_successfully());

    let mut args = vec!["add"];
    args.extend(TestFixtures::dated_task());
    harness
        .run_success(&args)
        .stdout(predicate::str::contains("2024-01-12 09:30"));

    let mut args = vec!["add"];
    args.extend(TestFixtures::weekly_three());
    harness
        .run_success(&args)
        .stdout(predicate::str::contains("Created recurring task"))
        .stdout(predicate::str::contains("Every week (after 3x)"));
}

#[test]
fn test_add_rejects_bad_input() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(&["add", "   "])
        .stderr(assertions::has_error());
    harness
        .run_failure(&["add", "Task", "--date", "not a date at all"])
        .stderr(assertions::has_error());
    harness
        .run_failure(&["add", "Task", "--importance", "urgent"])
        .stderr(assertions::has_error());
    harness
        .run_failure(&["add", "Task", "--count", "3"])
        .stderr(predicate::str::contains("--repeat"));
    harness
        .run_failure(&["add", "Task", "--repeat", "week", "--every", "0"])
        .stderr(predicate::str::contains("Invalid recurrence"));
}

#[test]
fn test_weekly_series_in_agenda() {
    let harness = CliTestHarness::new();
    harness.add(&TestFixtures::weekly_three());

    let out = harness.stdout(&JANUARY);
    assert!(out.contains("Mon 2024-01-01"));
    assert!(out.contains("Mon 2024-01-08"));
    assert!(out.contains("Mon 2024-01-15"));
    assert!(!out.contains("2024-01-22"));
    assert_eq!(out.matches("Weekly review").count(), 3);
}

#[test]
fn test_skip_hides_one_occurrence() {
    let harness = CliTestHarness::new();
    let id = harness.add(&TestFixtures::weekly_three());

    harness
        .run_success(&["skip", &id, "--on", "2024-01-08"])
        .stdout(predicate::str::contains("Skipped"));

    let out = harness.stdout(&JANUARY);
    assert!(out.contains("2024-01-01"));
    assert!(!out.contains("2024-01-08"));
    assert!(out.contains("2024-01-15"));

    harness
        .run_success(&["recur", "info", &id])
        .stdout(predicate::str::contains("Skipped:").and(predicate::str::contains("2024-01-08")));

    // Not an occurrence any more
    harness
        .run_failure(&["done", &id, "--on", "2024-01-08"])
        .stderr(predicate::str::contains("no occurrence"));
}

#[test]
fn test_done_and_undo_one_occurrence() {
    let harness = CliTestHarness::new();
    let id = harness.add(&TestFixtures::weekly_three());

    harness
        .run_success(&["done", &id, "--on", "2024-01-15"])
        .stdout(predicate::str::contains("Completed"));
    let out = harness.stdout(&JANUARY);
    assert_eq!(out.matches("[x]").count(), 1);
    assert_eq!(out.matches("[ ]").count(), 2);

    harness
        .run_success(&["undo", &id, "--on", "2024-01-15"])
        .stdout(predicate::str::contains("Reopened"));
    let out = harness.stdout(&JANUARY);
    assert_eq!(out.matches("[x]").count(), 0);
}

#[test]
fn test_done_single_task_hides_it_from_board() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Buy milk"]);

    assert!(harness.stdout(&["list"]).contains("Buy milk"));
    harness.run_success(&["done", &id]);
    assert!(!harness.stdout(&["list"]).contains("Buy milk"));
    assert!(harness.stdout(&["list", "--all"]).contains("Buy milk"));
}

#[test]
fn test_skip_requires_a_series() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Buy milk", "--date", "2024-01-10"]);

    harness
        .run_failure(&["skip", &id, "--on", "2024-01-10"])
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_week_and_month_views() {
    let harness = CliTestHarness::new();
    let mut args = TestFixtures::dated_task();
    args.extend(["--list", "Health"]);
    harness.add(&args);

    let week = harness.stdout(&["week"]);
    assert!(week.contains("Mon 2024-01-08"));
    assert!(week.contains("Sun 2024-01-14"));
    assert!(week.contains("09:30  Dentist · Health"));

    let month = harness.stdout(&["month"]);
    assert!(month.contains("January 2024"));
    assert!(month.contains("Dentist"));
}

#[test]
fn test_recur_preview() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Standup", "--repeat", "day", "--every", "2", "--starts", "2024-01-09"]);

    let out = harness.stdout(&["recur", "preview", &id, "-n", "3"]);
    assert!(out.contains("2024-01-11"));
    assert!(out.contains("2024-01-13"));
    assert!(out.contains("2024-01-15"));
    assert!(!out.contains("2024-01-17"));

    let single = harness.add(&["Buy milk"]);
    harness
        .run_failure(&["recur", "info", &single])
        .stderr(predicate::str::contains("not a recurring task"));
}

#[test]
fn test_edit_task_and_series() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Buy milk", "--date", "2024-01-10"]);

    harness
        .run_success(&["edit", &id, "--title", "Buy oat milk", "--importance", "high"])
        .stdout(predicate::str::contains("Buy oat milk"));
    harness
        .run_success(&["edit", &id, "--repeat", "week", "--count", "2"])
        .stdout(predicate::str::contains("Updated task"));

    let out = harness.stdout(&JANUARY);
    assert_eq!(out.matches("Buy oat milk ↻").count(), 2);
    assert!(out.contains("2024-01-17"));

    harness
        .run_failure(&["edit", &id, "--date", "2024-01-11"])
        .stderr(predicate::str::contains("repeats"));
    harness
        .run_failure(&["edit", &id])
        .stderr(predicate::str::contains("Nothing to change"));
}

#[test]
fn test_delete_requires_confirmation() {
    let harness = CliTestHarness::new();
    let id = harness.add(&TestFixtures::weekly_three());

    harness
        .run_success(&["delete", &id])
        .stdout(predicate::str::contains("Deletion cancelled"));
    harness
        .run_success(&["delete", &id, "--force"])
        .stdout(predicate::str::contains("Deleted task"));
    harness
        .run_success(&JANUARY)
        .stdout(predicate::str::contains("Nothing scheduled"));
    harness
        .run_failure(&["delete", &id, "--force"])
        .stderr(predicate::str::contains("No task found"));
}

#[test]
fn test_ambiguous_and_short_ids() {
    let harness = CliTestHarness::new();
    harness.add(&["Buy milk"]);

    harness
        .run_failure(&["done", "a"])
        .stderr(predicate::str::contains("at least 2 characters"));
}

#[test]
fn test_list_management_cascades() {
    let harness = CliTestHarness::new();
    harness.run_success(&["lists", "add", "Work"]);
    harness.add(&["Report", "--list", "Work"]);
    harness.add(&["Buy milk"]);

    harness
        .run_failure(&["lists", "add", "Work"])
        .stderr(predicate::str::contains("already exists"));
    harness.run_success(&["lists", "color", "Work", "#3B82F6"]);

    let shown = harness.stdout(&["lists", "show"]);
    assert!(shown.contains("Inbox"));
    assert!(shown.contains("#3b82f6"));

    harness
        .run_success(&["lists", "rename", "Work", "Office"])
        .stdout(predicate::str::contains("1 task moved"));
    let board = harness.stdout(&["list"]);
    assert!(board.contains("Office (1)"));
    assert!(!board.contains("Work"));

    harness
        .run_success(&["lists", "delete", "Office", "--force"])
        .stdout(predicate::str::contains("and 1 task"));
    let board = harness.stdout(&["list"]);
    assert!(!board.contains("Report"));
    assert!(board.contains("Buy milk"));

    harness
        .run_failure(&["lists", "delete", "Nowhere", "--force"])
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_config_file_selects_user_partition() {
    let harness = CliTestHarness::new();
    harness.add(&["Buy milk"]);

    fs::write(harness.dir().join("cadence.toml"), "user = \"someone-else\"\n").unwrap();
    let board = harness.stdout(&["list"]);
    assert!(!board.contains("Buy milk"));

    harness
        .command()
        .env("CADENCE_USER", "default")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Buy milk"));
    assert!(harness.db_path().exists());
}
