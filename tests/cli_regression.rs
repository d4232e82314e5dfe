// End-to-end checks of the markrun binary: output, exit codes, diagnostics.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn markrun() -> Command {
    let mut cmd = Command::cargo_bin("markrun").unwrap();
    cmd.arg("--color").arg("never").env_remove("MARKRUN_LOG");
    cmd
}

#[test]
fn runs_the_builtin_suite_by_area_label() {
    markrun()
        .args(["run", "-m", "hdfs_to_azure"])
        .assert()
        .success()
        .stdout(contains("Running HDFS to Azure - register_physical_dataset"))
        .stdout(contains("PASS TestHDFSToAzure::test_register_task_flows_sql"))
        .stdout(contains("Summary: total 5, passed 5, failed 0"));
}

#[test]
fn single_label_runs_one_case() {
    markrun()
        .args(["run", "-m", "register_schema"])
        .assert()
        .success()
        .stdout(contains("Running HDFS to Azure - register_schema"))
        .stdout(contains("register_task").not())
        .stdout(contains("Summary: total 1, passed 1, failed 0"));
}

#[test]
fn no_match_exits_with_code_5_by_default() {
    markrun()
        .args(["run", "-m", "register_task and register_schema"])
        .assert()
        .code(5)
        .stderr(contains("no cases matched"));
}

#[test]
fn unknown_label_is_a_usage_error() {
    markrun()
        .args(["run", "-m", "nonexistent_label"])
        .assert()
        .code(4)
        .stderr(contains("markrun::lookup::unknown_label"))
        .stdout(contains("Running HDFS").not());
}

#[test]
fn typo_inside_a_compound_expression_is_not_absorbed() {
    markrun()
        .args(["run", "-m", "register_schema or typo_label"])
        .assert()
        .code(4)
        .stderr(contains("typo_label"))
        .stdout(contains("Running HDFS").not());

    markrun()
        .args(["list", "-m", "register_schema or typo_label"])
        .assert()
        .code(4)
        .stderr(contains("markrun::lookup::unknown_label"));
}

#[test]
fn no_match_can_be_allowed() {
    markrun()
        .args(["run", "-m", "nonexistent_label", "--allow-empty"])
        .assert()
        .success()
        .stdout(contains("Summary: total 0, passed 0, failed 0"))
        .stdout(contains("% passed").not());
}

#[test]
fn allowed_typo_only_warns() {
    markrun()
        .args(["run", "-m", "register_schema or typo_label", "--allow-empty"])
        .assert()
        .success()
        .stdout(contains("Summary: total 1, passed 1, failed 0 (100.0% passed)"))
        .stderr(contains("typo_label"));
}

#[test]
fn unknown_case_id_is_a_usage_error() {
    markrun()
        .args(["run", "TestHDFSToAzure::test_missing"])
        .assert()
        .code(4)
        .stderr(contains("markrun::lookup::unknown_case"));
}

#[test]
fn bad_expression_points_at_the_problem() {
    markrun()
        .args(["run", "-m", "P1 and"])
        .assert()
        .code(4)
        .stderr(contains("markrun::select::invalid_expression"));
}

#[test]
fn failing_file_suite_exits_with_code_1() {
    markrun()
        .args([
            "run",
            "--no-builtin",
            "--suite-dir",
            "tests/fixtures/failing",
            "--no-live-output",
        ])
        .assert()
        .code(1)
        .stdout(contains("FAIL Mixed::red"))
        .stdout(contains("red ran"))
        .stdout(contains("Summary: total 2, passed 1, failed 1"));
}

#[test]
fn list_shows_ids_and_labels_without_running() {
    markrun()
        .args(["list", "-k", "schema"])
        .assert()
        .success()
        .stdout(contains(
            "TestHDFSToAzure::test_register_schema_sql  [P1, hdfs_to_azure, register_schema]",
        ))
        .stdout(contains("Running HDFS").not())
        .stdout(contains("1 of 5 cases selected"));
}

#[test]
fn labels_lists_counts() {
    markrun()
        .arg("labels")
        .assert()
        .success()
        .stdout(contains("hdfs_to_azure"))
        .stdout(contains("5 cases"))
        .stdout(contains("register_task_flows"));
}

#[test]
fn config_file_and_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("report.json");
    let config_path = dir.path().join("markrun.yaml");
    fs::write(
        &config_path,
        format!(
            "empty_selection: pass\nlive_output: false\nreport_json: {}\n",
            report_path.display()
        ),
    )
    .unwrap();

    markrun()
        .arg("--config")
        .arg(&config_path)
        .args(["run", "-m", "register_task or register_schema"])
        .assert()
        .success()
        .stdout(contains("Running HDFS").not());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["summary"]["total"], 2);
    assert_eq!(
        json["cases"][0]["id"],
        "TestHDFSToAzure::test_register_schema_sql"
    );
    assert_eq!(json["cases"][1]["output"][0], "Running HDFS to Azure - register_task");
}
