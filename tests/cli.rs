//! End-to-end tests of the `refkeep` binary.

mod common;

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

use common::{TestRepo, REPO_UID};

fn refkeep() -> Command {
    Command::cargo_bin("refkeep").unwrap()
}

/// Write a config file pointing at the fixture's directories.
fn config_file(repo: &TestRepo) -> PathBuf {
    let config = repo.config();
    let path = repo.work_path().join("refkeep.toml");
    let contents = format!(
        "repos_root = {:?}\ntmp_dir = {:?}\n",
        config.repos_root().display().to_string(),
        config.tmp_dir().display().to_string(),
    );
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn help_lists_commands() {
    refkeep()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("get-ref"))
        .stdout(predicate::str::contains("update-ref"))
        .stdout(predicate::str::contains("list-tags"))
        .stdout(predicate::str::contains("diff"));
}

#[test]
fn get_ref_prints_sha() {
    let repo = TestRepo::new();
    let head = repo.work_rev("main");

    refkeep()
        .arg("--config")
        .arg(config_file(&repo))
        .args(["get-ref", REPO_UID, "main"])
        .assert()
        .success()
        .stdout(format!("{head}\n"));
}

#[test]
fn missing_ref_fails() {
    let repo = TestRepo::new();

    refkeep()
        .arg("--config")
        .arg(config_file(&repo))
        .args(["get-ref", REPO_UID, "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ref not found"));
}

#[test]
fn update_then_list_tags_as_json() {
    let repo = TestRepo::new();
    let head = repo.work_rev("main");
    let config = config_file(&repo);

    refkeep()
        .arg("--config")
        .arg(&config)
        .args(["update-ref", REPO_UID, "v1", "--type", "tag", "--new", head.as_str()])
        .args(["--actor-name", "Ada", "--actor-email", "ada@example.com"])
        .assert()
        .success();

    let output = refkeep()
        .arg("--config")
        .arg(&config)
        .args(["list-tags", REPO_UID])
        .output()
        .unwrap();
    assert!(output.status.success());

    let tags: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tags[0]["name"], "v1");
    assert_eq!(tags[0]["sha"], head.as_str());
    assert_eq!(tags[0]["is_annotated"], false);
}

#[test]
fn invalid_sha_is_rejected_by_parser() {
    refkeep()
        .args(["update-ref", REPO_UID, "main", "--new", "not-a-sha"])
        .args(["--actor-name", "Ada", "--actor-email", "ada@example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid object id"));
}
