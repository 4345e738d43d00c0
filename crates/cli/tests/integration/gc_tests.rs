use std::time::Duration;

use predicates::prelude::*;

use super::common::TestEnv;

fn make_workspace(env: &TestEnv) -> std::path::PathBuf {
  let name = buildbox_lib::WorkspaceId::new().to_string();
  let path = env.write_file(&format!("workspaces/{name}/main.go"), "package main\n");
  path.parent().unwrap().to_path_buf()
}

#[test]
fn gc_with_no_root_succeeds() {
  let env = TestEnv::empty();

  env
    .buildbox_cmd()
    .arg("gc")
    .assert()
    .success()
    .stdout(predicate::str::contains("Workspace sweep complete"));
}

#[test]
fn gc_dry_run_reports_without_deleting() {
  let env = TestEnv::empty();
  let workspace = make_workspace(&env);
  std::thread::sleep(Duration::from_millis(50));

  env
    .buildbox_cmd()
    .args(["gc", "--dry-run", "--retention", "0s"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Dry run"))
    .stdout(predicate::str::contains("Workspaces removed: 1"));

  assert!(workspace.exists());
}

#[test]
fn gc_removes_expired_workspaces() {
  let env = TestEnv::empty();
  let workspace = make_workspace(&env);
  let foreign = env.write_file("workspaces/keep-me/file.txt", "not a workspace");
  std::thread::sleep(Duration::from_millis(50));

  env
    .buildbox_cmd()
    .args(["gc", "--retention", "0s"])
    .assert()
    .success();

  assert!(!workspace.exists());
  assert!(foreign.exists());
}

#[test]
fn gc_keeps_fresh_workspaces() {
  let env = TestEnv::empty();
  let workspace = make_workspace(&env);

  env.buildbox_cmd().arg("gc").assert().success();

  assert!(workspace.exists());
}

#[test]
fn gc_json_output_is_valid() {
  let env = TestEnv::empty();

  let output = env
    .buildbox_cmd()
    .args(["gc", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("workspaces_deleted"))
    .stdout(predicate::str::contains("deleted_paths"))
    .get_output()
    .stdout
    .clone();

  let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
  assert_eq!(value["stats"]["workspaces_deleted"], 0);
}
