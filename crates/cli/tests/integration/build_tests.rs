#![cfg(unix)]

use predicates::prelude::*;

use super::common::{BROKEN_GO, HELLO_GO, TestEnv};

#[test]
fn build_writes_binary_to_current_dir() {
  let env = TestEnv::with_fake_toolchain();
  let source = env.write_file("src/hello.go", HELLO_GO);

  env
    .buildbox_cmd()
    .arg("build")
    .arg(&source)
    .args(["--os", "linux", "--arch", "arm64"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Built"))
    .stdout(predicate::str::contains("linux/arm64"))
    .stdout(predicate::str::contains("SHA-256"));

  // The binary name defaults to the source file stem.
  let binary = env.temp.path().join("hello");
  assert_eq!(std::fs::read_to_string(binary).unwrap(), "FAKEBIN linux/arm64\n");
  assert_eq!(env.workspace_count(), 0);
}

#[test]
fn build_for_windows_adds_exe_suffix() {
  let env = TestEnv::with_fake_toolchain();
  let source = env.write_file("main.go", HELLO_GO);
  let out_dir = env.temp.path().join("dist");
  std::fs::create_dir_all(&out_dir).unwrap();

  env
    .buildbox_cmd()
    .arg("build")
    .arg(&source)
    .args(["--os", "windows", "--arch", "amd64", "--bin", "tool"])
    .arg("--out")
    .arg(&out_dir)
    .assert()
    .success();

  assert_eq!(
    std::fs::read_to_string(out_dir.join("tool.exe")).unwrap(),
    "FAKEBIN windows/amd64\n"
  );
}

#[test]
fn build_to_explicit_file() {
  let env = TestEnv::with_fake_toolchain();
  let source = env.write_file("main.go", HELLO_GO);
  let out = env.temp.path().join("renamed-binary");

  env
    .buildbox_cmd()
    .arg("build")
    .arg(&source)
    .args(["--os", "darwin", "--arch", "arm64", "--bin", "app", "-o"])
    .arg(&out)
    .assert()
    .success();

  assert!(out.is_file());
  assert!(!env.temp.path().join("app").exists());
}

#[test]
fn compile_failure_prints_diagnostics_and_exits_nonzero() {
  let env = TestEnv::with_fake_toolchain();
  let source = env.write_file("main.go", BROKEN_GO);

  env
    .buildbox_cmd()
    .arg("build")
    .arg(&source)
    .args(["--os", "linux", "--arch", "amd64", "--bin", "broken"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("syntax error"))
    .stderr(predicate::str::contains("compilation failed"));

  assert!(!env.temp.path().join("broken").exists());
  assert_eq!(env.workspace_count(), 0);
}

#[test]
fn retained_workspace_is_left_for_gc() {
  let env = TestEnv::with_fake_toolchain();
  let source = env.write_file("main.go", HELLO_GO);
  let mut config = std::fs::read_to_string(&env.config_path).unwrap();
  config = config.replace("[workspace]\n", "[workspace]\nretain = true\n");
  std::fs::write(&env.config_path, config).unwrap();

  env
    .buildbox_cmd()
    .arg("build")
    .arg(&source)
    .args(["--os", "linux", "--arch", "amd64", "--bin", "app"])
    .assert()
    .success();

  assert_eq!(env.workspace_count(), 1);

  std::thread::sleep(std::time::Duration::from_millis(50));
  env
    .buildbox_cmd()
    .args(["gc", "--retention", "0s"])
    .assert()
    .success();

  assert_eq!(env.workspace_count(), 0);
}
