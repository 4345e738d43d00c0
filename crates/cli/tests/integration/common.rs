//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// A minimal valid Go program.
pub const HELLO_GO: &str = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"hello\")\n}\n";

/// Source the fake toolchain rejects.
pub const BROKEN_GO: &str = "package main\n\nfunc main() {\n\tSYNTAX_ERROR\n";

/// Stand-in for `go`. `mod tidy` always succeeds; `build` fails when the
/// source contains SYNTAX_ERROR and otherwise writes a small file named
/// after the module.
#[cfg(unix)]
const FAKE_GO: &str = r#"#!/bin/sh
case "$1" in
  mod) exit 0 ;;
  build)
    if grep -q SYNTAX_ERROR main.go; then
      echo "./main.go:5:1: syntax error: unexpected EOF, expected }" >&2
      exit 1
    fi
    if [ "$2" != "-o" ]; then
      echo "missing -o" >&2
      exit 3
    fi
    printf 'FAKEBIN %s/%s\n' "$GOOS" "$GOARCH" > "$3"
    exit 0
    ;;
esac
exit 2
"#;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the config file, the
/// workspace root, the fake toolchain and any source files.
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
}

impl TestEnv {
  /// Create an environment whose config points at the fake toolchain.
  #[cfg(unix)]
  pub fn with_fake_toolchain() -> Self {
    use std::os::unix::fs::PermissionsExt;

    let env = Self::empty();
    let program = env.temp.path().join("go");
    std::fs::write(&program, FAKE_GO).unwrap();
    std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

    let config = format!(
      "[workspace]\nroot = '{}'\n\n[toolchain]\nprogram = '{}'\ntimeout_secs = 10\n",
      env.workspace_root().display(),
      program.display()
    );
    std::fs::write(&env.config_path, config).unwrap();
    env
  }

  /// Create an environment with only a workspace root configured.
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("config.toml");
    let root = temp.path().join("workspaces");
    std::fs::write(&config_path, format!("[workspace]\nroot = '{}'\n", root.display())).unwrap();
    Self { temp, config_path }
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Workspace root used by this environment's config.
  pub fn workspace_root(&self) -> PathBuf {
    self.temp.path().join("workspaces")
  }

  /// Number of entries under the workspace root.
  pub fn workspace_count(&self) -> usize {
    std::fs::read_dir(self.workspace_root()).map(|d| d.count()).unwrap_or(0)
  }

  /// Get a pre-configured Command for the buildbox binary.
  ///
  /// Runs inside the temp directory with this environment's config.
  pub fn buildbox_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("buildbox");
    cmd.current_dir(self.temp.path());
    cmd.arg("--config").arg(&self.config_path);
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
