//! Test utilities for buildbox-lib.
//!
//! Provides a fake `go` toolchain so the build pipeline can be exercised
//! without a Go installation. The fake understands `mod tidy` and `build`
//! and changes behavior based on markers in `main.go`:
//!
//! - `SYNTAX_ERROR`: `build` prints a compiler-style error and exits 1
//! - `TIDY_ERROR`: `mod tidy` prints an error and exits 1
//! - `NO_OUTPUT`: `build` exits 0 without writing the binary
//! - `SLEEP`: `build` sleeps for 30 seconds
//!
//! `build` writes to the `-o` path when one is passed, and otherwise names
//! the binary the way `go build` does.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tempfile::TempDir;

use crate::build::ToolchainConfig;

/// A minimal valid Go program.
pub const HELLO_GO: &str = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"hello\")\n}\n";

/// Source the fake toolchain rejects with a syntax error.
pub const BROKEN_GO: &str = "package main\n\nfunc main() {\n\tSYNTAX_ERROR\n";

#[cfg(unix)]
const FAKE_GO: &str = r##"#!/bin/sh
case "$1" in
  mod)
    if grep -q TIDY_ERROR main.go; then
      echo "go: finding module for package example.com/missing" >&2
      echo "main.go:4:2: no required module provides package example.com/missing" >&2
      exit 1
    fi
    echo "go: tidy ok"
    exit 0
    ;;
  build)
    if grep -q SYNTAX_ERROR main.go; then
      echo "# buildbox.local/app"
      echo "./main.go:5:1: syntax error: unexpected EOF, expected }" >&2
      exit 1
    fi
    if grep -q SLEEP main.go; then
      exec sleep 30
    fi
    if grep -q NO_OUTPUT main.go; then
      exit 0
    fi
    if [ "$2" = "-o" ]; then
      out="$3"
    else
      # Default naming drops a trailing major-version element.
      out=$(sed -n 's|^module ||p' go.mod | sed 's|/v[0-9][0-9]*$||; s|.*/||')
      if [ "$GOOS" = "windows" ]; then out="$out.exe"; fi
    fi
    printf 'FAKEBIN %s/%s\n' "$GOOS" "$GOARCH" > "$out"
    exit 0
    ;;
esac
echo "unknown command $1" >&2
exit 2
"##;

/// Path to the fake `go` script, written once per test process.
#[cfg(unix)]
pub fn fake_go() -> &'static Path {
  use std::os::unix::fs::PermissionsExt;

  static FAKE: OnceLock<(TempDir, PathBuf)> = OnceLock::new();

  let (_, path) = FAKE.get_or_init(|| {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("go");
    std::fs::write(&path, FAKE_GO).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    (dir, path)
  });
  path
}

/// Toolchain config pointing at the fake `go`.
#[cfg(unix)]
pub fn fake_toolchain() -> ToolchainConfig {
  ToolchainConfig {
    program: fake_go().to_path_buf(),
    timeout_secs: 10,
    ..ToolchainConfig::default()
  }
}
