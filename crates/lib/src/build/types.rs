//! Types for toolchain execution.
//!
//! This module defines the outcome of a build, the infrastructure errors that
//! can abort one, and the toolchain configuration.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::request::ValidationError;
use crate::util::hash::{ContentHash, hash_bytes};
use crate::workspace::{DEFAULT_GO_VERSION, DEFAULT_MODULE_PREFIX, WorkspaceError};

/// Errors that abort a build without producing a [`BuildOutcome`].
///
/// A compile failure is not one of these: it is an expected outcome and is
/// reported as [`BuildOutcome::Failure`].
#[derive(Debug, Error)]
pub enum BuildError {
  /// The request was rejected before any work was done.
  #[error(transparent)]
  Validation(#[from] ValidationError),

  /// The workspace could not be created or populated.
  #[error(transparent)]
  Workspace(#[from] WorkspaceError),

  /// The toolchain reported success but the artifact is not there.
  #[error("toolchain succeeded but no artifact was found at {}", path.display())]
  ArtifactMissing { path: PathBuf },

  /// The toolchain did not finish in time and was killed.
  #[error("build did not finish within {after:?}")]
  Timeout { after: Duration },

  /// The toolchain binary could not be started.
  #[error("failed to start toolchain {}: {source}", program.display())]
  Spawn { program: PathBuf, source: io::Error },

  /// No build slot became free in time.
  #[error("all build slots are busy, waited {waited:?}")]
  Busy { waited: Duration },

  /// I/O error while talking to the toolchain or reading the artifact.
  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

/// A compiled binary, read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  /// Where the toolchain wrote the binary.
  pub path: PathBuf,
  /// The binary's contents, unmodified.
  pub bytes: Vec<u8>,
}

impl Artifact {
  /// File name of the artifact (e.g. `app.exe`).
  pub fn file_name(&self) -> &str {
    self.path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
  }

  pub fn sha256(&self) -> ContentHash {
    hash_bytes(&self.bytes)
  }
}

/// Result of one toolchain run: exactly one of artifact or diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
  Artifact(Artifact),
  Failure { diagnostic_text: String },
}

impl BuildOutcome {
  pub fn is_success(&self) -> bool {
    matches!(self, BuildOutcome::Artifact(_))
  }

  pub fn artifact_path(&self) -> Option<&Path> {
    match self {
      BuildOutcome::Artifact(artifact) => Some(&artifact.path),
      BuildOutcome::Failure { .. } => None,
    }
  }
}

/// Toolchain settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
  /// The `go` binary to run. Resolved through `PATH` when not absolute.
  pub program: PathBuf,

  /// Module path prefix written to `go.mod`.
  pub module_prefix: String,

  /// Go language version written to `go.mod`.
  pub go_version: String,

  /// Upper bound for both toolchain steps together, in seconds.
  pub timeout_secs: u64,

  /// Extra environment for the toolchain. `GOOS` and `GOARCH` always
  /// come from the request and cannot be overridden here.
  pub env: BTreeMap<String, String>,
}

impl ToolchainConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

impl Default for ToolchainConfig {
  fn default() -> Self {
    Self {
      program: PathBuf::from("go"),
      module_prefix: DEFAULT_MODULE_PREFIX.to_string(),
      go_version: DEFAULT_GO_VERSION.to_string(),
      timeout_secs: 300,
      env: BTreeMap::from([("CGO_ENABLED".to_string(), "0".to_string())]),
    }
  }
}
