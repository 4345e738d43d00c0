//! Service configuration.
//!
//! Loaded from a TOML file; every field has a default so an empty or
//! missing file yields a working configuration. Durations are in seconds.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::build::ToolchainConfig;
use crate::platform::paths::{default_config_file, default_workspace_root};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse config {}: {source}", path.display())]
  Parse { path: PathBuf, source: toml::de::Error },

  #[error("invalid config: {0}")]
  Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub server: ServerConfig,
  pub workspace: WorkspaceConfig,
  pub toolchain: ToolchainConfig,
  pub limits: LimitsConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub listen_addr: SocketAddr,

  /// Maximum request body size in bytes
  pub max_body_size: usize,

  /// Allow cross-origin requests from any origin
  pub cors: bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      listen_addr: SocketAddr::from(([0, 0, 0, 0], 9000)),
      max_body_size: 2 * 1024 * 1024,
      cors: true,
    }
  }
}

/// Where workspaces live and how long leftovers are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
  pub root: PathBuf,

  /// Keep workspaces after the response instead of deleting them
  pub retain: bool,

  /// Age after which the reaper deletes a workspace
  pub retention_secs: u64,

  /// How often the server runs the reaper
  pub sweep_interval_secs: u64,
}

impl WorkspaceConfig {
  pub fn retention(&self) -> Duration {
    Duration::from_secs(self.retention_secs)
  }

  pub fn sweep_interval(&self) -> Duration {
    Duration::from_secs(self.sweep_interval_secs)
  }
}

impl Default for WorkspaceConfig {
  fn default() -> Self {
    Self {
      root: default_workspace_root(),
      retain: false,
      retention_secs: 3600,
      sweep_interval_secs: 600,
    }
  }
}

/// Admission control and input limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
  /// Builds allowed to run at the same time
  pub max_concurrent_builds: usize,

  /// How long a request waits for a free build slot; 0 rejects immediately
  pub queue_timeout_secs: u64,

  /// Largest accepted source text in bytes
  pub max_source_bytes: usize,
}

impl LimitsConfig {
  pub fn queue_timeout(&self) -> Duration {
    Duration::from_secs(self.queue_timeout_secs)
  }
}

impl Default for LimitsConfig {
  fn default() -> Self {
    Self {
      max_concurrent_builds: num_cpus(),
      queue_timeout_secs: 30,
      max_source_bytes: 1024 * 1024,
    }
  }
}

/// Get the number of CPUs for the default build concurrency.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

impl Config {
  /// Load configuration.
  ///
  /// An explicit path must exist. Without one, the default config file is
  /// used if present, otherwise built-in defaults.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let path = match path {
      Some(path) => path.to_path_buf(),
      None => match default_config_file().filter(|p| p.is_file()) {
        Some(path) => path,
        None => {
          debug!("no config file found, using defaults");
          return Ok(Self::default());
        }
      },
    };

    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read {
      path: path.clone(),
      source: e,
    })?;

    let config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
      path: path.clone(),
      source: e,
    })?;

    debug!(path = %path.display(), "loaded config");
    Ok(config)
  }

  /// Check cross-field invariants.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.limits.max_concurrent_builds == 0 {
      return Err(ConfigError::Invalid("limits.max_concurrent_builds must be at least 1".into()));
    }
    if self.limits.max_source_bytes == 0 {
      return Err(ConfigError::Invalid("limits.max_source_bytes must be at least 1".into()));
    }
    if self.server.max_body_size < self.limits.max_source_bytes {
      return Err(ConfigError::Invalid(
        "server.max_body_size must not be smaller than limits.max_source_bytes".into(),
      ));
    }
    if self.toolchain.timeout_secs == 0 {
      return Err(ConfigError::Invalid("toolchain.timeout_secs must be at least 1".into()));
    }
    if self.workspace.sweep_interval_secs == 0 {
      return Err(ConfigError::Invalid("workspace.sweep_interval_secs must be at least 1".into()));
    }

    // The reaper must never see a workspace that is still in use.
    let longest_build = self.toolchain.timeout_secs + self.limits.queue_timeout_secs;
    if self.workspace.retention_secs <= longest_build {
      return Err(ConfigError::Invalid(format!(
        "workspace.retention_secs ({}) must exceed toolchain.timeout_secs + limits.queue_timeout_secs ({})",
        self.workspace.retention_secs, longest_build
      )));
    }

    Ok(())
  }
}
