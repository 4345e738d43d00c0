//! The per-request build pipeline.
//!
//! [`BuildService`] ties the pieces together: admission control, workspace
//! provisioning, toolchain execution and workspace cleanup. One service is
//! shared by all requests; each call to [`BuildService::build`] gets its own
//! workspace and shares nothing else but the admission semaphore.

use std::time::{Duration, Instant};

use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info, warn};

use crate::build::{BuildError, BuildExecutor, BuildOutcome};
use crate::config::{Config, LimitsConfig};
use crate::request::BuildRequest;
use crate::workspace::{Workspace, WorkspaceId, WorkspaceProvisioner};

/// A finished build.
#[derive(Debug, Clone)]
pub struct BuildReport {
  /// Workspace the build ran in.
  pub id: WorkspaceId,
  pub outcome: BuildOutcome,
  /// Time from admission to completion, queueing included.
  pub elapsed: Duration,
}

pub struct BuildService {
  provisioner: WorkspaceProvisioner,
  executor: BuildExecutor,
  permits: Semaphore,
  limits: LimitsConfig,
  retain: bool,
}

impl BuildService {
  pub fn new(config: &Config) -> Self {
    let provisioner = WorkspaceProvisioner::new(&config.workspace.root)
      .with_module_prefix(&config.toolchain.module_prefix)
      .with_go_version(&config.toolchain.go_version);

    Self::from_parts(
      provisioner,
      BuildExecutor::new(config.toolchain.clone()),
      config.limits.clone(),
      config.workspace.retain,
    )
  }

  pub fn from_parts(
    provisioner: WorkspaceProvisioner,
    executor: BuildExecutor,
    limits: LimitsConfig,
    retain: bool,
  ) -> Self {
    Self {
      provisioner,
      executor,
      permits: Semaphore::new(limits.max_concurrent_builds),
      limits,
      retain,
    }
  }

  pub fn provisioner(&self) -> &WorkspaceProvisioner {
    &self.provisioner
  }

  /// Build slots not currently in use.
  pub fn available_slots(&self) -> usize {
    self.permits.available_permits()
  }

  /// Run one build from request to outcome.
  ///
  /// Validation and admission happen before anything touches the
  /// filesystem. The workspace is removed on every path unless the service
  /// retains workspaces; if this future is dropped mid-build, the toolchain
  /// process is killed and the workspace removed on drop.
  pub async fn build(&self, request: &BuildRequest) -> Result<BuildReport, BuildError> {
    let started = Instant::now();

    request.check_source_size(self.limits.max_source_bytes)?;

    let _permit = self.acquire_slot().await?;

    let workspace = self.provisioner.provision(request).await?;
    let id = workspace.id();

    let result = self.executor.execute(&workspace, request).await;
    self.release(workspace).await;

    let outcome = result?;
    let elapsed = started.elapsed();

    info!(
      id = %id,
      target = %request.platform(),
      bin = %request.binary_name(),
      success = outcome.is_success(),
      elapsed_ms = elapsed.as_millis() as u64,
      "build finished"
    );

    Ok(BuildReport { id, outcome, elapsed })
  }

  async fn acquire_slot(&self) -> Result<SemaphorePermit<'_>, BuildError> {
    let waited = self.limits.queue_timeout();

    match tokio::time::timeout(waited, self.permits.acquire()).await {
      Ok(Ok(permit)) => Ok(permit),
      // The semaphore is never closed, treat it like a full queue anyway.
      Ok(Err(_)) | Err(_) => {
        warn!(waited = ?waited, "no build slot available, rejecting request");
        Err(BuildError::Busy { waited })
      }
    }
  }

  async fn release(&self, workspace: Workspace) {
    let id = workspace.id();
    if self.retain {
      let path = workspace.keep();
      debug!(id = %id, path = %path.display(), "workspace retained");
    } else if let Err(e) = workspace.remove().await {
      warn!(id = %id, error = %e, "failed to remove workspace");
    }
  }
}
