//! Toolchain invocation.
//!
//! Runs `go mod tidy` and `go build` inside a provisioned workspace with the
//! request's target platform in `GOOS`/`GOARCH`, then classifies the result.

use std::process::{ExitStatus, Stdio};

use tokio::fs;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::build::output::CombinedOutput;
use crate::build::types::{Artifact, BuildError, BuildOutcome, ToolchainConfig};
use crate::request::BuildRequest;
use crate::workspace::Workspace;

/// One toolchain invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
  name: &'static str,
  args: &'static [&'static str],
  /// Append `-o <artifact>` so the output path does not depend on how the
  /// toolchain derives a name from the module path (`.../v2` is skipped).
  names_artifact: bool,
}

/// Dependency resolution, then compilation. Both must succeed.
const STEPS: &[Step] = &[
  Step {
    name: "resolve",
    args: &["mod", "tidy"],
    names_artifact: false,
  },
  Step {
    name: "compile",
    args: &["build"],
    names_artifact: true,
  },
];

/// Runs the toolchain against workspaces.
#[derive(Debug, Clone)]
pub struct BuildExecutor {
  config: ToolchainConfig,
}

impl BuildExecutor {
  pub fn new(config: ToolchainConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &ToolchainConfig {
    &self.config
  }

  /// Build the workspace for the request's target.
  ///
  /// Returns `Failure` with the combined toolchain output when a step exits
  /// non-zero, and `Artifact` when both steps succeed and the binary exists.
  /// The run is attempted once and is bounded by the configured timeout;
  /// dropping the returned future kills the running toolchain process.
  pub async fn execute(&self, workspace: &Workspace, request: &BuildRequest) -> Result<BuildOutcome, BuildError> {
    let timeout = self.config.timeout();

    match tokio::time::timeout(timeout, self.run(workspace, request)).await {
      Ok(result) => result,
      Err(_) => {
        warn!(id = %workspace.id(), timeout = ?timeout, "toolchain timed out, killed");
        Err(BuildError::Timeout { after: timeout })
      }
    }
  }

  async fn run(&self, workspace: &Workspace, request: &BuildRequest) -> Result<BuildOutcome, BuildError> {
    let mut output = CombinedOutput::new();

    for step in STEPS {
      let status = self.run_step(step, workspace, request, &mut output).await?;

      if !status.success() {
        info!(
          id = %workspace.id(),
          step = step.name,
          code = ?status.code(),
          "toolchain step failed"
        );
        debug!(output = %output.to_text(), "toolchain output");
        return Ok(BuildOutcome::Failure {
          diagnostic_text: diagnostic_text(&output, step, status),
        });
      }
    }

    if !output.is_empty() {
      debug!(output = %output.to_text(), "toolchain output");
    }

    let path = workspace.root().join(request.artifact_file_name());

    match fs::read(&path).await {
      Ok(bytes) => {
        debug!(path = %path.display(), size = bytes.len(), "artifact produced");
        Ok(BuildOutcome::Artifact(Artifact { path, bytes }))
      }
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        error!(
          id = %workspace.id(),
          path = %path.display(),
          "toolchain reported success but produced no artifact"
        );
        Err(BuildError::ArtifactMissing { path })
      }
      Err(e) => Err(BuildError::Io(e)),
    }
  }

  async fn run_step(
    &self,
    step: &Step,
    workspace: &Workspace,
    request: &BuildRequest,
    output: &mut CombinedOutput,
  ) -> Result<ExitStatus, BuildError> {
    let mut command = Command::new(&self.config.program);
    command.args(step.args);
    if step.names_artifact {
      command.arg("-o").arg(request.artifact_file_name());
    }
    command
      .current_dir(workspace.root())
      .envs(&self.config.env)
      .env("GOOS", request.target_os().as_str())
      .env("GOARCH", request.target_arch().as_str())
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);

    debug!(
      id = %workspace.id(),
      step = step.name,
      program = %self.config.program.display(),
      args = ?step.args,
      target = %request.platform(),
      "spawning toolchain"
    );

    let mut child = command.spawn().map_err(|e| BuildError::Spawn {
      program: self.config.program.clone(),
      source: e,
    })?;

    let stdout = child.stdout.take().ok_or_else(|| std::io::Error::other("stdout not captured"))?;
    let stderr = child.stderr.take().ok_or_else(|| std::io::Error::other("stderr not captured"))?;

    output.capture(stdout, stderr).await?;

    Ok(child.wait().await?)
  }
}

/// The captured output, or a short note when the step printed nothing
/// (e.g. it was killed by a signal).
fn diagnostic_text(output: &CombinedOutput, step: &Step, status: ExitStatus) -> String {
  if output.is_empty() {
    format!("{} step failed without output ({})", step.name, status)
  } else {
    output.to_text()
  }
}
