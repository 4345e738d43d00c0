//! Implementation of the `buildbox build` command.
//!
//! Runs one build through the same pipeline the HTTP service uses and writes
//! the resulting binary to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use buildbox_lib::{Arch, BuildOutcome, BuildRequest, BuildService, Config, Os};

use crate::output::{Stats, format_bytes, format_duration, print_diagnostics, print_error, print_success};

pub struct BuildArgs {
  pub source: PathBuf,
  pub os: Option<String>,
  pub arch: Option<String>,
  pub bin: Option<String>,
  pub out: Option<PathBuf>,
}

/// Execute the build command.
///
/// Target os/arch default to the host and the binary name defaults to the
/// source file stem. A compile failure prints the toolchain diagnostics and
/// returns an error so the process exits non-zero.
pub fn cmd_build(config: &Config, args: BuildArgs) -> Result<()> {
  let source_text =
    std::fs::read_to_string(&args.source).with_context(|| format!("Failed to read {}", args.source.display()))?;

  let os = match args.os {
    Some(os) => os,
    None => Os::current()
      .map(|os| os.to_string())
      .context("Host OS is not a known Go target, pass --os")?,
  };
  let arch = match args.arch {
    Some(arch) => arch,
    None => Arch::current()
      .map(|arch| arch.to_string())
      .context("Host architecture is not a known Go target, pass --arch")?,
  };
  let bin = match args.bin {
    Some(bin) => bin,
    None => default_bin_name(&args.source)?,
  };

  let request = BuildRequest::new(source_text, &os, &arch, &bin)?;
  let service = BuildService::new(config);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(service.build(&request)).context("Build failed")?;

  match report.outcome {
    BuildOutcome::Artifact(artifact) => {
      let dest = destination(args.out.as_deref(), artifact.file_name());
      write_binary(&dest, &artifact.bytes)?;
      let shown = dunce::canonicalize(&dest).unwrap_or(dest);

      println!();
      print_success(&format!("Built {}", shown.display()));
      Stats::new()
        .row("Target", request.platform())
        .row("Size", format_bytes(artifact.bytes.len() as u64))
        .row("SHA-256", artifact.sha256())
        .row("Build", report.id)
        .row("Duration", format_duration(report.elapsed))
        .print();
      Ok(())
    }
    BuildOutcome::Failure { diagnostic_text } => {
      print_error(&format!(
        "Build of {} for {} failed",
        request.binary_name(),
        request.platform()
      ));
      print_diagnostics(&diagnostic_text);
      bail!("compilation failed")
    }
  }
}

fn default_bin_name(source: &Path) -> Result<String> {
  source
    .file_stem()
    .and_then(|stem| stem.to_str())
    .map(str::to_string)
    .context("Cannot derive a binary name from the source path, pass --bin")
}

/// An existing directory receives the artifact under its own name; anything
/// else is taken as the file path.
fn destination(out: Option<&Path>, file_name: &str) -> PathBuf {
  match out {
    Some(out) if out.is_dir() => out.join(file_name),
    Some(out) => out.to_path_buf(),
    None => PathBuf::from(file_name),
  }
}

fn write_binary(path: &Path, bytes: &[u8]) -> Result<()> {
  std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;

  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
      .with_context(|| format!("Failed to mark {} executable", path.display()))?;
  }

  Ok(())
}
