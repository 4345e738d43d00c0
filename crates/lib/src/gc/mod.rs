//! Workspace reaper.
//!
//! Workspaces are normally removed right after their build. Anything left
//! behind (retained workspaces, crashes, failed removals) is swept here once
//! it is older than the retention window.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use std::{fs, io};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::workspace::WorkspaceId;

#[derive(Debug, Error)]
pub enum GcError {
  #[error("failed to read workspace root {}: {source}", path.display())]
  ReadRoot { path: PathBuf, source: io::Error },
}

#[derive(Debug, Default, serde::Serialize)]
pub struct GcStats {
  pub workspaces_scanned: usize,
  pub workspaces_deleted: usize,
  pub bytes_freed: u64,
}

#[derive(Debug, serde::Serialize)]
pub struct GcResult {
  pub stats: GcStats,
  pub deleted_paths: Vec<PathBuf>,
}

fn dir_size(path: &Path) -> u64 {
  WalkDir::new(path)
    .into_iter()
    .filter_map(|e| e.ok())
    .filter(|e| e.file_type().is_file())
    .filter_map(|e| e.metadata().ok())
    .map(|m| m.len())
    .sum()
}

fn is_workspace_dir(path: &Path) -> bool {
  path
    .file_name()
    .and_then(|n| n.to_str())
    .is_some_and(|name| name.parse::<WorkspaceId>().is_ok())
}

/// Delete workspaces under `root` older than `retention`.
///
/// Only directories named like a workspace id are considered; anything else
/// under the root is left alone. A missing root is not an error.
pub fn collect_garbage(root: &Path, retention: Duration, dry_run: bool) -> Result<GcResult, GcError> {
  collect_garbage_at(root, retention, dry_run, SystemTime::now())
}

fn collect_garbage_at(root: &Path, retention: Duration, dry_run: bool, now: SystemTime) -> Result<GcResult, GcError> {
  let mut stats = GcStats::default();
  let mut deleted_paths = Vec::new();

  if root.exists() {
    sweep_workspaces(root, retention, dry_run, now, &mut stats, &mut deleted_paths)?;
  }

  info!(
    scanned = stats.workspaces_scanned,
    deleted = stats.workspaces_deleted,
    bytes_freed = stats.bytes_freed,
    dry_run,
    "workspace sweep complete"
  );

  Ok(GcResult { stats, deleted_paths })
}

fn sweep_workspaces(
  root: &Path,
  retention: Duration,
  dry_run: bool,
  now: SystemTime,
  stats: &mut GcStats,
  deleted_paths: &mut Vec<PathBuf>,
) -> Result<(), GcError> {
  let entries = fs::read_dir(root).map_err(|e| GcError::ReadRoot {
    path: root.to_path_buf(),
    source: e,
  })?;

  for entry in entries.flatten() {
    let path = entry.path();
    if !path.is_dir() || !is_workspace_dir(&path) {
      continue;
    }

    stats.workspaces_scanned += 1;

    let modified = match entry.metadata().and_then(|m| m.modified()) {
      Ok(modified) => modified,
      Err(e) => {
        warn!(path = %path.display(), error = %e, "cannot read workspace age, skipping");
        continue;
      }
    };

    // Timestamps in the future count as brand new.
    let age = now.duration_since(modified).unwrap_or_default();
    if age <= retention {
      continue;
    }

    let size = dir_size(&path);
    debug!(path = %path.display(), age = ?age, "removing expired workspace");

    if dry_run {
      stats.workspaces_deleted += 1;
      stats.bytes_freed += size;
      deleted_paths.push(path);
    } else {
      match fs::remove_dir_all(&path) {
        Ok(()) => {
          stats.workspaces_deleted += 1;
          stats.bytes_freed += size;
          deleted_paths.push(path);
        }
        Err(e) => {
          warn!(path = %path.display(), error = %e, "failed to delete workspace");
        }
      }
    }
  }

  Ok(())
}
