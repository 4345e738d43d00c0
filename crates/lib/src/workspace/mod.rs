//! Per-request build workspaces.
//!
//! Every build gets its own directory under the workspace root, named by a
//! random 128-bit id. The directory holds the submitted source, the module
//! descriptor, and whatever the toolchain writes while building.
//!
//! A [`Workspace`] owns its directory: it is removed by [`Workspace::remove`],
//! or on drop unless [`Workspace::keep`] was called.

mod descriptor;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::consts::{MODULE_FILENAME, SOURCE_FILENAME};
use crate::request::BuildRequest;

pub use descriptor::{DEFAULT_GO_VERSION, DEFAULT_MODULE_PREFIX, ModuleDescriptor};

#[derive(Debug, Error)]
pub enum WorkspaceError {
  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: io::Error },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: io::Error },
}

/// Unique identifier of a workspace (random UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkspaceId(Uuid);

impl WorkspaceId {
  pub fn new() -> Self {
    Self(Uuid::new_v4())
  }
}

impl Default for WorkspaceId {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for WorkspaceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.hyphenated())
  }
}

impl FromStr for WorkspaceId {
  type Err = uuid::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Uuid::parse_str(s).map(Self)
  }
}

/// An isolated directory holding one build's inputs and outputs.
#[derive(Debug)]
pub struct Workspace {
  id: WorkspaceId,
  root: PathBuf,
  keep: bool,
  removed: bool,
}

impl Workspace {
  pub fn id(&self) -> WorkspaceId {
    self.id
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn source_path(&self) -> PathBuf {
    self.root.join(SOURCE_FILENAME)
  }

  pub fn module_path(&self) -> PathBuf {
    self.root.join(MODULE_FILENAME)
  }

  /// Regular files directly inside the workspace, sorted by name.
  pub async fn list_files(&self) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(&self.root).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
      if entry.file_type().await?.is_file() {
        files.push(entry.path());
      }
    }
    files.sort();
    Ok(files)
  }

  /// Leave the directory on disk and return its path.
  ///
  /// Kept workspaces are only removed by the reaper.
  pub fn keep(mut self) -> PathBuf {
    self.keep = true;
    self.root.clone()
  }

  /// Delete the workspace directory and everything in it.
  pub async fn remove(mut self) -> io::Result<()> {
    // If this future is dropped before finishing, Drop retries the removal.
    let result = fs::remove_dir_all(&self.root).await;
    self.removed = true;
    match result {
      Ok(()) => {
        debug!(id = %self.id, "workspace removed");
        Ok(())
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e),
    }
  }
}

impl Drop for Workspace {
  fn drop(&mut self) {
    if self.keep || self.removed {
      return;
    }
    // Blocking removal. On cancellation the toolchain was only just sent
    // SIGKILL, and its children can still be creating files, so one failed
    // pass is retried once. Anything left over is the reaper's job.
    let result = remove_tree(&self.root).or_else(|_| remove_tree(&self.root));
    if let Err(e) = result {
      warn!(id = %self.id, path = %self.root.display(), error = %e, "failed to remove workspace");
    }
  }
}

fn remove_tree(path: &Path) -> io::Result<()> {
  match std::fs::remove_dir_all(path) {
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    other => other,
  }
}

/// Creates workspaces under a configured root directory.
#[derive(Debug, Clone)]
pub struct WorkspaceProvisioner {
  root: PathBuf,
  module_prefix: String,
  go_version: String,
}

impl WorkspaceProvisioner {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      module_prefix: DEFAULT_MODULE_PREFIX.to_string(),
      go_version: DEFAULT_GO_VERSION.to_string(),
    }
  }

  pub fn with_module_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.module_prefix = prefix.into();
    self
  }

  pub fn with_go_version(mut self, version: impl Into<String>) -> Self {
    self.go_version = version.into();
    self
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Create a fresh workspace and write the request's inputs into it.
  ///
  /// Fails if any directory or file cannot be created; a partially
  /// written workspace is removed before the error is returned.
  pub async fn provision(&self, request: &BuildRequest) -> Result<Workspace, WorkspaceError> {
    fs::create_dir_all(&self.root).await.map_err(|e| WorkspaceError::CreateDir {
      path: self.root.clone(),
      source: e,
    })?;

    let id = WorkspaceId::new();
    let path = self.root.join(id.to_string());

    create_private_dir(&path).await.map_err(|e| WorkspaceError::CreateDir {
      path: path.clone(),
      source: e,
    })?;

    // From here on, dropping the workspace cleans up after a failed write.
    let workspace = Workspace {
      id,
      root: path,
      keep: false,
      removed: false,
    };

    write_file(&workspace.source_path(), request.source_text().as_bytes()).await?;

    let descriptor = ModuleDescriptor::new(&self.module_prefix, &self.go_version, request.binary_name());
    write_file(&workspace.module_path(), descriptor.render().as_bytes()).await?;

    if tracing::enabled!(tracing::Level::DEBUG) {
      let files = workspace.list_files().await.unwrap_or_default();
      debug!(id = %id, path = %workspace.root.display(), files = ?files, "workspace provisioned");
    }

    Ok(workspace)
  }
}

#[cfg(unix)]
async fn create_private_dir(path: &Path) -> io::Result<()> {
  let mut builder = fs::DirBuilder::new();
  builder.mode(0o700);
  builder.create(path).await
}

#[cfg(not(unix))]
async fn create_private_dir(path: &Path) -> io::Result<()> {
  fs::DirBuilder::new().create(path).await
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), WorkspaceError> {
  fs::write(path, contents).await.map_err(|e| WorkspaceError::WriteFile {
    path: path.to_path_buf(),
    source: e,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  const HELLO: &str = "package main\n\nfunc main() { println(\"hi\") }\n";

  fn request(bin: &str) -> BuildRequest {
    BuildRequest::new(HELLO.to_string(), "linux", "amd64", bin).unwrap()
  }

  #[tokio::test]
  async fn provision_writes_source_and_descriptor() {
    let temp_dir = TempDir::new().unwrap();
    let provisioner = WorkspaceProvisioner::new(temp_dir.path());

    let workspace = provisioner.provision(&request("app")).await.unwrap();

    assert!(workspace.root().starts_with(temp_dir.path()));
    assert_eq!(std::fs::read_to_string(workspace.source_path()).unwrap(), HELLO);
    assert_eq!(
      std::fs::read_to_string(workspace.module_path()).unwrap(),
      "module buildbox.local/app\n\ngo 1.18\n"
    );
  }

  #[tokio::test]
  async fn directory_is_named_by_id() {
    let temp_dir = TempDir::new().unwrap();
    let provisioner = WorkspaceProvisioner::new(temp_dir.path());

    let workspace = provisioner.provision(&request("app")).await.unwrap();

    let dir_name = workspace.root().file_name().unwrap().to_str().unwrap();
    assert_eq!(dir_name.parse::<WorkspaceId>().unwrap(), workspace.id());
  }

  #[tokio::test]
  async fn each_provision_gets_a_distinct_directory() {
    let temp_dir = TempDir::new().unwrap();
    let provisioner = WorkspaceProvisioner::new(temp_dir.path());

    let a = provisioner.provision(&request("app")).await.unwrap();
    let b = provisioner.provision(&request("app")).await.unwrap();

    assert_ne!(a.id(), b.id());
    assert_ne!(a.root(), b.root());
  }

  #[tokio::test]
  async fn creates_missing_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("nested").join("root");
    let provisioner = WorkspaceProvisioner::new(&root);

    let workspace = provisioner.provision(&request("app")).await.unwrap();

    assert!(workspace.root().starts_with(&root));
  }

  #[tokio::test]
  async fn fails_loudly_when_root_is_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("not-a-dir");
    std::fs::write(&root, "x").unwrap();
    let provisioner = WorkspaceProvisioner::new(&root);

    let result = provisioner.provision(&request("app")).await;

    assert!(matches!(result, Err(WorkspaceError::CreateDir { .. })));
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn directory_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let provisioner = WorkspaceProvisioner::new(temp_dir.path());

    let workspace = provisioner.provision(&request("app")).await.unwrap();

    let mode = std::fs::metadata(workspace.root()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o700);
  }

  #[tokio::test]
  async fn drop_removes_directory() {
    let temp_dir = TempDir::new().unwrap();
    let provisioner = WorkspaceProvisioner::new(temp_dir.path());

    let workspace = provisioner.provision(&request("app")).await.unwrap();
    let root = workspace.root().to_path_buf();
    drop(workspace);

    assert!(!root.exists());
  }

  #[tokio::test]
  async fn drop_removes_toolchain_leftovers() {
    let temp_dir = TempDir::new().unwrap();
    let provisioner = WorkspaceProvisioner::new(temp_dir.path());

    let workspace = provisioner.provision(&request("app")).await.unwrap();
    let root = workspace.root().to_path_buf();
    std::fs::create_dir_all(root.join("cache").join("b001")).unwrap();
    std::fs::write(root.join("cache").join("b001").join("_pkg_.a"), b"partial").unwrap();
    drop(workspace);

    assert!(!root.exists());
  }

  #[test]
  fn remove_tree_ignores_missing_directory() {
    let temp_dir = TempDir::new().unwrap();

    remove_tree(&temp_dir.path().join("gone")).unwrap();
  }

  #[tokio::test]
  async fn keep_leaves_directory_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let provisioner = WorkspaceProvisioner::new(temp_dir.path());

    let workspace = provisioner.provision(&request("app")).await.unwrap();
    let root = workspace.keep();

    assert!(root.join(SOURCE_FILENAME).exists());
  }

  #[tokio::test]
  async fn remove_deletes_directory() {
    let temp_dir = TempDir::new().unwrap();
    let provisioner = WorkspaceProvisioner::new(temp_dir.path());

    let workspace = provisioner.provision(&request("app")).await.unwrap();
    let root = workspace.root().to_path_buf();
    workspace.remove().await.unwrap();

    assert!(!root.exists());
  }

  #[tokio::test]
  async fn list_files_reports_inputs() {
    let temp_dir = TempDir::new().unwrap();
    let provisioner = WorkspaceProvisioner::new(temp_dir.path());

    let workspace = provisioner.provision(&request("app")).await.unwrap();
    let files = workspace.list_files().await.unwrap();

    assert_eq!(files, vec![workspace.module_path(), workspace.source_path()]);
  }

  #[tokio::test]
  async fn custom_descriptor_settings() {
    let temp_dir = TempDir::new().unwrap();
    let provisioner = WorkspaceProvisioner::new(temp_dir.path())
      .with_module_prefix("example.com/builds")
      .with_go_version("1.22");

    let workspace = provisioner.provision(&request("tool")).await.unwrap();

    assert_eq!(
      std::fs::read_to_string(workspace.module_path()).unwrap(),
      "module example.com/builds/tool\n\ngo 1.22\n"
    );
  }
}
