//! buildbox-lib: on-demand cross-compilation of Go programs
//!
//! This crate provides the build pipeline behind the buildbox service:
//! - `BuildRequest`: validated source text, target platform and binary name
//! - `Workspace`: an isolated, uniquely named directory per build
//! - `BuildExecutor`: runs the Go toolchain and classifies the result
//! - `BuildService`: the full pipeline with admission control and cleanup
//! - `gc`: sweeps leftover workspaces

pub mod build;
pub mod config;
pub mod consts;
pub mod gc;
pub mod platform;
pub mod request;
pub mod service;
pub mod util;
pub mod workspace;

pub use build::{Artifact, BuildError, BuildExecutor, BuildOutcome, ToolchainConfig};
pub use config::{Config, ConfigError};
pub use platform::{Arch, Os, Platform};
pub use request::{BinaryName, BuildRequest, ValidationError};
pub use service::{BuildReport, BuildService};
pub use workspace::{Workspace, WorkspaceError, WorkspaceId, WorkspaceProvisioner};
