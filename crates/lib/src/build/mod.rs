//! Toolchain execution and result classification.
//!
//! A build runs the Go toolchain against a provisioned [`Workspace`] and
//! produces exactly one [`BuildOutcome`]: the compiled artifact, or the
//! toolchain's combined output when compilation fails. Infrastructure
//! problems (missing artifact, timeout, spawn failure) are [`BuildError`]s.
//!
//! [`Workspace`]: crate::workspace::Workspace

pub mod execute;
pub mod output;
pub mod types;

pub use execute::BuildExecutor;
pub use output::CombinedOutput;
pub use types::{Artifact, BuildError, BuildOutcome, ToolchainConfig};
