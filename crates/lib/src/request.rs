//! Build requests and their validation.
//!
//! A [`BuildRequest`] can only be constructed through validation, so every
//! value that reaches the provisioner or the toolchain has already been
//! checked. The binary name is the security-relevant field: it becomes a
//! path segment inside the workspace and part of the module path.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::{Arch, Os, Platform};

/// Longest accepted binary name, in bytes.
pub const MAX_BINARY_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("invalid binary name {name:?}: {reason}")]
  InvalidBinaryName { name: String, reason: &'static str },

  #[error("invalid target {field} {value:?}: expected lowercase letters and digits")]
  InvalidTarget { field: &'static str, value: String },

  #[error("source is {size} bytes, limit is {limit}")]
  SourceTooLarge { size: usize, limit: usize },
}

/// A binary name that is safe to use as a single path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BinaryName(String);

impl BinaryName {
  pub fn parse(name: &str) -> Result<Self, ValidationError> {
    let reject = |reason| ValidationError::InvalidBinaryName {
      name: name.to_string(),
      reason,
    };

    if name.is_empty() {
      return Err(ValidationError::MissingField("bin"));
    }
    if name.len() > MAX_BINARY_NAME_LEN {
      return Err(reject("longer than 64 bytes"));
    }
    if name.contains('/') || name.contains('\\') {
      return Err(reject("contains a path separator"));
    }
    if name.contains("..") {
      return Err(reject("contains a traversal sequence"));
    }
    if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
      return Err(reject("must start with a letter or digit"));
    }
    if !name
      .bytes()
      .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
    {
      return Err(reject("allowed characters are letters, digits, '-', '_' and '.'"));
    }

    Ok(Self(name.to_string()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl TryFrom<String> for BinaryName {
  type Error = ValidationError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::parse(&value)
  }
}

impl From<BinaryName> for String {
  fn from(name: BinaryName) -> Self {
    name.0
  }
}

impl fmt::Display for BinaryName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A validated request to cross-compile one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
  source_text: String,
  platform: Platform,
  binary_name: BinaryName,
}

impl BuildRequest {
  /// Validate raw request fields.
  ///
  /// The source text is opaque and only checked for presence; target values
  /// must be safe tokens and the binary name a safe path segment.
  pub fn new(source_text: String, os: &str, arch: &str, bin: &str) -> Result<Self, ValidationError> {
    if source_text.is_empty() {
      return Err(ValidationError::MissingField("code"));
    }
    if os.is_empty() {
      return Err(ValidationError::MissingField("os"));
    }
    if arch.is_empty() {
      return Err(ValidationError::MissingField("arch"));
    }

    Ok(Self {
      platform: Platform::new(os.parse()?, arch.parse()?),
      binary_name: BinaryName::parse(bin)?,
      source_text,
    })
  }

  pub fn source_text(&self) -> &str {
    &self.source_text
  }

  pub fn platform(&self) -> &Platform {
    &self.platform
  }

  pub fn target_os(&self) -> &Os {
    &self.platform.os
  }

  pub fn target_arch(&self) -> &Arch {
    &self.platform.arch
  }

  pub fn binary_name(&self) -> &BinaryName {
    &self.binary_name
  }

  /// File name of the artifact the toolchain produces for this request.
  pub fn artifact_file_name(&self) -> String {
    format!("{}{}", self.binary_name, self.platform.os.exe_suffix())
  }

  /// Reject sources larger than `limit` bytes.
  pub fn check_source_size(&self, limit: usize) -> Result<(), ValidationError> {
    let size = self.source_text.len();
    if size > limit {
      return Err(ValidationError::SourceTooLarge { size, limit });
    }
    Ok(())
  }
}
