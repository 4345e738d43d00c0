use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::request::ValidationError;

/// Target CPU architectures, named the way `GOARCH` names them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Arch {
  Amd64,
  Arm64,
  I386,
  Arm,
  Riscv64,
  Wasm,
  Other(String),
}

impl Arch {
  /// Detect the host CPU architecture at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::ARCH {
      "x86_64" => Some(Self::Amd64),
      "aarch64" => Some(Self::Arm64),
      "x86" => Some(Self::I386),
      "arm" => Some(Self::Arm),
      "riscv64" => Some(Self::Riscv64),
      _ => None,
    }
  }

  /// Returns the `GOARCH` identifier for this architecture
  pub fn as_str(&self) -> &str {
    match self {
      Self::Amd64 => "amd64",
      Self::Arm64 => "arm64",
      Self::I386 => "386",
      Self::Arm => "arm",
      Self::Riscv64 => "riscv64",
      Self::Wasm => "wasm",
      Self::Other(name) => name,
    }
  }
}

impl FromStr for Arch {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "amd64" => Ok(Self::Amd64),
      "arm64" => Ok(Self::Arm64),
      "386" => Ok(Self::I386),
      "arm" => Ok(Self::Arm),
      "riscv64" => Ok(Self::Riscv64),
      "wasm" => Ok(Self::Wasm),
      other if super::is_target_token(other) => Ok(Self::Other(other.to_string())),
      other => Err(ValidationError::InvalidTarget {
        field: "arch",
        value: other.to_string(),
      }),
    }
  }
}

impl TryFrom<String> for Arch {
  type Error = ValidationError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Arch> for String {
  fn from(arch: Arch) -> Self {
    arch.as_str().to_string()
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
