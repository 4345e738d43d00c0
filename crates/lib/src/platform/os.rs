use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::request::ValidationError;

/// Target operating systems, named the way `GOOS` names them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Os {
  Linux,
  Darwin,
  Windows,
  FreeBsd,
  OpenBsd,
  NetBsd,
  /// A value the service does not know about but which is a safe token.
  /// The toolchain decides whether it is supported.
  Other(String),
}

impl Os {
  /// Detect the host operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::Darwin),
      "windows" => Some(Self::Windows),
      "freebsd" => Some(Self::FreeBsd),
      "openbsd" => Some(Self::OpenBsd),
      "netbsd" => Some(Self::NetBsd),
      _ => None,
    }
  }

  /// Returns the `GOOS` identifier for this OS
  pub fn as_str(&self) -> &str {
    match self {
      Self::Linux => "linux",
      Self::Darwin => "darwin",
      Self::Windows => "windows",
      Self::FreeBsd => "freebsd",
      Self::OpenBsd => "openbsd",
      Self::NetBsd => "netbsd",
      Self::Other(name) => name,
    }
  }

  /// Suffix appended to executables built for this OS.
  pub fn exe_suffix(&self) -> &'static str {
    match self {
      Self::Windows => ".exe",
      _ => "",
    }
  }
}

impl FromStr for Os {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "linux" => Ok(Self::Linux),
      "darwin" => Ok(Self::Darwin),
      "windows" => Ok(Self::Windows),
      "freebsd" => Ok(Self::FreeBsd),
      "openbsd" => Ok(Self::OpenBsd),
      "netbsd" => Ok(Self::NetBsd),
      other if super::is_target_token(other) => Ok(Self::Other(other.to_string())),
      other => Err(ValidationError::InvalidTarget {
        field: "os",
        value: other.to_string(),
      }),
    }
  }
}

impl TryFrom<String> for Os {
  type Error = ValidationError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Os> for String {
  fn from(os: Os) -> Self {
    os.as_str().to_string()
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
