pub mod arch;
pub mod os;
pub mod paths;

pub use arch::Arch;
pub use os::Os;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest accepted `GOOS`/`GOARCH` value.
const MAX_TARGET_TOKEN_LEN: usize = 32;

/// Cross-compilation target (e.g., "linux/amd64")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
  pub os: Os,
  pub arch: Arch,
}

impl Platform {
  pub fn new(os: Os, arch: Arch) -> Self {
    Self { os, arch }
  }

  /// Detect the host platform at runtime
  ///
  /// Returns `None` if the OS or architecture has no Go equivalent here
  pub fn current() -> Option<Self> {
    Some(Self {
      os: Os::current()?,
      arch: Arch::current()?,
    })
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.os, self.arch)
  }
}

/// A target token is 1-32 lowercase ASCII letters or digits.
pub(crate) fn is_target_token(value: &str) -> bool {
  !value.is_empty()
    && value.len() <= MAX_TARGET_TOKEN_LEN
    && value.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}
