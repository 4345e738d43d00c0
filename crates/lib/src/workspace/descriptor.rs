use std::fmt;

use crate::request::BinaryName;

/// Module prefix used when none is configured.
pub const DEFAULT_MODULE_PREFIX: &str = "buildbox.local";

/// Go language version declared when none is configured.
pub const DEFAULT_GO_VERSION: &str = "1.18";

/// The `go.mod` written next to the submitted source.
///
/// The last module path element is the binary name, which makes `go build`
/// name its output after it. Nothing else from the request goes in here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
  module_path: String,
  go_version: String,
}

impl ModuleDescriptor {
  pub fn new(module_prefix: &str, go_version: &str, binary_name: &BinaryName) -> Self {
    let prefix = module_prefix.trim_end_matches('/');
    let module_path = if prefix.is_empty() {
      binary_name.to_string()
    } else {
      format!("{}/{}", prefix, binary_name)
    };

    Self {
      module_path,
      go_version: go_version.to_string(),
    }
  }

  pub fn module_path(&self) -> &str {
    &self.module_path
  }

  /// File contents, ready to be written.
  pub fn render(&self) -> String {
    self.to_string()
  }
}

impl fmt::Display for ModuleDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "module {}\n\ngo {}\n", self.module_path, self.go_version)
  }
}
