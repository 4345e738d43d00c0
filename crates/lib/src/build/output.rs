//! Combined stdout/stderr capture.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Captured output is cut off beyond this many bytes.
pub const MAX_CAPTURED_OUTPUT: usize = 4 * 1024 * 1024;

const TRUNCATION_NOTICE: &str = "\n[output truncated]\n";

/// Both output streams of one or more processes, in arrival order.
#[derive(Debug, Default)]
pub struct CombinedOutput {
  bytes: Vec<u8>,
  truncated: bool,
}

impl CombinedOutput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Read `stdout` and `stderr` to completion, appending chunks as they
  /// arrive. Bytes past [`MAX_CAPTURED_OUTPUT`] are read and discarded so the
  /// child never blocks on a full pipe.
  pub async fn capture<O, E>(&mut self, mut stdout: O, mut stderr: E) -> io::Result<()>
  where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
  {
    let mut out_buf = [0u8; 8192];
    let mut err_buf = [0u8; 8192];
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
      tokio::select! {
        n = stdout.read(&mut out_buf), if out_open => {
          let n = n?;
          if n == 0 {
            out_open = false;
          } else {
            self.push(&out_buf[..n]);
          }
        }
        n = stderr.read(&mut err_buf), if err_open => {
          let n = n?;
          if n == 0 {
            err_open = false;
          } else {
            self.push(&err_buf[..n]);
          }
        }
      }
    }

    Ok(())
  }

  fn push(&mut self, chunk: &[u8]) {
    let room = MAX_CAPTURED_OUTPUT.saturating_sub(self.bytes.len());
    if chunk.len() > room {
      self.bytes.extend_from_slice(&chunk[..room]);
      self.truncated = true;
    } else {
      self.bytes.extend_from_slice(chunk);
    }
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  pub fn is_truncated(&self) -> bool {
    self.truncated
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes
  }

  /// Lossy UTF-8 text of everything captured.
  pub fn to_text(&self) -> String {
    let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
    if self.truncated {
      text.push_str(TRUNCATION_NOTICE);
    }
    text
  }
}
