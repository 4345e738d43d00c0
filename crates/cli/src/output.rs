//! Terminal output for the `build` and `gc` commands.
//!
//! Status lines carry a colored marker and result details are printed as an
//! aligned block of labeled rows. Toolchain diagnostics are echoed on stderr
//! behind a gutter.

use std::fmt::Write as _;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{AnsiColors, OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  pub const GUTTER: &str = "│";
}

/// Binary units, largest first.
const UNITS: [(&str, u64); 3] = [("GiB", 1 << 30), ("MiB", 1 << 20), ("KiB", 1 << 10)];

pub fn format_bytes(bytes: u64) -> String {
  UNITS
    .iter()
    .find(|(_, size)| bytes >= *size)
    .map(|(unit, size)| format!("{:.1} {unit}", bytes as f64 / *size as f64))
    .unwrap_or_else(|| format!("{bytes} B"))
}

/// Compact duration: `340ms`, `4.21s`, `2m 05s`.
pub fn format_duration(duration: Duration) -> String {
  match duration.as_secs() {
    0 => format!("{}ms", duration.as_millis()),
    secs @ 1..60 => format!("{secs}.{:02}s", duration.subsec_millis() / 10),
    secs => format!("{}m {:02}s", secs / 60, secs % 60),
  }
}

fn status(symbol: &str, color: AnsiColors, message: &str) {
  println!("{} {message}", symbol.if_supports_color(Stream::Stdout, |s| s.color(color)));
}

pub fn print_success(message: &str) {
  status(symbols::SUCCESS, AnsiColors::Green, message);
}

pub fn print_info(message: &str) {
  status(symbols::INFO, AnsiColors::Blue, message);
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

/// Echo toolchain output on stderr, one gutter-prefixed line at a time.
pub fn print_diagnostics(text: &str) {
  for line in text.trim_end().lines() {
    eprintln!("  {} {line}", symbols::GUTTER.if_supports_color(Stream::Stderr, |s| s.dimmed()));
  }
}

/// Labeled result rows, printed with their values in one column.
#[derive(Debug, Default)]
pub struct Stats {
  rows: Vec<(&'static str, String)>,
}

impl Stats {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn row(mut self, label: &'static str, value: impl ToString) -> Self {
    self.rows.push((label, value.to_string()));
    self
  }

  /// Plain rendering, one row per line.
  pub fn render(&self) -> String {
    let width = self.rows.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for (label, value) in &self.rows {
      let _ = writeln!(out, "  {:<width$} {value}", format!("{label}:"), width = width + 1);
    }
    out
  }

  pub fn print(&self) {
    print!("{}", self.render());
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{json}");
  Ok(())
}
