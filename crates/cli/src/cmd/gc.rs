use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use buildbox_lib::gc::collect_garbage;

use crate::output::{OutputFormat, Stats, format_bytes, format_duration, print_info, print_json, print_success};

pub fn cmd_gc(root: &Path, retention: Duration, dry_run: bool, output: OutputFormat) -> Result<()> {
  let start = Instant::now();

  let result = collect_garbage(root, retention, dry_run)
    .with_context(|| format!("Failed to sweep workspaces in {}", root.display()))?;

  if output.is_json() {
    print_json(&result)?;
  } else {
    println!();
    if dry_run {
      print_info("Dry run - no changes made");
    } else {
      print_success("Workspace sweep complete!");
    }
    Stats::new()
      .row("Root", root.display())
      .row("Retention", humantime::format_duration(retention))
      .row("Workspaces scanned", result.stats.workspaces_scanned)
      .row("Workspaces removed", result.stats.workspaces_deleted)
      .row("Space freed", format_bytes(result.stats.bytes_freed))
      .row("Duration", format_duration(start.elapsed()))
      .print();
  }

  Ok(())
}
