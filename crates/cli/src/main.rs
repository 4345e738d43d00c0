mod cmd;
mod output;
mod server;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use buildbox_lib::Config;

use cmd::{BuildArgs, cmd_build, cmd_gc, cmd_serve};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "buildbox")]
#[command(author, version, about = "Cross-compile Go programs on demand", long_about = None)]
struct Cli {
  /// Configuration file (default: <config dir>/buildbox/config.toml)
  #[arg(short, long, global = true, env = "BUILDBOX_CONFIG")]
  config: Option<PathBuf>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Emit logs as JSON
  #[arg(long, global = true, env = "BUILDBOX_LOG_JSON")]
  log_json: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the HTTP build service
  Serve {
    /// Address to listen on
    #[arg(short, long, env = "BUILDBOX_LISTEN")]
    listen: Option<SocketAddr>,

    /// Keep workspaces after each build
    #[arg(long)]
    retain: bool,
  },

  /// Build a single Go source file
  Build {
    /// Go source file to compile as main.go
    source: PathBuf,

    /// Target operating system (default: host)
    #[arg(long)]
    os: Option<String>,

    /// Target architecture (default: host)
    #[arg(long)]
    arch: Option<String>,

    /// Binary name (default: source file stem)
    #[arg(long)]
    bin: Option<String>,

    /// Where to write the binary (default: current directory)
    #[arg(short, long)]
    out: Option<PathBuf>,
  },

  /// Remove expired workspaces
  Gc {
    /// Show what would be removed without deleting
    #[arg(long)]
    dry_run: bool,

    /// Override the retention window (e.g. "30m", "2h")
    #[arg(long, value_parser = humantime::parse_duration)]
    retention: Option<Duration>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  init_tracing(cli.verbose, cli.log_json);

  let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

  match cli.command {
    Commands::Serve { listen, retain } => {
      if let Some(addr) = listen {
        config.server.listen_addr = addr;
      }
      config.workspace.retain |= retain;
      config.validate()?;
      cmd_serve(config)
    }
    Commands::Build {
      source,
      os,
      arch,
      bin,
      out,
    } => {
      config.validate()?;
      cmd_build(
        &config,
        BuildArgs {
          source,
          os,
          arch,
          bin,
          out,
        },
      )
    }
    Commands::Gc {
      dry_run,
      retention,
      output,
    } => {
      let retention = retention.unwrap_or_else(|| config.workspace.retention());
      cmd_gc(&config.workspace.root, retention, dry_run, output)
    }
  }
}

fn init_tracing(verbose: bool, json: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  if json {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
      .init();
  } else {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(
        tracing_subscriber::fmt::layer()
          .with_target(false)
          .without_time()
          .with_writer(std::io::stderr),
      )
      .init();
  }
}
