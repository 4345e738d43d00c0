//! HTTP front end for the build service.

mod error;
mod extract;
mod handlers;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use buildbox_lib::gc::collect_garbage;
use buildbox_lib::{BuildService, Config};

pub use routes::create_router;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
  pub service: Arc<BuildService>,
  pub version: &'static str,
}

impl AppState {
  pub fn new(service: Arc<BuildService>) -> Self {
    Self {
      service,
      version: env!("CARGO_PKG_VERSION"),
    }
  }
}

pub struct Server {
  config: Config,
}

impl Server {
  /// Prepare the workspace root and resolve it to an absolute path.
  pub async fn new(mut config: Config) -> Result<Self> {
    let root = config.workspace.root.clone();
    tokio::fs::create_dir_all(&root)
      .await
      .with_context(|| format!("Failed to create workspace root {}", root.display()))?;
    config.workspace.root = dunce::canonicalize(&root)
      .with_context(|| format!("Failed to resolve workspace root {}", root.display()))?;

    Ok(Self { config })
  }

  /// Serve until Ctrl+C or SIGTERM. In-flight requests are allowed to finish.
  pub async fn run(self) -> Result<()> {
    let service = Arc::new(BuildService::new(&self.config));
    let app = create_router(AppState::new(service.clone()), &self.config.server);

    let addr = self.config.server.listen_addr;
    let listener = TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
      addr = %listener.local_addr().unwrap_or(addr),
      root = %self.config.workspace.root.display(),
      slots = service.available_slots(),
      retain = self.config.workspace.retain,
      "buildbox listening"
    );

    let reaper = spawn_reaper(
      self.config.workspace.root.clone(),
      self.config.workspace.retention(),
      self.config.workspace.sweep_interval(),
    );

    axum::serve(listener, app)
      .with_graceful_shutdown(shutdown_signal())
      .await
      .context("Server error")?;

    reaper.abort();
    info!("buildbox shut down");

    Ok(())
  }
}

/// Sweep expired workspaces now and then every `interval`.
fn spawn_reaper(root: PathBuf, retention: Duration, interval: Duration) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      ticker.tick().await;

      let root = root.clone();
      match tokio::task::spawn_blocking(move || collect_garbage(&root, retention, false)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!(error = %e, "workspace sweep failed"),
        Err(e) => warn!(error = %e, "workspace sweep task failed"),
      }
    }
  })
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      warn!(error = %e, "failed to listen for Ctrl+C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut signal) => {
        signal.recv().await;
      }
      Err(e) => {
        warn!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => info!("received Ctrl+C, shutting down"),
    _ = terminate => info!("received terminate signal, shutting down"),
  }
}
