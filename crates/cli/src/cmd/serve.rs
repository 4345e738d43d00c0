use anyhow::{Context, Result};

use buildbox_lib::Config;

use crate::server::Server;

/// Run the HTTP service until interrupted.
pub fn cmd_serve(config: Config) -> Result<()> {
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(async {
    let server = Server::new(config).await?;
    server.run().await
  })
}
