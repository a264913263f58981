//! Region Ping service
//!
//! Answers pings with this instance's region id and serves the endpoint
//! directory. All settings come from the environment.

use anyhow::Context;
use regionping::{server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("Failed to read server configuration")?;
    server::serve(config).await.context("Ping service stopped")?;
    Ok(())
}
