//! docproxy - REST-to-document-store proxy
//!
//! Loads configuration from the environment and serves until signalled.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}
