//! memory-sync proxy
//!
//! Run with: memsync-proxy --port 3000

use std::net::SocketAddr;

use clap::Parser;

use memsync::client::{MemoryApiClient, DEFAULT_API_URL};
use memsync::error::{Result, SyncError};
use memsync::logging::init_tracing;
use memsync::proxy::{router, ProxyState};

#[derive(Parser, Debug)]
#[command(name = "memsync-proxy")]
#[command(about = "HTTP passthrough to the memory service")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Memory service base URL
    #[arg(long, env = "MEMORY_API_URL", default_value = DEFAULT_API_URL)]
    api: String,

    /// API key forwarded to the memory service
    #[arg(long, env = "MEMORY_API_KEY")]
    api_key: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|e| SyncError::Config(format!("Invalid listen address: {}", e)))?;

    let client = MemoryApiClient::new(&args.api, args.api_key)?;
    tracing::info!("Proxy listening on {} -> {}", addr, client.base_url());

    let app = router(ProxyState::new(client));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
