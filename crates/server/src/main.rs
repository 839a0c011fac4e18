use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod api;
mod config;

use config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "sheetgate")]
#[command(about = "Spreadsheet tool-invocation gateway for AI agents", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "sheetgate.toml", env = "SHEETGATE_CONFIG")]
    config: PathBuf,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1", env = "SHEETGATE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "SHEETGATE_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sheetgate=info,tower_http=debug".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    tracing::info!("Starting sheetgate tool-invocation gateway");

    // Configuration is read exactly once; everything downstream gets
    // an immutable snapshot.
    let config = ServerConfig::load(&args.config)?;

    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!("Starting API server on {}", addr);

    api::serve(&addr, config).await?;

    Ok(())
}
