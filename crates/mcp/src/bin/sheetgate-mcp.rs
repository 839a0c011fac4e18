// Standalone MCP gateway binary

use anyhow::Result;
use sheetgate_core::audit::AuditLog;
use sheetgate_core::backend::RemoteBackend;
use sheetgate_core::dispatch::Dispatcher;
use sheetgate_core::ratelimit::{RateLimiter, DEFAULT_MAX_CALLS, DEFAULT_WINDOW_SECS};
use sheetgate_core::registry::ToolRegistry;
use sheetgate_mcp::McpServer;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is the protocol channel; logs must go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("sheetgate MCP server starting");

    let backend_url = std::env::var("SHEETGATE_BACKEND_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:9100/".to_string());
    let credential = std::env::var("SHEETGATE_BACKEND_TOKEN").ok();

    let window_secs = std::env::var("SHEETGATE_RATE_WINDOW_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_WINDOW_SECS);
    let max_calls = std::env::var("SHEETGATE_RATE_MAX_CALLS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CALLS);

    // stdio has no network origin; the key is configured per client.
    let client_key =
        std::env::var("SHEETGATE_MCP_CLIENT_KEY").unwrap_or_else(|_| "stdio".to_string());

    let registry = Arc::new(ToolRegistry::standard());
    tracing::info!("Registered {} tools", registry.len());

    let dispatcher = Arc::new(Dispatcher::new(
        registry,
        Arc::new(RateLimiter::new(Duration::from_secs(window_secs), max_calls)),
        Arc::new(AuditLog::new()),
        Arc::new(RemoteBackend::new(&backend_url, credential)?),
    ));

    let server = McpServer::new(dispatcher, client_key);
    server.start().await?;

    Ok(())
}
