//! Basic SDK usage: check gateway health and browse the tool catalog.
//!
//! Run with: cargo run --example basic_usage

use sheetgate_sdk::{SheetgateClient, SheetgateResult};
use std::time::Duration;

#[tokio::main]
async fn main() -> SheetgateResult<()> {
    tracing_subscriber::fmt::init();

    let client = SheetgateClient::builder()
        .base_url("http://localhost:8080")
        .api_key("agent-42")
        .timeout(Duration::from_secs(30))
        .build()?;

    let health = client.health().await?;
    println!("Gateway: {} {} ({})", health.service, health.version, health.status);

    let tools = client.list_tools().await?;
    println!("\n{} tools available:", tools.len());
    for tool in tools {
        println!("  {} - {}", tool.name, tool.description);
    }

    Ok(())
}
