//! # sheetgate SDK
//!
//! Rust client for the sheetgate spreadsheet tool gateway.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use sheetgate_sdk::{SheetgateClient, SheetgateResult};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> SheetgateResult<()> {
//!     let client = SheetgateClient::builder()
//!         .base_url("http://localhost:8080")
//!         .api_key("agent-42")
//!         .build()?;
//!
//!     let health = client.health().await?;
//!     println!("Gateway status: {}", health.status);
//!
//!     let tools = client.list_tools().await?;
//!     println!("{} tools available", tools.len());
//!
//!     let sheets = client.call_tool("list_spreadsheets", json!({})).await?;
//!     println!("{}", sheets);
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;

pub use client::{HealthStatus, SheetgateClient, SheetgateClientBuilder, ToolListing};
pub use error::{SheetgateError, SheetgateResult};
