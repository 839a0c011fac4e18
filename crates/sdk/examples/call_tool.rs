//! Invoke spreadsheet tools through the gateway.
//!
//! Run with: cargo run --example call_tool

use serde_json::json;
use sheetgate_sdk::{SheetgateClient, SheetgateError, SheetgateResult};

#[tokio::main]
async fn main() -> SheetgateResult<()> {
    let client = SheetgateClient::builder()
        .base_url("http://localhost:8080")
        .api_key("agent-42")
        .build()?;

    let spreadsheets = client.call_tool("list_spreadsheets", json!({})).await?;
    println!("Spreadsheets: {}", spreadsheets);

    let result = client
        .call_tool(
            "get_sheet_data",
            json!({
                "spreadsheet_id": "1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms",
                "sheet": "Class Data",
                "range": "A1:F10",
            }),
        )
        .await;

    match result {
        Ok(data) => println!("Sheet data: {}", data),
        Err(SheetgateError::RateLimited { retry_after }) => {
            println!("Rate limited; retry after {:?}s", retry_after);
        }
        Err(err) => return Err(err),
    }

    Ok(())
}
