// MCP (Model Context Protocol) surface: the same dispatcher the HTTP
// gateway uses, spoken as JSON-RPC 2.0 over stdio.

pub mod protocol;
pub mod server;

pub use server::McpServer;
