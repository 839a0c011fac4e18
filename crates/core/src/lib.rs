// Core gateway logic for sheetgate: registry, validation, rate limiting,
// audit logging, sanitization, and dispatch.

pub mod audit;
pub mod backend;
pub mod dispatch;
pub mod ratelimit;
pub mod registry;
pub mod sanitize;
pub mod types;
pub mod validate;

pub use types::*;
