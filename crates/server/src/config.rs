use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sheetgate_core::audit::AuditLog;
use sheetgate_core::backend::RemoteBackend;
use sheetgate_core::dispatch::{Dispatcher, DEFAULT_BACKEND_TIMEOUT_SECS};
use sheetgate_core::ratelimit::{RateLimiter, DEFAULT_MAX_CALLS, DEFAULT_WINDOW_SECS};
use sheetgate_core::registry::ToolRegistry;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the spreadsheet backend service.
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Name of the environment variable holding the backend bearer
    /// credential. The credential itself never lives in the config
    /// file.
    #[serde(default = "default_credential_env")]
    pub credential_env: String,

    /// Upper bound on a single backend call.
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    #[serde(default = "default_max_calls")]
    pub max_calls: u32,

    /// How the rate-limit/audit client key is derived.
    #[serde(default)]
    pub key_policy: KeyPolicy,
}

/// Client-key derivation policy. The source material left this open;
/// it is an explicit deployment choice here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPolicy {
    /// X-Api-Key header, falling back to the peer address when absent.
    #[default]
    ApiKey,
    /// Peer address only.
    Origin,
    /// API key and peer address combined.
    Combined,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:9100/".to_string()
}

fn default_credential_env() -> String {
    "SHEETGATE_BACKEND_TOKEN".to_string()
}

fn default_backend_timeout_secs() -> u64 {
    DEFAULT_BACKEND_TIMEOUT_SECS
}

fn default_window_secs() -> u64 {
    DEFAULT_WINDOW_SECS
}

fn default_max_calls() -> u32 {
    DEFAULT_MAX_CALLS
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            credential_env: default_credential_env(),
            timeout_secs: default_backend_timeout_secs(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_calls: default_max_calls(),
            key_policy: KeyPolicy::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolve the backend credential from the configured environment
    /// variable. Missing credential is allowed (the backend may be
    /// unauthenticated in development).
    pub fn backend_credential(&self) -> Option<String> {
        std::env::var(&self.backend.credential_env).ok()
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub key_policy: KeyPolicy,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let registry = Arc::new(ToolRegistry::standard());
        let limiter = Arc::new(RateLimiter::new(
            Duration::from_secs(config.rate_limit.window_secs),
            config.rate_limit.max_calls,
        ));
        let audit = Arc::new(AuditLog::new());
        let backend = Arc::new(
            RemoteBackend::new(&config.backend.url, config.backend_credential())
                .context("Failed to create backend client")?,
        );

        let dispatcher = Arc::new(
            Dispatcher::new(registry, limiter, audit, backend)
                .with_backend_timeout(Duration::from_secs(config.backend.timeout_secs)),
        );

        Ok(Self {
            dispatcher,
            key_policy: config.rate_limit.key_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_policy() {
        let config = ServerConfig::default();
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.rate_limit.max_calls, 100);
        assert_eq!(config.rate_limit.key_policy, KeyPolicy::ApiKey);
        assert_eq!(config.backend.timeout_secs, 30);
    }

    #[test]
    fn test_parse_config_file() {
        let config: ServerConfig = toml::from_str(
            r#"
            [backend]
            url = "http://sheets-backend:9100/"
            timeout_secs = 10

            [rate_limit]
            window_secs = 30
            max_calls = 20
            key_policy = "combined"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.url, "http://sheets-backend:9100/");
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.rate_limit.max_calls, 20);
        assert_eq!(config.rate_limit.key_policy, KeyPolicy::Combined);
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [rate_limit]
            max_calls = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.rate_limit.max_calls, 5);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.backend.url, "http://127.0.0.1:9100/");
    }
}
