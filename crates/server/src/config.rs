use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use store::StoreConfig;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log filter, `tracing_subscriber::EnvFilter` syntax
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format
    #[serde(default = "default_true")]
    pub log_json: bool,

    /// Backing document store
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            log_json: default_true(),
            store: StoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `docproxy.{toml,yaml,json}`
    /// file and `DOCPROXY__*` environment variables, in increasing priority.
    ///
    /// Nested keys use `__`: `DOCPROXY__STORE__BACKEND=couchbase`.
    pub fn load() -> anyhow::Result<Self> {
        // A missing .env is the normal case outside development.
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("docproxy").required(false))
            // Override with environment variables
            .add_source(
                config::Environment::with_prefix("DOCPROXY")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4051
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_mb() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 4051);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_body_size_mb, 10);
        assert!(cfg.enable_cors);
        assert!(cfg.log_json);
        assert_eq!(cfg.store, StoreConfig::Memory);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 4051);
    }

    #[test]
    fn test_max_body_size_in_bytes() {
        let cfg = ServerConfig {
            max_body_size_mb: 2,
            ..Default::default()
        };
        assert_eq!(cfg.max_body_size(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg: ServerConfig = serde_json::from_value(serde_json::json!({
            "port": 9000,
            "store": { "backend": "couchbase", "bucket": "things" }
        }))
        .unwrap();

        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.bind_addr, "0.0.0.0");
        let StoreConfig::Couchbase(cb) = cfg.store else {
            panic!("expected couchbase store");
        };
        assert_eq!(cb.bucket, "things");
        assert_eq!(cb.host, "127.0.0.1");
        assert!(!cb.insecure);
    }
}
