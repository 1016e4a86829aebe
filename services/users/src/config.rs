//! HTTP server configuration

use serde::Deserialize;

/// Server settings, read from `APP_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: 0.0.0.0)
    pub host: String,
    /// Listen port (default: 3000)
    pub port: u16,
    /// Largest `count` accepted by the generate endpoint (default: 10000)
    pub generate_max_count: usize,
    /// Largest accepted batch upload in bytes (default: 10 MiB)
    pub batch_max_bytes: usize,
}

impl ServerConfig {
    /// Load the server configuration
    ///
    /// # Environment Variables
    /// - `APP_HOST`
    /// - `APP_PORT`
    /// - `APP_GENERATE_MAX_COUNT`
    /// - `APP_BATCH_MAX_BYTES`
    pub fn load() -> Result<Self, ::config::ConfigError> {
        ::config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("generate_max_count", 10_000)?
            .set_default("batch_max_bytes", 10 * 1024 * 1024)?
            .add_source(::config::Environment::with_prefix("APP").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Socket address to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            generate_max_count: 10_000,
            batch_max_bytes: 10 * 1024 * 1024,
        }
    }
}
