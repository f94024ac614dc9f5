//! Process configuration.
//!
//! Loaded once at startup from environment variables (dotenv-aware, see
//! the server binary). The core components never read the environment
//! themselves; they receive these values from the boundary.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    /// Metadata backend; `None` runs on the in-memory registry.
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding attachment files (created at startup).
    pub attachment_dir: String,
    /// Maximum accepted upload size in bytes.
    pub max_upload_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    /// How long a registry call may wait for a pooled connection before
    /// failing fast with `StoreUnavailable`.
    pub acquire_timeout_seconds: u64,
    /// Bounded startup retry loop against the metadata store.
    pub connect_attempts: u32,
    pub connect_backoff_seconds: u64,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }

    pub fn connect_backoff(&self) -> Duration {
        Duration::from_secs(self.connect_backoff_seconds)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            storage: StorageConfig {
                attachment_dir: "./cache".to_string(),
                max_upload_size: 25 * 1024 * 1024, // 25MB
            },
            database: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }
        if let Ok(dir) = std::env::var("INVENTRA_CACHE_DIR") {
            config.storage.attachment_dir = dir;
        }
        if let Ok(size) = std::env::var("INVENTRA_MAX_UPLOAD_SIZE") {
            if let Ok(size) = size.parse() {
                config.storage.max_upload_size = size;
            }
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            let parse = |key: &str, default: u64| -> u64 {
                std::env::var(key)
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(default)
            };
            config.database = Some(DatabaseConfig {
                url,
                pool_size: parse("DATABASE_POOL_SIZE", 10) as u32,
                acquire_timeout_seconds: parse("DATABASE_ACQUIRE_TIMEOUT", 5),
                connect_attempts: parse("DATABASE_CONNECT_ATTEMPTS", 10) as u32,
                connect_backoff_seconds: parse("DATABASE_CONNECT_BACKOFF", 3),
            });
        }

        config
    }

    /// Get the server bind address.
    pub fn server_addr(&self) -> std::net::SocketAddr {
        let ip: std::net::IpAddr = self.server.host.parse().unwrap_or([0, 0, 0, 0].into());
        std::net::SocketAddr::new(ip, self.server.port)
    }
}
