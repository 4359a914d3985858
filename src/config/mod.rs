/// Configuration management for the FlowFinance editor service
///
/// Handles server binding, snapshot database location and the storage
/// backend the file panel talks to.

use crate::backend::upload::DEFAULT_ACCEPT;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Storage backend configuration
    pub backend: BackendConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Database configuration for saved workflow snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Directory holding workflows.db (default: "data")
    pub data_dir: String,
}

/// Storage backend (Supabase project) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL; empty selects the in-memory backend
    pub url: String,
    /// Public anon key sent as `apikey`
    pub anon_key: String,
    /// Session token of the signed-in user, if any
    pub access_token: Option<String>,
    /// Storage bucket for uploaded objects
    pub bucket: String,
    /// Table holding file metadata rows
    pub table: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Accepted upload extensions, comma or semicolon separated
    pub accept: String,
}

impl BackendConfig {
    pub fn is_remote(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            access_token: None,
            bucket: "files".to_string(),
            table: "files".to_string(),
            timeout_secs: 30,
            accept: DEFAULT_ACCEPT.to_string(),
        }
    }
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        let backend_defaults = BackendConfig::default();
        Self {
            server: ServerConfig {
                host: std::env::var("FLOWFINANCE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("FLOWFINANCE_PORT")
                    .unwrap_or_else(|_| "3004".to_string())
                    .parse()
                    .unwrap_or(3004),
            },
            database: DatabaseConfig {
                data_dir: std::env::var("FLOWFINANCE_DATA_DIR")
                    .unwrap_or_else(|_| "data".to_string()),
            },
            backend: BackendConfig {
                url: std::env::var("FLOWFINANCE_SUPABASE_URL").unwrap_or_default(),
                anon_key: std::env::var("FLOWFINANCE_SUPABASE_ANON_KEY").unwrap_or_default(),
                access_token: std::env::var("FLOWFINANCE_ACCESS_TOKEN")
                    .ok()
                    .filter(|t| !t.is_empty()),
                bucket: std::env::var("FLOWFINANCE_BUCKET").unwrap_or(backend_defaults.bucket),
                table: std::env::var("FLOWFINANCE_FILES_TABLE").unwrap_or(backend_defaults.table),
                timeout_secs: std::env::var("FLOWFINANCE_BACKEND_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(backend_defaults.timeout_secs),
                accept: std::env::var("FLOWFINANCE_ACCEPT").unwrap_or(backend_defaults.accept),
            },
        }
    }
}
