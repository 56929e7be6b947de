//! Configuration loading for PolicyPilot services
//!
//! Resolution priority order:
//! 1. Explicit path passed on the command line (highest priority)
//! 2. `POLICYPILOT_CONFIG` environment variable
//! 3. `policypilot.toml` in the working directory
//! 4. Compiled defaults (fallback)
//!
//! Individual sensitive values (generator API key, bind address, data
//! directory) may additionally be overridden by environment variables after
//! the file is loaded, so secrets never need to live in the TOML file.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "policypilot.toml";

/// Generative backend settings. Without an endpoint and API key the server
/// runs on the deterministic generator only.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneratorConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    /// Per-call timeout; generation falls back rather than waiting longer
    pub timeout_seconds: Option<u64>,
}

impl GeneratorConfig {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or("gpt-4o-mini")
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(30)
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for the HTTP server
    pub bind_addr: String,
    /// Root folder for the SQLite database and uploaded objects
    pub data_dir: PathBuf,
    /// Upload size ceiling applied to policy documents and module media
    pub max_upload_mb: u64,
    /// Enables the dev-only owner bootstrap endpoint
    pub allow_dev_bootstrap: bool,
    /// TTL for signed media URLs handed to learners
    pub signed_url_ttl_seconds: u64,
    /// Outbound email relay; absent means deliveries are logged only
    pub email_relay_url: Option<String>,
    pub generator: GeneratorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5850".to_string(),
            data_dir: PathBuf::from("./policypilot_data"),
            max_upload_mb: 20,
            allow_dev_bootstrap: false,
            signed_url_ttl_seconds: 3600,
            email_relay_url: None,
            generator: GeneratorConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration following the priority order above
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(cli_path) {
            Some(path) => {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                toml::from_str(&content).map_err(|e| {
                    Error::Config(format!("Failed to parse {}: {}", path.display(), e))
                })?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_path {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var("POLICYPILOT_CONFIG") {
            return Some(PathBuf::from(path));
        }

        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default.exists() {
            return Some(default);
        }

        None
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("POLICYPILOT_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Ok(dir) = std::env::var("POLICYPILOT_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(key) = std::env::var("POLICYPILOT_GENERATOR_API_KEY") {
            self.generator.api_key = Some(key);
        }
        if let Ok(endpoint) = std::env::var("POLICYPILOT_GENERATOR_ENDPOINT") {
            self.generator.endpoint = Some(endpoint);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_upload_mb == 0 {
            return Err(Error::Config("max_upload_mb must be at least 1".to_string()));
        }
        if self.signed_url_ttl_seconds == 0 {
            return Err(Error::Config(
                "signed_url_ttl_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Database file path under the data directory
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("policypilot.db")
    }

    /// Object storage root under the data directory
    pub fn storage_root(&self) -> PathBuf {
        self.data_dir.join("objects")
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }
}
