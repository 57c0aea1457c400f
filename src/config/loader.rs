//! Configuration loading
//!
//! Layers, lowest priority first:
//! 1. Default values (serde defaults)
//! 2. JSON configuration file, when given
//! 3. `RPC_TLS_*` environment variables

use config::{Config, Environment, File, FileFormat, Map};
use log::debug;
use std::path::Path;

use super::defaults::{ENV_KEYS, ENV_PREFIX};
use super::SslConfig;
use crate::common::{Result, TlsError};

impl SslConfig {
    /// Load configuration from an optional JSON file and the environment
    ///
    /// A file that is named but missing is an error; use `None` to rely on
    /// defaults and environment variables only.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.is_file() {
                return Err(TlsError::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            debug!("Loading TLS configuration from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Json).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("protocols")
                .source(Some(env_settings())),
        );

        let config: Self = builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| TlsError::Config(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file only, ignoring the environment
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TlsError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            TlsError::Config(format!("Failed to parse JSON config file {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }
}

/// `RPC_TLS_*` variables that name a configuration key
fn env_settings() -> Map<String, String> {
    let prefix = format!("{}_", ENV_PREFIX);
    std::env::vars_os()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
        .filter(|(name, _)| {
            let known = name
                .strip_prefix(&prefix)
                .map_or(false, |key| ENV_KEYS.contains(&key.to_lowercase().as_str()));
            if !known && name.starts_with(&prefix) {
                debug!("Ignoring {}: not a TLS configuration key", name);
            }
            known
        })
        .collect()
}
