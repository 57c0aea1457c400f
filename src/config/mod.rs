//! Configuration module
//!
//! Property-driven settings for the TLS context. Values are layered from
//! defaults, an optional JSON file and `RPC_TLS_*` environment variables.

pub mod defaults;
mod loader;
mod validator;

pub use defaults::{DEFAULT_CONFIG_FILE, ENV_PREFIX};

use openssl::ssl::SslVersion;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::common::{resolve_path, Result, TlsError};

/// TLS plugin configuration
///
/// Every field is optional in the source files; missing values fall back to
/// [`defaults`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SslConfig {
    /// Base directory for relative file paths
    pub default_dir: Option<PathBuf>,

    /// PEM certificate (optionally followed by its chain) to present to peers
    pub cert_file: Option<PathBuf>,

    /// PEM private key, possibly encrypted. Falls back to `cert_file`.
    pub key_file: Option<PathBuf>,

    /// PEM file of trusted certificate authorities
    pub cert_auth_file: Option<PathBuf>,

    /// Directory of hashed trusted certificate authorities
    pub cert_auth_dir: Option<PathBuf>,

    /// Plaintext password for an encrypted private key.
    /// Prefer installing a `PasswordPrompt`.
    pub password: Option<String>,

    /// OpenSSL cipher list
    pub ciphers: Option<String>,

    /// Accepted protocol versions, e.g. `["tls1_2", "tls1_3"]`
    pub protocols: Vec<String>,

    /// 0: don't verify, 1: verify if presented, 2: require and verify
    #[serde(default = "defaults::verify_peer")]
    pub verify_peer: u8,

    /// Maximum certificate chain depth
    #[serde(default = "defaults::verify_depth_max")]
    pub verify_depth_max: u32,

    /// Skip initialization in `Plugin::create`
    #[serde(default = "defaults::delay_init")]
    pub delay_init: bool,

    /// Security trace level (0-2)
    #[serde(default = "defaults::trace_security")]
    pub trace_security: u8,
}

impl Default for SslConfig {
    fn default() -> Self {
        Self {
            default_dir: None,
            cert_file: None,
            key_file: None,
            cert_auth_file: None,
            cert_auth_dir: None,
            password: None,
            ciphers: None,
            protocols: Vec::new(),
            verify_peer: defaults::verify_peer(),
            verify_depth_max: defaults::verify_depth_max(),
            delay_init: defaults::delay_init(),
            trace_security: defaults::trace_security(),
        }
    }
}

impl SslConfig {
    fn resolve(&self, path: Option<&PathBuf>) -> Option<PathBuf> {
        path.map(|p| resolve_path(self.default_dir.as_deref(), p))
    }

    /// Certificate file resolved against `default_dir`
    pub fn cert_path(&self) -> Option<PathBuf> {
        self.resolve(self.cert_file.as_ref())
    }

    /// Private key file resolved against `default_dir`, falling back to the certificate file
    pub fn key_path(&self) -> Option<PathBuf> {
        self.resolve(self.key_file.as_ref()).or_else(|| self.cert_path())
    }

    /// Trust-store file resolved against `default_dir`
    pub fn cert_auth_path(&self) -> Option<PathBuf> {
        self.resolve(self.cert_auth_file.as_ref())
    }

    /// Trust-store directory resolved against `default_dir`
    pub fn cert_auth_dir_path(&self) -> Option<PathBuf> {
        self.resolve(self.cert_auth_dir.as_ref())
    }

    /// Minimum and maximum protocol versions from `protocols`
    ///
    /// An empty list leaves the library defaults in place. The listed versions
    /// must be consecutive.
    pub fn protocol_range(&self) -> Result<Option<(SslVersion, SslVersion)>> {
        let mut versions = self
            .protocols
            .iter()
            .map(|p| parse_protocol(p))
            .collect::<Result<Vec<_>>>()?;

        versions.sort_by_key(|(rank, _)| *rank);
        versions.dedup_by_key(|(rank, _)| *rank);
        // OpenSSL only takes a min/max pair, so a gap would enable versions
        // that were left out.
        if versions.windows(2).any(|pair| pair[1].0 != pair[0].0 + 1) {
            return Err(TlsError::Config(format!(
                "'protocols' must list consecutive versions: {}",
                self.protocols.join(", ")
            )));
        }

        match (versions.first(), versions.last()) {
            (Some((_, min)), Some((_, max))) => Ok(Some((*min, *max))),
            _ => Ok(None),
        }
    }
}

/// Parse one protocol name; the rank orders versions oldest first
fn parse_protocol(name: &str) -> Result<(u8, SslVersion)> {
    let normalized = name.trim().to_lowercase().replace(['v', '.'], "_").replace("__", "_");
    match normalized.as_str() {
        "tls1" | "tls1_0" | "tls_1" | "tls_1_0" => Ok((0, SslVersion::TLS1)),
        "tls1_1" | "tls_1_1" => Ok((1, SslVersion::TLS1_1)),
        "tls1_2" | "tls_1_2" => Ok((2, SslVersion::TLS1_2)),
        "tls1_3" | "tls_1_3" => Ok((3, SslVersion::TLS1_3)),
        _ => Err(TlsError::Config(format!(
            "Invalid protocol: {}. Valid values are: tls1, tls1_1, tls1_2, tls1_3",
            name
        ))),
    }
}
