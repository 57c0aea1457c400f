//! Configuration validation

use log::warn;

use super::defaults::{MAX_TRACE_LEVEL, MAX_VERIFY_PEER};
use super::SslConfig;
use crate::common::{check_file_exists, Result, TlsError};

impl SslConfig {
    /// Check value ranges, option combinations and referenced files
    ///
    /// With `delay_init` set the files are only checked at initialization,
    /// so they may be provisioned after the configuration is loaded.
    pub fn validate(&self) -> Result<()> {
        if self.verify_peer > MAX_VERIFY_PEER {
            return Err(TlsError::Config(format!(
                "Invalid value for 'verify_peer': {} (expected 0..={})",
                self.verify_peer, MAX_VERIFY_PEER
            )));
        }

        if self.trace_security > MAX_TRACE_LEVEL {
            return Err(TlsError::Config(format!(
                "Invalid value for 'trace_security': {} (expected 0..={})",
                self.trace_security, MAX_TRACE_LEVEL
            )));
        }

        if self.verify_depth_max == 0 {
            return Err(TlsError::Config("'verify_depth_max' must be at least 1".to_string()));
        }

        if self.key_file.is_some() && self.cert_file.is_none() {
            return Err(TlsError::Config("'key_file' requires 'cert_file'".to_string()));
        }

        self.protocol_range()?;

        if !self.delay_init {
            self.validate_files()?;
        }
        Ok(())
    }

    fn validate_files(&self) -> Result<()> {
        let files = [
            ("cert_file", self.cert_path()),
            ("key_file", self.key_path()),
            ("cert_auth_file", self.cert_auth_path()),
        ];
        for (name, path) in files {
            if let Some(path) = path {
                check_file_exists(&path)
                    .map_err(|e| TlsError::Config(format!("Invalid '{}': {}", name, e)))?;
            }
        }

        if let Some(dir) = self.cert_auth_dir_path() {
            if !dir.is_dir() {
                return Err(TlsError::Config(format!(
                    "Invalid 'cert_auth_dir': not a directory: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Collect non-fatal warnings about the configuration
    pub fn check(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.password.is_some() {
            warnings.push(
                "Plaintext 'password' in configuration; prefer a password prompt".to_string(),
            );
        }
        if self.verify_peer == 0 {
            warnings.push("Peer verification disabled ('verify_peer' = 0)".to_string());
        }
        if self.cert_auth_file.is_none() && self.cert_auth_dir.is_none() && self.verify_peer > 0 {
            warnings.push("No trust store configured; using system default CA paths".to_string());
        }

        for warning in &warnings {
            warn!("{}", warning);
        }
        warnings
    }
}
