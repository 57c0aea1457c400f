//! Default configuration values
//!
//! Single source of truth for property defaults.

/// Environment variable prefix for all configuration options
pub const ENV_PREFIX: &str = "RPC_TLS";

/// Configuration keys read from `RPC_TLS_*` variables; other variables
/// under the prefix belong to the embedding application and are ignored
pub const ENV_KEYS: &[&str] = &[
    "default_dir",
    "cert_file",
    "key_file",
    "cert_auth_file",
    "cert_auth_dir",
    "password",
    "ciphers",
    "protocols",
    "verify_peer",
    "verify_depth_max",
    "delay_init",
    "trace_security",
];

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "rpc-tls.json";

/// Highest accepted `verify_peer` value
pub const MAX_VERIFY_PEER: u8 = 2;

/// Highest accepted `trace_security` value
pub const MAX_TRACE_LEVEL: u8 = 2;

/// Default peer verification: require a certificate and verify it
pub fn verify_peer() -> u8 {
    2
}

/// Default maximum certificate chain depth
pub fn verify_depth_max() -> u32 {
    2
}

/// Initialize immediately unless asked otherwise
pub fn delay_init() -> bool {
    false
}

/// Security tracing is off by default
pub fn trace_security() -> u8 {
    0
}
