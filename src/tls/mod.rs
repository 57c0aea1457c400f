//! TLS trust and identity module
//!
//! Certificates, connection snapshots, the verifier and password-prompt
//! extension points, and the plugin lifecycle that binds them to an
//! OpenSSL context.

mod cert;
mod context;
mod info;
mod names;
mod plugin;
mod verifier;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cert::{Certificate, PublicKey};
pub use info::{get_connection_info, Connection, ConnectionInfo};
pub use names::{AltName, AltNameKind};
pub use plugin::{Plugin, PluginState};
pub use verifier::{CertificateVerifier, PasswordPrompt};
