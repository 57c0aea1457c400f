//! RPC TLS plugin: trust and identity layer of a secure RPC transport
//!
//! This library models the X.509 material and connection facts around an
//! OpenSSL-negotiated session, and lets the host application plug in its
//! own trust policy and key-password source.
//!
//! # Main Features
//!
//! - Immutable [`Certificate`] and [`PublicKey`] wrappers over OpenSSL handles
//! - [`ConnectionInfo`] snapshots of established connections
//! - [`CertificateVerifier`] and [`PasswordPrompt`] extension points
//! - A [`Plugin`] lifecycle that builds the SSL context from [`SslConfig`]
//!   or adopts one supplied by the application
//!
//! # Example
//!
//! ```no_run
//! use rpc_tls_plugin::{Plugin, SslConfig, ConnectionInfo, Result};
//! use rpc_tls_plugin::transport::SecureTransport;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SslConfig {
//!         cert_file: Some("certs/server.pem".into()),
//!         key_file: Some("certs/server.key".into()),
//!         cert_auth_file: Some("certs/ca.pem".into()),
//!         ..SslConfig::default()
//!     };
//!
//!     let mut plugin = Plugin::new(config);
//!     let verifier = |info: &ConnectionInfo| !info.certs().is_empty();
//!     plugin.set_certificate_verifier(Arc::new(verifier))?;
//!     plugin.set_password_prompt(Arc::new(|| std::env::var("KEY_PASSWORD").unwrap_or_default()))?;
//!     plugin.initialize(None)?;
//!
//!     let transport = SecureTransport::new(Arc::new(plugin))?;
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:4064").await?;
//!     let (stream, _) = listener.accept().await?;
//!     let (_stream, info) = transport.accept(stream).await?;
//!     println!("accepted {}", info.remote_addr());
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod config;
pub mod tls;
pub mod transport;

pub use common::{init_logger, Result, TlsError};
pub use config::SslConfig;
pub use tls::{
    get_connection_info, AltName, AltNameKind, Certificate, CertificateVerifier, Connection,
    ConnectionInfo, PasswordPrompt, Plugin, PluginState, PublicKey,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
