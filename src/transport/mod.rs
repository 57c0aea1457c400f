//! Transport glue
//!
//! Runs TLS handshakes for a ready [`Plugin`](crate::tls::Plugin) and applies
//! its certificate verifier before the connection is handed to the RPC layer.

mod handshake;

pub use handshake::SecureTransport;
