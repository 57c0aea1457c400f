//! Error handling module
//!
//! This module defines the error types and result type alias used across the crate.
//! Every error is reported synchronously to the caller of the operation that
//! detected it. Signature mismatches and verifier decisions are plain booleans
//! and never surface here, with the exception of [`TlsError::Rejected`], which
//! the bundled acceptor raises after the verifier refused a connection.

use std::io;
use thiserror::Error;

/// TLS plugin error type
#[derive(Error, Debug)]
pub enum TlsError {
    /// Certificate file missing, unreadable, or not PEM
    #[error("certificate read error: {reason}")]
    CertificateRead { reason: String },

    /// Malformed in-memory PEM
    #[error("certificate encoding error: {reason}")]
    CertificateEncoding { reason: String },

    /// Connection closed or not secured by TLS
    #[error("connection invalid: {reason}")]
    ConnectionInvalid { reason: String },

    /// Property-driven setup failure
    #[error("initialization error: {reason}")]
    Initialization { reason: String },

    /// Lifecycle method called in the wrong state
    #[error("usage error: {0}")]
    Usage(String),

    /// TLS handshake error
    #[error("TLS handshake error: {0}")]
    Handshake(String),

    /// Connection refused by the certificate verifier
    #[error("connection rejected: {0}")]
    Rejected(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// OpenSSL error
    #[error("OpenSSL error: {0}")]
    Ssl(#[from] openssl::error::ErrorStack),
}

impl TlsError {
    pub(crate) fn read(reason: impl Into<String>) -> Self {
        Self::CertificateRead { reason: reason.into() }
    }

    pub(crate) fn encoding(reason: impl Into<String>) -> Self {
        Self::CertificateEncoding { reason: reason.into() }
    }

    pub(crate) fn connection(reason: impl Into<String>) -> Self {
        Self::ConnectionInvalid { reason: reason.into() }
    }

    pub(crate) fn init(reason: impl Into<String>) -> Self {
        Self::Initialization { reason: reason.into() }
    }
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `TlsError`.
pub type Result<T> = std::result::Result<T, TlsError>;
