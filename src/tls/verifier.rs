//! Extension points implemented by the host application
//!
//! Both capabilities are plain single-method traits. Closures work too:
//!
//! ```
//! use rpc_tls_plugin::tls::{CertificateVerifier, ConnectionInfo, PasswordPrompt};
//!
//! let verifier = |info: &ConnectionInfo| info.certs().len() == 1;
//! let prompt = || "secret".to_string();
//! fn accepts<V: CertificateVerifier, P: PasswordPrompt>(_: V, _: P) {}
//! accepts(verifier, prompt);
//! ```

use super::info::ConnectionInfo;

/// Trust policy invoked once per established connection
///
/// Implementations may be called concurrently from several connection
/// handlers; nothing in this crate serializes the calls.
#[cfg_attr(test, mockall::automock)]
pub trait CertificateVerifier: Send + Sync {
    /// Return `false` to reject the connection, `true` to admit it
    fn verify(&self, info: &ConnectionInfo) -> bool;
}

impl<F> CertificateVerifier for F
where
    F: Fn(&ConnectionInfo) -> bool + Send + Sync,
{
    fn verify(&self, info: &ConnectionInfo) -> bool {
        self(info)
    }
}

/// Credential source for encrypted keys
///
/// Called once per encrypted file opened during initialization. A wrong
/// password fails initialization; retrying is up to the implementation.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordPrompt: Send + Sync {
    fn password(&self) -> String;
}

impl<F> PasswordPrompt for F
where
    F: Fn() -> String + Send + Sync,
{
    fn password(&self) -> String {
        self()
    }
}
