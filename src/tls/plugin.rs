//! Plugin lifecycle
//!
//! A [`Plugin`] owns the SSL context shared by every connection of one
//! transport. It is configured (verifier, password prompt), initialized
//! exactly once, and then consulted per connection:
//!
//! ```text
//! Unconfigured -> Configured -> Initializing -> Ready
//!                                           \-> Failed
//! ```
//!
//! Configuration and initialization take `&mut self` and therefore happen
//! on one thread before the plugin is shared. Once ready, wrap it in an
//! `Arc` and call [`Plugin::context`] and [`Plugin::verify_connection`]
//! from any number of threads.

use log::{debug, error, info, warn};
use openssl::ssl::SslContext;
use std::fmt;
use std::sync::Arc;

use super::context::build_context;
use super::info::{get_connection_info, Connection, ConnectionInfo};
use super::verifier::{CertificateVerifier, PasswordPrompt};
use crate::common::{Result, TlsError};
use crate::config::SslConfig;

/// Lifecycle state of a [`Plugin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Unconfigured,
    Configured,
    Initializing,
    Ready,
    Failed,
}

enum State {
    Unconfigured,
    Configured,
    Initializing,
    Ready(SslContext),
    Failed(String),
}

impl State {
    fn kind(&self) -> PluginState {
        match self {
            State::Unconfigured => PluginState::Unconfigured,
            State::Configured => PluginState::Configured,
            State::Initializing => PluginState::Initializing,
            State::Ready(_) => PluginState::Ready,
            State::Failed(_) => PluginState::Failed,
        }
    }
}

/// TLS plugin bound to one SSL context
pub struct Plugin {
    config: SslConfig,
    state: State,
    verifier: Option<Arc<dyn CertificateVerifier>>,
    prompt: Option<Arc<dyn PasswordPrompt>>,
}

impl Plugin {
    /// Create an unconfigured plugin; nothing is loaded until [`Plugin::initialize`]
    pub fn new(config: SslConfig) -> Self {
        Self {
            config,
            state: State::Unconfigured,
            verifier: None,
            prompt: None,
        }
    }

    /// Create a plugin and initialize it right away unless `delay_init` is set
    ///
    /// Delay initialization when a password prompt or an external context
    /// has to be installed first.
    pub fn create(config: SslConfig) -> Result<Self> {
        config.validate()?;
        config.check();

        let delay = config.delay_init;
        let mut plugin = Self::new(config);
        if delay {
            debug!("Plugin initialization delayed");
        } else {
            plugin.initialize(None)?;
        }
        Ok(plugin)
    }

    pub fn config(&self) -> &SslConfig {
        &self.config
    }

    pub fn state(&self) -> PluginState {
        self.state.kind()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    fn ensure_configurable(&self, what: &str) -> Result<()> {
        match self.state {
            State::Unconfigured | State::Configured => Ok(()),
            _ => Err(TlsError::Usage(format!(
                "cannot set {} once the plugin is {:?}",
                what,
                self.state.kind()
            ))),
        }
    }

    /// Install the certificate verifier, replacing any previous one
    ///
    /// Only allowed before initialization. The verifier is consulted for
    /// connections established afterwards; there is no re-verification.
    pub fn set_certificate_verifier(
        &mut self,
        verifier: Arc<dyn CertificateVerifier>,
    ) -> Result<()> {
        self.ensure_configurable("certificate verifier")?;
        self.verifier = Some(verifier);
        self.state = State::Configured;
        debug!("Certificate verifier installed");
        Ok(())
    }

    /// Install the password prompt used to open encrypted keys
    pub fn set_password_prompt(&mut self, prompt: Arc<dyn PasswordPrompt>) -> Result<()> {
        self.ensure_configurable("password prompt")?;
        self.prompt = Some(prompt);
        self.state = State::Configured;
        debug!("Password prompt installed");
        Ok(())
    }

    /// Initialize the plugin
    ///
    /// With `Some(context)` the application-supplied context is adopted as-is
    /// and the configuration's file, trust-store and cipher settings are
    /// ignored. Otherwise the context is built from the configuration,
    /// asking the password prompt for every encrypted key.
    ///
    /// A failed plugin stays failed; create a new one to retry.
    pub fn initialize(&mut self, context: Option<SslContext>) -> Result<()> {
        match &self.state {
            State::Unconfigured | State::Configured => {}
            State::Failed(reason) => {
                return Err(TlsError::Usage(format!(
                    "plugin initialization already failed: {}",
                    reason
                )));
            }
            _ => return Err(TlsError::Usage("plugin is already initialized".to_string())),
        }

        self.state = State::Initializing;

        let result = match context {
            Some(context) => {
                info!("Using application-supplied SSL context");
                Ok(context)
            }
            None => build_context(&self.config, self.prompt.as_deref()),
        };

        match result {
            Ok(context) => {
                self.state = State::Ready(context);
                info!("TLS plugin initialized");
                Ok(())
            }
            Err(e) => {
                error!("TLS plugin initialization failed: {}", e);
                self.state = State::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// The live SSL context; only available once ready
    pub fn context(&self) -> Result<&SslContext> {
        match &self.state {
            State::Ready(context) => Ok(context),
            other => Err(TlsError::Usage(format!(
                "SSL context is not available while the plugin is {:?}",
                other.kind()
            ))),
        }
    }

    /// Snapshot `conn` and run the installed verifier on it
    ///
    /// Called by the transport after each handshake and before any
    /// application data is exchanged.
    ///
    /// # Errors
    ///
    /// `ConnectionInvalid` for a closed or plain connection, `Rejected` when
    /// the verifier refuses the connection.
    pub fn verify_connection<C: Connection + ?Sized>(&self, conn: &C) -> Result<ConnectionInfo> {
        self.context()?;
        let info = get_connection_info(conn)?;

        if self.config.trace_security >= 1 {
            info!("SSL connection summary:\n{}", info);
        }
        if self.config.trace_security >= 2 {
            for cert in info.certs() {
                debug!("Peer certificate:\n{}", cert);
            }
        }

        if let Some(verifier) = &self.verifier {
            if !verifier.verify(&info) {
                warn!("Connection from {} rejected by certificate verifier", info.remote_addr());
                return Err(TlsError::Rejected(format!(
                    "certificate verifier rejected connection from {}",
                    info.remote_addr()
                )));
            }
        }

        Ok(info)
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("state", &self.state.kind())
            .field("verifier", &self.verifier.is_some())
            .field("prompt", &self.prompt.is_some())
            .finish()
    }
}
