//! Handshake and verification of individual connections

use log::{debug, error};
use openssl::ssl::Ssl;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_openssl::SslStream;

use crate::common::{Result, TlsError};
use crate::tls::{ConnectionInfo, Plugin};

/// A verified stream and the snapshot it was admitted with
type Secured = (SslStream<TcpStream>, ConnectionInfo);

/// Secure side of a transport: handshake, snapshot, verify
///
/// Cheap to clone; every clone shares the same plugin.
#[derive(Debug, Clone)]
pub struct SecureTransport {
    plugin: Arc<Plugin>,
}

impl SecureTransport {
    /// Wrap a ready plugin
    ///
    /// # Errors
    ///
    /// `Usage` if the plugin has not been initialized.
    pub fn new(plugin: Arc<Plugin>) -> Result<Self> {
        plugin.context()?;
        Ok(Self { plugin })
    }

    pub fn plugin(&self) -> &Arc<Plugin> {
        &self.plugin
    }

    /// Run the server side of the handshake on an accepted stream
    ///
    /// On success the stream is ready for application data. A connection the
    /// verifier refuses is shut down and reported as `Rejected`.
    pub async fn accept(&self, stream: TcpStream) -> Result<Secured> {
        let mut stream = self.secure_stream(stream)?;

        if let Err(e) = Pin::new(&mut stream).accept().await {
            error!("TLS handshake failed: {}", e);
            return Err(TlsError::Handshake(e.to_string()));
        }
        debug!("TLS handshake successful");

        self.verify(stream).await
    }

    /// Run the client side of the handshake on a connected stream
    pub async fn connect(&self, stream: TcpStream) -> Result<Secured> {
        let mut stream = self.secure_stream(stream)?;

        if let Err(e) = Pin::new(&mut stream).connect().await {
            error!("TLS handshake failed: {}", e);
            return Err(TlsError::Handshake(e.to_string()));
        }
        debug!("TLS handshake successful");

        self.verify(stream).await
    }

    fn secure_stream(&self, stream: TcpStream) -> Result<SslStream<TcpStream>> {
        let ssl = Ssl::new(self.plugin.context()?)?;
        Ok(SslStream::new(ssl, stream)?)
    }

    async fn verify(&self, mut stream: SslStream<TcpStream>) -> Result<Secured> {
        match self.plugin.verify_connection(&stream) {
            Ok(info) => Ok((stream, info)),
            Err(e) => {
                if let Err(shutdown_err) = stream.shutdown().await {
                    debug!("Shutdown after rejection failed: {}", shutdown_err);
                }
                Err(e)
            }
        }
    }
}
