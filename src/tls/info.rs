//! Connection information
//!
//! A [`ConnectionInfo`] is a point-in-time snapshot of an established TLS
//! connection: the peer chain, the negotiated cipher and both endpoints. It
//! holds no reference into the connection it was taken from.

use foreign_types_shared::ForeignTypeRef;
use openssl::ssl::SslRef;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_openssl::SslStream;

use super::cert::Certificate;
use crate::common::{Result, TlsError};

/// What the transport exposes about one of its connections
pub trait Connection {
    /// TLS session, `None` for a plain connection
    fn ssl(&self) -> Option<&SslRef>;

    /// Whether the connection has been closed or shut down
    fn is_closed(&self) -> bool;

    fn local_addr(&self) -> io::Result<SocketAddr>;

    fn remote_addr(&self) -> io::Result<SocketAddr>;
}

impl Connection for TcpStream {
    fn ssl(&self) -> Option<&SslRef> {
        None
    }

    fn is_closed(&self) -> bool {
        TcpStream::peer_addr(self).is_err()
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::local_addr(self)
    }

    fn remote_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }
}

impl Connection for SslStream<TcpStream> {
    fn ssl(&self) -> Option<&SslRef> {
        Some(SslStream::ssl(self))
    }

    fn is_closed(&self) -> bool {
        // SAFETY: the pointer comes from the live session owned by `self`;
        // SSL_get_shutdown only reads its shutdown flags.
        let shutdown = unsafe { openssl_sys::SSL_get_shutdown(SslStream::ssl(self).as_ptr()) };
        shutdown != 0 || self.get_ref().is_closed()
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.get_ref().local_addr()
    }

    fn remote_addr(&self) -> io::Result<SocketAddr> {
        self.get_ref().peer_addr()
    }
}

/// Snapshot of an established TLS connection
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    certs: Vec<Arc<Certificate>>,
    cipher: String,
    local_addr: SocketAddr,
    remote_addr: SocketAddr,
}

impl ConnectionInfo {
    pub fn new(
        certs: Vec<Arc<Certificate>>,
        cipher: impl Into<String>,
        local_addr: SocketAddr,
        remote_addr: SocketAddr,
    ) -> Self {
        Self {
            certs,
            cipher: cipher.into(),
            local_addr,
            remote_addr,
        }
    }

    /// Peer certificate chain, peer certificate first; empty if none was presented
    pub fn certs(&self) -> &[Arc<Certificate>] {
        &self.certs
    }

    /// Name of the negotiated cipher
    pub fn cipher(&self) -> &str {
        &self.cipher
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cipher = {}", self.cipher)?;
        writeln!(f, "local address = {}", self.local_addr)?;
        write!(f, "remote address = {}", self.remote_addr)?;
        if self.certs.is_empty() {
            write!(f, "\nno peer certificate")?;
        }
        for (depth, cert) in self.certs.iter().enumerate() {
            write!(
                f,
                "\n[{}] subject = {}, issuer = {}",
                depth,
                cert.subject_dn(),
                cert.issuer_dn()
            )?;
        }
        Ok(())
    }
}

/// Take a [`ConnectionInfo`] snapshot of `conn`
///
/// # Errors
///
/// `ConnectionInvalid` if the connection is closed or not secured by TLS.
pub fn get_connection_info<C: Connection + ?Sized>(conn: &C) -> Result<ConnectionInfo> {
    if conn.is_closed() {
        return Err(TlsError::connection("connection is closed"));
    }

    let ssl = conn
        .ssl()
        .ok_or_else(|| TlsError::connection("not a TLS connection"))?;
    let cipher = ssl
        .current_cipher()
        .map(|c| c.name().to_string())
        .ok_or_else(|| TlsError::connection("no cipher negotiated"))?;

    // The server side chain omits the peer certificate, the client side one
    // starts with it.
    let mut certs: Vec<Arc<Certificate>> = Vec::new();
    if let Some(peer) = ssl.peer_certificate() {
        certs.push(Arc::new(Certificate::from_x509(peer)?));
    }
    if let Some(chain) = ssl.peer_cert_chain() {
        for entry in chain {
            let cert = Certificate::from_x509(entry.to_owned())?;
            if certs.first().map_or(false, |peer| **peer == cert) {
                continue;
            }
            certs.push(Arc::new(cert));
        }
    }

    let local_addr = conn
        .local_addr()
        .map_err(|e| TlsError::connection(format!("no local address: {}", e)))?;
    let remote_addr = conn
        .remote_addr()
        .map_err(|e| TlsError::connection(format!("no remote address: {}", e)))?;

    Ok(ConnectionInfo::new(certs, cipher, local_addr, remote_addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::fixtures;

    struct ClosedConnection;

    impl Connection for ClosedConnection {
        fn ssl(&self) -> Option<&SslRef> {
            None
        }

        fn is_closed(&self) -> bool {
            true
        }

        fn local_addr(&self) -> io::Result<SocketAddr> {
            Err(io::ErrorKind::NotConnected.into())
        }

        fn remote_addr(&self) -> io::Result<SocketAddr> {
            Err(io::ErrorKind::NotConnected.into())
        }
    }

    #[test]
    fn test_closed_connection_is_invalid() {
        match get_connection_info(&ClosedConnection) {
            Err(TlsError::ConnectionInvalid { reason }) => assert!(reason.contains("closed")),
            other => panic!("expected ConnectionInvalid, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_plain_connection_is_invalid() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (client, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
        let client = client.unwrap();
        let _server = accepted.unwrap();

        match get_connection_info(&client) {
            Err(TlsError::ConnectionInvalid { reason }) => assert!(reason.contains("not a TLS")),
            other => panic!("expected ConnectionInvalid, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_shut_down_tls_connection_is_invalid() {
        use openssl::ssl::{Ssl, SslAcceptor, SslConnector, SslMethod, SslVerifyMode};
        use std::pin::Pin;
        use tokio::io::AsyncWriteExt;

        let (cert, key) = fixtures::self_signed("server");
        let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
        acceptor.set_certificate(&cert).unwrap();
        acceptor.set_private_key(&key).unwrap();
        let acceptor = acceptor.build();
        let mut connector = SslConnector::builder(SslMethod::tls()).unwrap();
        connector.set_verify(SslVerifyMode::NONE);
        let connector = connector.build();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (client, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
        let ssl = Ssl::new(acceptor.context()).unwrap();
        let mut server = SslStream::new(ssl, accepted.unwrap().0).unwrap();
        let ssl = Ssl::new(connector.context()).unwrap();
        let mut client = SslStream::new(ssl, client.unwrap()).unwrap();
        let (server_done, client_done) =
            tokio::join!(Pin::new(&mut server).accept(), Pin::new(&mut client).connect());
        server_done.unwrap();
        client_done.unwrap();

        let info = get_connection_info(&client).unwrap();
        assert!(info.certs()[0].subject_dn().contains("CN=server"));

        client.shutdown().await.unwrap();
        match get_connection_info(&client) {
            Err(TlsError::ConnectionInvalid { reason }) => assert!(reason.contains("closed")),
            other => panic!("expected ConnectionInvalid, got {:?}", other),
        }
    }

    #[test]
    fn test_display_lists_chain() {
        let (x509, _) = fixtures::self_signed("peer");
        let cert = Arc::new(Certificate::from_x509(x509).unwrap());
        let info = ConnectionInfo::new(
            vec![cert.clone()],
            "TLS_AES_128_GCM_SHA256",
            "127.0.0.1:4061".parse().unwrap(),
            "127.0.0.1:50000".parse().unwrap(),
        );

        let text = info.to_string();
        assert!(text.contains("cipher = TLS_AES_128_GCM_SHA256"));
        assert!(text.contains("[0] subject = O=Test Org, CN=peer"));
        assert_eq!(info.certs()[0], cert);
        assert_eq!(Arc::strong_count(&cert), 2);
    }
}
