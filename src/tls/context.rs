//! Property-driven SSL context setup
//!
//! Builds the context a plugin uses when the application does not supply
//! its own. Any failing step is reported as an `Initialization` error.

use log::{debug, info};
use openssl::pkey::{PKey, Private};
use openssl::ssl::{
    SslContext, SslContextBuilder, SslFiletype, SslMethod, SslOptions, SslVerifyMode,
};
use openssl::x509::store::X509Lookup;
use openssl::x509::X509;
use std::path::Path;

use super::verifier::PasswordPrompt;
use crate::common::{read_file, Result, TlsError};
use crate::config::SslConfig;

/// How the password callback went for one encrypted key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PasswordOutcome {
    NotNeeded,
    Supplied,
    Missing,
    TooLong,
}

/// Build a context from `config`, asking `prompt` for key passwords
pub(crate) fn build_context(
    config: &SslConfig,
    prompt: Option<&dyn PasswordPrompt>,
) -> Result<SslContext> {
    let mut builder = SslContext::builder(SslMethod::tls())
        .map_err(|e| TlsError::init(format!("cannot create SSL context: {}", e)))?;
    builder.set_options(SslOptions::NO_COMPRESSION);

    configure_protocols(&mut builder, config)?;
    configure_trust_store(&mut builder, config)?;

    if let Some(cert_path) = config.cert_path() {
        load_certificate_chain(&mut builder, &cert_path)?;

        // key_path falls back to the certificate file
        let key_path = config.key_path().unwrap_or(cert_path);
        let key = load_private_key(&key_path, config.password.as_deref(), prompt)?;
        builder
            .set_private_key(&key)
            .and_then(|_| builder.check_private_key())
            .map_err(|e| {
                TlsError::init(format!(
                    "private key {} does not match certificate: {}",
                    key_path.display(),
                    e
                ))
            })?;
    }

    let mode = match config.verify_peer {
        0 => SslVerifyMode::NONE,
        1 => SslVerifyMode::PEER,
        _ => SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT,
    };
    builder.set_verify(mode);
    builder.set_verify_depth(config.verify_depth_max);
    debug!("Peer verification mode {}, depth {}", config.verify_peer, config.verify_depth_max);

    Ok(builder.build())
}

fn configure_protocols(builder: &mut SslContextBuilder, config: &SslConfig) -> Result<()> {
    if let Some((min, max)) = config
        .protocol_range()
        .map_err(|e| TlsError::init(e.to_string()))?
    {
        builder
            .set_min_proto_version(Some(min))
            .and_then(|_| builder.set_max_proto_version(Some(max)))
            .map_err(|e| TlsError::init(format!("cannot set protocol versions: {}", e)))?;
        debug!("Protocols restricted to {:?}", config.protocols);
    }

    if let Some(ciphers) = &config.ciphers {
        builder
            .set_cipher_list(ciphers)
            .map_err(|e| TlsError::init(format!("invalid cipher list '{}': {}", ciphers, e)))?;
        debug!("Cipher list: {}", ciphers);
    }

    Ok(())
}

fn configure_trust_store(builder: &mut SslContextBuilder, config: &SslConfig) -> Result<()> {
    let ca_file = config.cert_auth_path();
    let ca_dir = config.cert_auth_dir_path();

    if let Some(path) = &ca_file {
        builder
            .set_ca_file(path)
            .map_err(|e| {
                TlsError::init(format!("cannot load trust store {}: {}", path.display(), e))
            })?;
        info!("Loaded certificate authorities from {}", path.display());
    }

    if let Some(dir) = &ca_dir {
        if !dir.is_dir() {
            return Err(TlsError::init(format!(
                "trust store directory not found: {}",
                dir.display()
            )));
        }
        builder
            .cert_store_mut()
            .add_lookup(X509Lookup::hash_dir())
            .and_then(|lookup| lookup.add_dir(&dir.to_string_lossy(), SslFiletype::PEM))
            .map_err(|e| {
                TlsError::init(format!(
                    "cannot use trust store directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        info!("Using certificate authority directory {}", dir.display());
    }

    if ca_file.is_none() && ca_dir.is_none() {
        builder
            .set_default_verify_paths()
            .map_err(|e| TlsError::init(format!("cannot load default trust store: {}", e)))?;
        debug!("Using system default trust store");
    }

    Ok(())
}

/// Install the leaf certificate and any chain certificates following it
fn load_certificate_chain(builder: &mut SslContextBuilder, path: &Path) -> Result<()> {
    let data = read_file(path).map_err(|e| TlsError::init(e.to_string()))?;
    let mut chain = X509::stack_from_pem(&data)
        .map_err(|e| {
            TlsError::init(format!("cannot parse certificate file {}: {}", path.display(), e))
        })?
        .into_iter();

    let leaf = chain
        .next()
        .ok_or_else(|| TlsError::init(format!("no certificate found in {}", path.display())))?;
    builder
        .set_certificate(&leaf)
        .map_err(|e| TlsError::init(format!("cannot use certificate {}: {}", path.display(), e)))?;

    for extra in chain {
        builder
            .add_extra_chain_cert(extra)
            .map_err(|e| {
                TlsError::init(format!(
                    "cannot add chain certificate from {}: {}",
                    path.display(),
                    e
                ))
            })?;
    }

    info!("Loaded certificate from {}", path.display());
    Ok(())
}

/// Load a PEM private key, decrypting it if needed
///
/// The prompt wins over the configured password. OpenSSL only invokes the
/// callback for encrypted keys, so plain keys never reach the prompt.
fn load_private_key(
    path: &Path,
    password: Option<&str>,
    prompt: Option<&dyn PasswordPrompt>,
) -> Result<PKey<Private>> {
    let data = read_file(path).map_err(|e| TlsError::init(e.to_string()))?;

    let mut outcome = PasswordOutcome::NotNeeded;
    let result = PKey::private_key_from_pem_callback(&data, |buf| {
        let supplied = match (prompt, password) {
            (Some(prompt), _) => {
                debug!("Requesting password for {}", path.display());
                prompt.password()
            }
            (None, Some(password)) => password.to_string(),
            (None, None) => {
                outcome = PasswordOutcome::Missing;
                return Ok(0);
            }
        };

        let bytes = supplied.as_bytes();
        match buf.get_mut(..bytes.len()) {
            Some(dest) => {
                dest.copy_from_slice(bytes);
                outcome = PasswordOutcome::Supplied;
                Ok(bytes.len())
            }
            None => {
                outcome = PasswordOutcome::TooLong;
                Ok(0)
            }
        }
    });

    result.map_err(|e| {
        let reason = match outcome {
            PasswordOutcome::Missing => {
                "key is encrypted and no password or prompt is configured".to_string()
            }
            PasswordOutcome::TooLong => "password is too long".to_string(),
            PasswordOutcome::Supplied => format!("cannot decrypt key (bad password?): {}", e),
            PasswordOutcome::NotNeeded => format!("cannot parse key: {}", e),
        };
        TlsError::init(format!("{}: {}", path.display(), reason))
    })
}
