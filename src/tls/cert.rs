//! Certificate handling module
//!
//! [`Certificate`] is an immutable wrapper over one parsed X.509 certificate.
//! Its interface follows `java.security.cert.X509Certificate`: identity,
//! validity window, serial number and alternative names are read on demand
//! from the wrapped OpenSSL handle.

use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::hash::MessageDigest;
use openssl::pkey::{Id, PKey, PKeyRef, Public};
use openssl::x509::{X509Ref, X509};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;

use super::names::{alt_names, format_name, AltName};
use crate::common::{read_file, Result, TlsError};

/// Public key extracted from a [`Certificate`]
///
/// The key is reference counted by OpenSSL at extraction time, so it stays
/// valid after the certificate it came from is dropped. There is no other way
/// to construct one.
#[derive(Clone)]
pub struct PublicKey {
    key: PKey<Public>,
}

impl PublicKey {
    /// Raw OpenSSL key handle
    pub fn key(&self) -> &PKeyRef<Public> {
        &self.key
    }

    /// Key size in bits
    pub fn bits(&self) -> u32 {
        self.key.bits()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let algorithm = match self.key.id() {
            Id::RSA => "RSA",
            Id::EC => "EC",
            Id::ED25519 => "Ed25519",
            Id::ED448 => "Ed448",
            Id::DSA => "DSA",
            _ => "other",
        };
        f.debug_struct("PublicKey")
            .field("algorithm", &algorithm)
            .field("bits", &self.key.bits())
            .finish()
    }
}

/// Immutable X.509 certificate
///
/// Equality is structural: two certificates are equal iff their DER
/// encodings are byte-identical. Share one instance with `Arc<Certificate>`.
#[derive(Clone)]
pub struct Certificate {
    cert: X509,
    der: Vec<u8>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

/// Convert an ASN.1 time into a UTC timestamp with second precision
fn to_utc(time: &Asn1TimeRef) -> Result<DateTime<Utc>> {
    let epoch = Asn1Time::from_unix(0)?;
    let diff = epoch.diff(time)?;
    let secs = i64::from(diff.days) * 86_400 + i64::from(diff.secs);

    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| TlsError::encoding(format!("certificate time out of range: {}", time)))
}

impl Certificate {
    /// Take ownership of an already-parsed certificate
    ///
    /// This is how certificates received during a handshake are wrapped.
    pub fn from_x509(cert: X509) -> Result<Self> {
        let der = cert
            .to_der()
            .map_err(|e| TlsError::encoding(format!("cannot encode certificate: {}", e)))?;
        let not_before = to_utc(cert.not_before())?;
        let not_after = to_utc(cert.not_after())?;

        Ok(Self { cert, der, not_before, not_after })
    }

    /// Load the first certificate of a PEM file
    ///
    /// # Errors
    ///
    /// `CertificateRead` if the file is missing, unreadable or not PEM.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = read_file(path)?;

        let cert = X509::from_pem(&data).map_err(|e| {
            TlsError::read(format!("cannot parse PEM certificate {}: {}", path.display(), e))
        })?;
        debug!("Loaded certificate from {}", path.display());

        Self::from_x509(cert).map_err(|e| TlsError::read(format!("{}: {}", path.display(), e)))
    }

    /// Load every certificate of a PEM bundle, in file order
    pub fn load_chain<P: AsRef<Path>>(path: P) -> Result<Vec<Self>> {
        let path = path.as_ref();
        let data = read_file(path)?;

        let stack = X509::stack_from_pem(&data).map_err(|e| {
            TlsError::read(format!("cannot parse PEM bundle {}: {}", path.display(), e))
        })?;
        if stack.is_empty() {
            return Err(TlsError::read(format!("no certificate found in {}", path.display())));
        }

        stack.into_iter().map(Self::from_x509).collect()
    }

    /// Decode a certificate from PEM text
    ///
    /// # Errors
    ///
    /// `CertificateEncoding` on malformed input.
    pub fn decode(pem: &str) -> Result<Self> {
        let cert = X509::from_pem(pem.as_bytes())
            .map_err(|e| TlsError::encoding(format!("cannot decode PEM certificate: {}", e)))?;
        Self::from_x509(cert)
    }

    /// Encode as PEM text
    pub fn encode(&self) -> Result<String> {
        let pem = self.cert.to_pem()?;
        String::from_utf8(pem).map_err(|e| TlsError::encoding(e.to_string()))
    }

    /// DER bytes of the certificate
    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    /// Borrow the wrapped OpenSSL certificate
    ///
    /// The reference lives as long as `self`; clone the `X509` to keep it longer.
    pub fn as_x509(&self) -> &X509Ref {
        &self.cert
    }

    /// Extract the embedded public key
    pub fn public_key(&self) -> Result<PublicKey> {
        Ok(PublicKey { key: self.cert.public_key()? })
    }

    /// Whether this certificate was signed by `key`
    ///
    /// A mismatch, including a key of the wrong algorithm, is `false`.
    pub fn verify(&self, key: &PublicKey) -> bool {
        match self.cert.verify(&key.key) {
            Ok(valid) => valid,
            Err(e) => {
                debug!("Signature check failed: {}", e);
                false
            }
        }
    }

    /// Whether the certificate is valid now
    pub fn check_validity(&self) -> bool {
        self.check_validity_at(Utc::now())
    }

    /// Whether `at` falls within `[not_before, not_after]`
    pub fn check_validity_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at <= self.not_after
    }

    /// Start of the validity window
    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// End of the validity window
    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Serial number as a decimal string
    pub fn serial_number(&self) -> Result<String> {
        let serial = self.cert.serial_number().to_bn()?;
        Ok(serial.to_dec_str()?.to_string())
    }

    /// Raw X.509 version field (a v3 certificate reports 2)
    pub fn version(&self) -> i32 {
        self.cert.version()
    }

    pub fn issuer_dn(&self) -> String {
        format_name(self.cert.issuer_name())
    }

    pub fn subject_dn(&self) -> String {
        format_name(self.cert.subject_name())
    }

    /// Entries of the issuer alternative-name extension
    ///
    /// Only rfc822Name, dNSName, directoryName, uniformResourceIdentifier and
    /// IPv4 iPAddress entries carry a value. IPv6 addresses and the remaining
    /// kinds are reported with an empty string; use [`Certificate::as_x509`]
    /// to read them.
    pub fn issuer_alt_names(&self) -> Vec<AltName> {
        self.cert
            .issuer_alt_names()
            .map(|names| alt_names(&names))
            .unwrap_or_default()
    }

    /// Entries of the subject alternative-name extension
    ///
    /// See [`Certificate::issuer_alt_names`] for the rendering rules.
    pub fn subject_alt_names(&self) -> Vec<AltName> {
        self.cert
            .subject_alt_names()
            .map(|names| alt_names(&names))
            .unwrap_or_default()
    }

    /// SHA-256 fingerprint as colon-separated hex
    pub fn fingerprint(&self) -> Result<String> {
        let digest = self.cert.digest(MessageDigest::sha256())?;
        Ok(digest
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<String>>()
            .join(":"))
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Hash for Certificate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.der.hash(state);
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject_dn())
            .field("issuer", &self.issuer_dn())
            .field("not_before", &self.not_before)
            .field("not_after", &self.not_after)
            .finish()
    }
}

/// Human-readable dump, not a re-parseable encoding
impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cert.to_text() {
            Ok(text) => f.write_str(&String::from_utf8_lossy(&text)),
            Err(_) => write!(
                f,
                "subject: {}\nissuer: {}\nvalidity: {} - {}",
                self.subject_dn(),
                self.issuer_dn(),
                self.not_before,
                self.not_after
            ),
        }
    }
}
