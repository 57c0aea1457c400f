//! Shared certificate material for integration tests
//!
//! Everything is generated at runtime and written to a temporary directory.

#![allow(dead_code)]

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::symm::Cipher;
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509NameBuilder, X509};
use std::path::PathBuf;
use tempfile::TempDir;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct Identity {
    pub cert: X509,
    pub key: PKey<Private>,
}

impl Identity {
    pub fn cert_pem(&self) -> String {
        String::from_utf8(self.cert.to_pem().unwrap()).unwrap()
    }
}

fn new_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

/// Issue a certificate; self-signed CA when `issuer` is `None`
pub fn issue(cn: &str, issuer: Option<&Identity>, sans: &[&str]) -> Identity {
    let key = new_key();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    let name = name.build();

    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder.set_serial_number(&serial.to_asn1_integer().unwrap()).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder
        .set_issuer_name(issuer.map(|i| i.cert.subject_name()).unwrap_or(&*name))
        .unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(30).unwrap()).unwrap();

    if issuer.is_none() {
        builder.append_extension(BasicConstraints::new().critical().ca().build().unwrap()).unwrap();
    }

    if !sans.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for entry in sans {
            match entry.split_once(':') {
                Some(("DNS", v)) => san.dns(v),
                Some(("IP", v)) => san.ip(v),
                _ => panic!("unsupported SAN fixture: {}", entry),
            };
        }
        let ext = san
            .build(&builder.x509v3_context(issuer.map(|i| &*i.cert), None))
            .unwrap();
        builder.append_extension(ext).unwrap();
    }

    let signer = issuer.map(|i| &i.key).unwrap_or(&key);
    builder.sign(signer, MessageDigest::sha256()).unwrap();

    Identity { cert: builder.build(), key }
}

/// Temporary directory holding PEM files
pub struct Pki {
    pub dir: TempDir,
}

impl Pki {
    pub fn new() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    pub fn write(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    /// Write `identity`'s certificate followed by `chain`
    pub fn write_cert(&self, name: &str, identity: &Identity, chain: &[&Identity]) -> PathBuf {
        let mut pem = identity.cert.to_pem().unwrap();
        for extra in chain {
            pem.extend(extra.cert.to_pem().unwrap());
        }
        self.write(name, &pem)
    }

    pub fn write_key(&self, name: &str, identity: &Identity) -> PathBuf {
        self.write(name, &identity.key.private_key_to_pem_pkcs8().unwrap())
    }

    pub fn write_encrypted_key(&self, name: &str, identity: &Identity, password: &str) -> PathBuf {
        let pem = identity
            .key
            .private_key_to_pem_pkcs8_passphrase(Cipher::aes_256_cbc(), password.as_bytes())
            .unwrap();
        self.write(name, &pem)
    }
}
