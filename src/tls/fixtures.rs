//! Certificate material generated on the fly for unit tests

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509Extension, X509Name, X509NameBuilder, X509};

pub fn key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn dir_name(entry: &str) -> X509Name {
    let mut name = X509NameBuilder::new().unwrap();
    for part in entry.split(',') {
        let (field, value) = part.trim().split_once('=').unwrap();
        name.append_entry_by_text(field, value).unwrap();
    }
    name.build()
}

/// Build a certificate for `cn`, self-signed unless `issuer` is given
///
/// `sans` entries are `DNS:`, `IP:`, `email:`, `URI:` or `dirName:` followed
/// by a comma separated DN.
pub fn cert(
    cn: &str,
    key: &PKey<Private>,
    issuer: Option<(&X509, &PKey<Private>)>,
    not_before: i64,
    not_after: i64,
    sans: &[&str],
) -> X509 {
    cert_with_issuer_alt_names(cn, key, issuer, not_before, not_after, sans, &[])
}

/// Like [`cert`], adding an issuer alternative name extension built from
/// `ians` (`DNS:`, `IP:`, `email:` or `URI:` entries)
pub fn cert_with_issuer_alt_names(
    cn: &str,
    key: &PKey<Private>,
    issuer: Option<(&X509, &PKey<Private>)>,
    not_before: i64,
    not_after: i64,
    sans: &[&str],
    ians: &[&str],
) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "Test Org").unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_dec_str("123456789012345678901234567890").unwrap();
    builder.set_serial_number(&serial.to_asn1_integer().unwrap()).unwrap();
    builder.set_subject_name(&name).unwrap();
    match issuer {
        Some((issuer_cert, _)) => builder.set_issuer_name(issuer_cert.subject_name()).unwrap(),
        None => builder.set_issuer_name(&name).unwrap(),
    }
    builder.set_pubkey(key).unwrap();
    builder.set_not_before(&Asn1Time::from_unix(not_before).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::from_unix(not_after).unwrap()).unwrap();

    if issuer.is_none() {
        builder.append_extension(BasicConstraints::new().critical().ca().build().unwrap()).unwrap();
    }

    if !sans.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for entry in sans {
            match entry.split_once(':') {
                Some(("DNS", v)) => san.dns(v),
                Some(("IP", v)) => san.ip(v),
                Some(("email", v)) => san.email(v),
                Some(("URI", v)) => san.uri(v),
                Some(("dirName", v)) => san.dir_name2(dir_name(v)),
                _ => panic!("unsupported SAN fixture: {}", entry),
            };
        }
        let ext = san
            .build(&builder.x509v3_context(issuer.map(|(c, _)| &**c), None))
            .unwrap();
        builder.append_extension(ext).unwrap();
    }

    if !ians.is_empty() {
        #[allow(deprecated)]
        let ext = X509Extension::new_nid(
            None,
            Some(&builder.x509v3_context(issuer.map(|(c, _)| &**c), None)),
            Nid::ISSUER_ALT_NAME,
            &ians.join(","),
        )
        .unwrap();
        builder.append_extension(ext).unwrap();
    }

    let signer = issuer.map(|(_, k)| k).unwrap_or(key);
    builder.sign(signer, MessageDigest::sha256()).unwrap();
    builder.build()
}

/// A self-signed certificate valid for a day around now
pub fn self_signed(cn: &str) -> (X509, PKey<Private>) {
    let key = key();
    let now = chrono::Utc::now().timestamp();
    let cert = cert(cn, &key, None, now - 3600, now + 86_400, &[]);
    (cert, key)
}
