//! Distinguished-name and alternative-name rendering

use foreign_types_shared::ForeignTypeRef;
use openssl::stack::StackRef;
use openssl::x509::{GeneralName, GeneralNameRef, X509NameRef};
use std::fmt;
use std::net::Ipv4Addr;

/// GeneralName choice tags of an alternative-name extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum AltNameKind {
    OtherName = 0,
    Rfc822Name = 1,
    DnsName = 2,
    X400Address = 3,
    DirectoryName = 4,
    EdiPartyName = 5,
    UniformResourceIdentifier = 6,
    IpAddress = 7,
    RegisteredId = 8,
}

impl AltNameKind {
    /// Map a raw `GENERAL_NAME` tag
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            openssl_sys::GEN_OTHERNAME => Some(Self::OtherName),
            openssl_sys::GEN_EMAIL => Some(Self::Rfc822Name),
            openssl_sys::GEN_DNS => Some(Self::DnsName),
            openssl_sys::GEN_X400 => Some(Self::X400Address),
            openssl_sys::GEN_DIRNAME => Some(Self::DirectoryName),
            openssl_sys::GEN_EDIPARTY => Some(Self::EdiPartyName),
            openssl_sys::GEN_URI => Some(Self::UniformResourceIdentifier),
            openssl_sys::GEN_IPADD => Some(Self::IpAddress),
            openssl_sys::GEN_RID => Some(Self::RegisteredId),
            _ => None,
        }
    }

    /// Numeric tag as it appears in the extension
    pub fn tag(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for AltNameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OtherName => "otherName",
            Self::Rfc822Name => "rfc822Name",
            Self::DnsName => "dNSName",
            Self::X400Address => "x400Address",
            Self::DirectoryName => "directoryName",
            Self::EdiPartyName => "ediPartyName",
            Self::UniformResourceIdentifier => "uniformResourceIdentifier",
            Self::IpAddress => "iPAddress",
            Self::RegisteredId => "registeredID",
        };
        f.write_str(name)
    }
}

/// One alternative-name entry: its kind and, for supported kinds, its value
pub type AltName = (AltNameKind, String);

/// Render a distinguished name as `SN=value` pairs in certificate order
pub fn format_name(name: &X509NameRef) -> String {
    name.entries()
        .map(|entry| {
            let key = entry
                .object()
                .nid()
                .short_name()
                .map(str::to_string)
                .unwrap_or_else(|_| entry.object().to_string());
            let value = entry
                .data()
                .to_string()
                .unwrap_or_else(|_| String::from_utf8_lossy(entry.data().as_slice()).into_owned());
            format!("{}={}", key, value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn kind_of(name: &GeneralNameRef) -> Option<AltNameKind> {
    // SAFETY: `as_ptr` points at a live GENERAL_NAME owned by the stack we borrow
    // from; its `type_` field is plain data.
    let tag = unsafe { (*name.as_ptr()).type_ };
    AltNameKind::from_tag(tag)
}

/// Value of a supported entry; everything else, IPv6 included, renders empty
fn value_of(kind: AltNameKind, name: &GeneralNameRef) -> String {
    let value = match kind {
        AltNameKind::Rfc822Name => name.email().map(str::to_string),
        AltNameKind::DnsName => name.dnsname().map(str::to_string),
        AltNameKind::UniformResourceIdentifier => name.uri().map(str::to_string),
        AltNameKind::DirectoryName => name.directory_name().map(format_name),
        AltNameKind::IpAddress => name.ipaddress().and_then(|bytes| {
            <[u8; 4]>::try_from(bytes).ok().map(|octets| Ipv4Addr::from(octets).to_string())
        }),
        _ => None,
    };
    value.unwrap_or_default()
}

/// Convert an alternative-name stack into ordered `(kind, value)` pairs
pub fn alt_names(names: &StackRef<GeneralName>) -> Vec<AltName> {
    names
        .iter()
        .filter_map(|name| kind_of(name).map(|kind| (kind, value_of(kind, name))))
        .collect()
}
