//! IP string resolution
//!
//! Turns caller-supplied IP strings into the raw network-order bytes the
//! tree walker consumes. Only numeric addresses are accepted; there is no
//! hostname resolution. IPv4 addresses looked up against an IPv6 database
//! are embedded as v4-mapped (`::ffff:a.b.c.d`), so both spellings of an
//! address land on the same tree path.

use crate::error::AddressError;
use crate::metadata::IpVersion;
use std::net::IpAddr;

/// Raw lookup bytes for one address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddressBytes {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl AddressBytes {
    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            AddressBytes::V4(b) => b,
            AddressBytes::V6(b) => b,
        }
    }
}

/// Parse `ipstr` and shape it for a database of the given IP version.
pub(crate) fn resolve(ipstr: &str, ip_version: IpVersion) -> Result<AddressBytes, AddressError> {
    let addr: IpAddr = ipstr
        .parse()
        .map_err(|_| AddressError::Parse(format!("'{}' is not a numeric IP address", ipstr)))?;
    for_database(addr, ip_version)
}

/// Shape an already-parsed address for a database of the given IP version.
pub(crate) fn for_database(
    addr: IpAddr,
    ip_version: IpVersion,
) -> Result<AddressBytes, AddressError> {
    match (addr, ip_version) {
        (IpAddr::V4(v4), IpVersion::V4) => Ok(AddressBytes::V4(v4.octets())),
        (IpAddr::V4(v4), IpVersion::V6) => Ok(AddressBytes::V6(v4.to_ipv6_mapped().octets())),
        (IpAddr::V6(v6), IpVersion::V6) => Ok(AddressBytes::V6(v6.octets())),
        (IpAddr::V6(v6), IpVersion::V4) => Err(AddressError::Family(format!(
            "cannot look up IPv6 address {} in an IPv4-only database",
            v6
        ))),
    }
}
