//! IPv4 CIDR matching for trusted network ranges
//!
//! Ranges are written `subnet/bits`. The subnet is truncated to its prefix
//! when parsed, so a mis-aligned range such as `10.0.0.5/8` covers the same
//! addresses as `10.0.0.0/8`. IPv6 addresses and ranges never match.

use crate::error::{AuthzError, Result};
use ipnet::Ipv4Net;
use serde::{Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// A parsed, prefix-aligned IPv4 range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrustedRange {
    net: Ipv4Net,
}

impl TrustedRange {
    /// Parse `subnet/bits`, re-masking the subnet
    pub fn parse(range: &str) -> Result<Self> {
        let trimmed = range.trim();
        if !trimmed.contains('/') {
            return Err(AuthzError::InvalidCidr {
                range: range.to_string(),
                reason: "missing '/bits' prefix length".to_string(),
            });
        }

        let net = Ipv4Net::from_str(trimmed).map_err(|e| AuthzError::InvalidCidr {
            range: range.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { net: net.trunc() })
    }

    /// Whether `ip` falls inside this range
    ///
    /// Unparseable and IPv6 addresses are outside every range.
    pub fn contains(&self, ip: &str) -> bool {
        match Ipv4Addr::from_str(ip.trim()) {
            Ok(addr) => self.contains_addr(addr),
            Err(_) => false,
        }
    }

    pub fn contains_addr(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & u32::from(self.net.netmask()) == u32::from(self.net.network())
    }

    /// Network address (already masked)
    pub fn network(&self) -> Ipv4Addr {
        self.net.network()
    }

    pub fn prefix_len(&self) -> u8 {
        self.net.prefix_len()
    }
}

impl FromStr for TrustedRange {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TrustedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.net)
    }
}

impl Serialize for TrustedRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Whether `ip` lies inside `cidr`
///
/// A malformed range matches nothing.
pub fn matches(ip: &str, cidr: &str) -> bool {
    TrustedRange::parse(cidr)
        .map(|range| range.contains(ip))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_range() {
        assert!(matches("127.0.0.1", "127.0.0.0/8"));
        assert!(matches("127.255.10.3", "127.0.0.0/8"));
        assert!(!matches("10.0.0.1", "127.0.0.0/8"));
    }

    #[test]
    fn test_class_c_range() {
        assert!(matches("10.0.0.5", "10.0.0.0/24"));
        assert!(matches("10.0.0.255", "10.0.0.0/24"));
        assert!(!matches("10.0.1.5", "10.0.0.0/24"));
    }

    #[test]
    fn test_misaligned_subnet_is_remasked() {
        assert!(matches("10.0.0.5", "10.0.0.1/24"));

        let range = TrustedRange::parse("10.0.0.5/8").unwrap();
        assert_eq!(range.network(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(range.to_string(), "10.0.0.0/8");
        assert!(range.contains("10.200.1.1"));
    }

    #[test]
    fn test_prefix_edges() {
        assert!(matches("203.0.113.9", "0.0.0.0/0"));
        assert!(matches("203.0.113.9", "203.0.113.9/32"));
        assert!(!matches("203.0.113.8", "203.0.113.9/32"));

        assert_eq!(TrustedRange::parse("0.0.0.0/0").unwrap().prefix_len(), 0);
        assert_eq!(TrustedRange::parse("203.0.113.9/32").unwrap().prefix_len(), 32);
    }

    #[test]
    fn test_malformed_ranges_match_nothing() {
        for bad in ["", "127.0.0.1", "127.0.0.0/", "127.0.0.0/33", "not-an-ip/8", "::1/128"] {
            assert!(!matches("127.0.0.1", bad), "range {:?} should not match", bad);
            assert!(TrustedRange::parse(bad).is_err(), "range {:?} should not parse", bad);
        }
    }

    #[test]
    fn test_invalid_addresses_never_match() {
        assert!(!matches("", "0.0.0.0/0"));
        assert!(!matches("localhost", "127.0.0.0/8"));
        assert!(!matches("::1", "0.0.0.0/0"));
    }

    #[test]
    fn test_parse_error_names_range() {
        let err = TrustedRange::parse("10.0.0.0/40").unwrap_err();
        assert!(err.to_string().contains("10.0.0.0/40"));
    }
}
