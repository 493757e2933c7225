//! Name resolution
//!
//! Resolvers turn a hostname into a single textual IP address. The pipeline
//! only depends on the [`NameResolver`] trait; [`SystemResolver`] goes
//! through the platform resolver (`getaddrinfo`) and [`StaticResolver`]
//! answers from a fixed table, which keeps tests and benchmarks off the
//! network.

use crate::error::ResolveError;
use std::collections::HashMap;
use std::net::{IpAddr, ToSocketAddrs};

/// Resolves a hostname to one IP address
pub trait NameResolver: Send + Sync {
    fn resolve(&self, hostname: &str) -> Result<IpAddr, ResolveError>;
}

/// Which address family to prefer when a host has several addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AddressFamily {
    /// First address returned, IPv4 or IPv6
    #[default]
    Any,
    /// First IPv4 address
    Ipv4,
    /// First IPv6 address
    Ipv6,
}

impl AddressFamily {
    fn accepts(self, ip: &IpAddr) -> bool {
        match self {
            AddressFamily::Any => true,
            AddressFamily::Ipv4 => ip.is_ipv4(),
            AddressFamily::Ipv6 => ip.is_ipv6(),
        }
    }
}

/// Resolver backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver {
    family: AddressFamily,
}

impl SystemResolver {
    pub fn new(family: AddressFamily) -> Self {
        Self { family }
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }
}

impl NameResolver for SystemResolver {
    fn resolve(&self, hostname: &str) -> Result<IpAddr, ResolveError> {
        let addrs = (hostname, 0)
            .to_socket_addrs()
            .map_err(|source| ResolveError::Lookup {
                hostname: hostname.to_string(),
                source,
            })?;

        addrs
            .map(|addr| addr.ip())
            .find(|ip| self.family.accepts(ip))
            .ok_or_else(|| ResolveError::NoAddress {
                hostname: hostname.to_string(),
            })
    }
}

/// Resolver answering from a fixed hostname table
///
/// Names missing from the table fail with [`ResolveError::NoAddress`].
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    table: HashMap<String, IpAddr>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry
    pub fn with_entry(mut self, hostname: impl Into<String>, ip: IpAddr) -> Self {
        self.table.insert(hostname.into(), ip);
        self
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl FromIterator<(String, IpAddr)> for StaticResolver {
    fn from_iter<I: IntoIterator<Item = (String, IpAddr)>>(iter: I) -> Self {
        Self {
            table: iter.into_iter().collect(),
        }
    }
}

impl NameResolver for StaticResolver {
    fn resolve(&self, hostname: &str) -> Result<IpAddr, ResolveError> {
        self.table
            .get(hostname)
            .copied()
            .ok_or_else(|| ResolveError::NoAddress {
                hostname: hostname.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_system_resolver_ip_literal() {
        // IP literals are parsed locally, no DNS traffic involved
        let resolver = SystemResolver::default();
        let ip = resolver.resolve("127.0.0.1").unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::LOCALHOST));

        let ip = resolver.resolve("::1").unwrap();
        assert_eq!(ip, IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[test]
    fn test_system_resolver_family_filter() {
        let v6_only = SystemResolver::new(AddressFamily::Ipv6);
        assert!(matches!(
            v6_only.resolve("127.0.0.1"),
            Err(ResolveError::NoAddress { .. })
        ));

        let v4_only = SystemResolver::new(AddressFamily::Ipv4);
        assert!(v4_only.resolve("127.0.0.1").is_ok());
    }

    #[test]
    fn test_static_resolver() {
        let resolver = StaticResolver::new()
            .with_entry("example.com", IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)));

        assert_eq!(resolver.len(), 1);
        assert_eq!(
            resolver.resolve("example.com").unwrap().to_string(),
            "93.184.216.34"
        );
        assert!(matches!(
            resolver.resolve("bogus.invalid"),
            Err(ResolveError::NoAddress { hostname }) if hostname == "bogus.invalid"
        ));
    }

    #[test]
    fn test_static_resolver_from_iter() {
        let resolver: StaticResolver = vec![
            ("a.test".to_string(), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))),
            ("b.test".to_string(), IpAddr::V6(Ipv6Addr::LOCALHOST)),
        ]
        .into_iter()
        .collect();

        assert_eq!(resolver.resolve("b.test").unwrap().to_string(), "::1");
    }
}
