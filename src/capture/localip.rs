//! Enumerates IP addresses bound to the host's interfaces.
//!
//! Used only by the direction classifier; refreshed once at startup, not
//! during the run (spec.md §4.3).

use std::collections::HashSet;
use std::net::IpAddr;

use nix::ifaddrs::getifaddrs;

/// The set of IP addresses assigned to this host's interfaces.
#[derive(Debug, Clone, Default)]
pub struct LocalIpSet(HashSet<IpAddr>);

impl LocalIpSet {
    /// Enumerate the host's interface addresses.
    pub fn discover() -> anyhow::Result<Self> {
        let mut set = HashSet::new();
        for iface in getifaddrs()? {
            let Some(address) = iface.address else {
                continue;
            };
            if let Some(sockaddr) = address.as_sockaddr_in() {
                set.insert(IpAddr::V4(std::net::Ipv4Addr::from(sockaddr.ip())));
            } else if let Some(sockaddr) = address.as_sockaddr_in6() {
                set.insert(IpAddr::V6(sockaddr.ip()));
            }
        }
        Ok(Self(set))
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.0.contains(ip)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a set directly from addresses; used by tests and call sites
    /// that already have a resolved address list.
    pub fn from_addrs(addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        Self(addrs.into_iter().collect())
    }
}
