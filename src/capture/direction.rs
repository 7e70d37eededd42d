//! Classifies a packet's direction relative to the host.

use std::net::IpAddr;

use super::localip::LocalIpSet;

/// Direction of a packet relative to the local host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    Unknown,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::Unknown => "unknown",
        }
    }
}

/// Classify a packet given its source/destination IPs and the local-IP set.
///
/// "out" if src is local and dst is not; "in" if dst is local and src is
/// not; "unknown" for both the loopback case (both local) and the
/// pass-through case (neither local). This policy is deliberate and
/// test-visible (spec.md §4.4).
pub fn classify(src: &IpAddr, dst: &IpAddr, local: &LocalIpSet) -> Direction {
    let src_local = local.contains(src);
    let dst_local = local.contains(dst);
    match (src_local, dst_local) {
        (true, false) => Direction::Out,
        (false, true) => Direction::In,
        _ => Direction::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn local_set(ips: &[Ipv4Addr]) -> LocalIpSet {
        LocalIpSet::from_addrs(ips.iter().map(|ip| IpAddr::V4(*ip)))
    }

    #[test]
    fn exhaustive_truth_table() {
        let a = Ipv4Addr::new(10, 0, 0, 1);
        let b = Ipv4Addr::new(8, 8, 8, 8);
        let local = local_set(&[a]);

        assert_eq!(
            classify(&IpAddr::V4(b), &IpAddr::V4(b), &LocalIpSet::default()),
            Direction::Unknown
        );
        assert_eq!(
            classify(&IpAddr::V4(a), &IpAddr::V4(b), &local),
            Direction::Out
        );
        assert_eq!(
            classify(&IpAddr::V4(b), &IpAddr::V4(a), &local),
            Direction::In
        );
        assert_eq!(
            classify(&IpAddr::V4(a), &IpAddr::V4(a), &local),
            Direction::Unknown
        );
    }
}
