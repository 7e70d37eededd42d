//! Packet-level filter predicates applied by the orchestrator before a
//! record is attributed, tracked, or emitted.

use crate::procfs::ProcessInfo;

/// Protocol filter: "tcp", "udp", or "all" (the wildcard).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFilter {
    Tcp,
    Udp,
    All,
}

impl ProtocolFilter {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => ProtocolFilter::Tcp,
            "udp" => ProtocolFilter::Udp,
            _ => ProtocolFilter::All,
        }
    }

    pub fn matches_tcp(self) -> bool {
        matches!(self, ProtocolFilter::Tcp | ProtocolFilter::All)
    }

    pub fn matches_udp(self) -> bool {
        matches!(self, ProtocolFilter::Udp | ProtocolFilter::All)
    }
}

/// Direction filter: "in", "out", or "all".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionFilter {
    In,
    Out,
    All,
}

impl DirectionFilter {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "in" => DirectionFilter::In,
            "out" => DirectionFilter::Out,
            _ => DirectionFilter::All,
        }
    }

    pub fn matches(self, direction: crate::capture::Direction) -> bool {
        use crate::capture::Direction as D;
        match self {
            DirectionFilter::All => true,
            DirectionFilter::In => direction == D::In,
            DirectionFilter::Out => direction == D::Out,
        }
    }
}

/// 0 means "accept any port" (spec.md §6).
pub fn matches_port(filter_port: u16, src_port: u16, dst_port: u16) -> bool {
    filter_port == 0 || src_port == filter_port || dst_port == filter_port
}

/// Empty string means "accept any IP".
pub fn matches_ip(filter_ip: &str, src_ip: &str, dst_ip: &str) -> bool {
    filter_ip.is_empty() || src_ip == filter_ip || dst_ip == filter_ip
}

/// Matches a resolved process against the configured `--process`/`--pid`
/// filters. An unresolved process (`None`) fails any active filter, exactly
/// as the original `matchesProcessFilter` treats a nil lookup result.
pub fn matches_process(
    filter_name: &str,
    filter_pid: u32,
    proc: Option<&ProcessInfo>,
) -> bool {
    if !filter_name.is_empty() {
        match proc {
            Some(p) if p.name == filter_name => {}
            _ => return false,
        }
    }
    if filter_pid != 0 {
        match proc {
            Some(p) if p.pid == filter_pid => {}
            _ => return false,
        }
    }
    true
}
