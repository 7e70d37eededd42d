//! Connection identity, state, and the per-flow record the tracker owns.

use std::net::IpAddr;
use std::time::SystemTime;

use serde::Serialize;

/// Protocol tag carried by a connection key. TCP is the only protocol the
/// tracker's state machine drives; UDP flows aren't tracked by this system
/// but the tag is kept general for the key's own sake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtoTag {
    Tcp,
}

/// Order-normalized 5-tuple so both directions of a flow map to one key.
///
/// Normalization compares endpoints lexicographically by IP then port; the
/// lower endpoint populates the first pair (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnKey {
    pub low_ip: IpAddr,
    pub low_port: u16,
    pub high_ip: IpAddr,
    pub high_port: u16,
    pub protocol: ProtoTag,
}

impl ConnKey {
    /// Build the normalized key for a packet's endpoints, regardless of
    /// which side sent it.
    pub fn normalize(a_ip: IpAddr, a_port: u16, b_ip: IpAddr, b_port: u16, protocol: ProtoTag) -> Self {
        if (a_ip, a_port) <= (b_ip, b_port) {
            ConnKey {
                low_ip: a_ip,
                low_port: a_port,
                high_ip: b_ip,
                high_port: b_port,
                protocol,
            }
        } else {
            ConnKey {
                low_ip: b_ip,
                low_port: b_port,
                high_ip: a_ip,
                high_port: a_port,
                protocol,
            }
        }
    }
}

/// TCP connection lifecycle state (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TcpState {
    Closed,
    SynSent,
    SynReceived,
    Established,
    FinWait1,
    FinWait2,
    CloseWait,
    LastAck,
    TimeWait,
}

impl TcpState {
    pub fn as_str(self) -> &'static str {
        match self {
            TcpState::Closed => "CLOSED",
            TcpState::SynSent => "SYN_SENT",
            TcpState::SynReceived => "SYN_RECEIVED",
            TcpState::Established => "ESTABLISHED",
            TcpState::FinWait1 => "FIN_WAIT_1",
            TcpState::FinWait2 => "FIN_WAIT_2",
            TcpState::CloseWait => "CLOSE_WAIT",
            TcpState::LastAck => "LAST_ACK",
            TcpState::TimeWait => "TIME_WAIT",
        }
    }
}

/// A per-flow record owned exclusively by the tracker's map. Events publish
/// a cloned snapshot, never a reference that outlives the lock (spec.md §9).
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub key: ConnKey,
    pub state: TcpState,
    pub start_time: SystemTime,
    pub end_time: Option<SystemTime>,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl Connection {
    pub fn new(key: ConnKey, now: SystemTime) -> Self {
        Self {
            key,
            state: TcpState::Closed,
            start_time: now,
            end_time: None,
            packets_sent: 0,
            packets_received: 0,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    /// Duration from start to end (or start to now, if still open).
    pub fn duration(&self, now: SystemTime) -> std::time::Duration {
        let end = self.end_time.unwrap_or(now);
        end.duration_since(self.start_time).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    #[test]
    fn normalize_is_order_independent() {
        let a = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let b = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        let k1 = ConnKey::normalize(a, 1000, b, 80, ProtoTag::Tcp);
        let k2 = ConnKey::normalize(b, 80, a, 1000, ProtoTag::Tcp);
        assert_eq!(k1, k2);
    }

    #[test]
    fn state_names_match_spec_strings() {
        assert_eq!(TcpState::SynSent.as_str(), "SYN_SENT");
        assert_eq!(TcpState::TimeWait.as_str(), "TIME_WAIT");
    }
}
