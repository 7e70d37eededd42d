//! Zero-copy link/network/transport header parsers.
//!
//! Each parser consumes an immutable byte slice and yields either a decoded
//! header record (with a payload sub-slice aliasing the input) or a
//! [`ParseError`] naming the failure. The parsers never allocate and never
//! panic on arbitrary untrusted input.

mod ethernet;
mod ipv4;
mod tcp;
mod udp;

pub use ethernet::{parse_ethernet, EtherType, EthernetFrame};
pub use ipv4::{parse_ipv4, Ipv4Packet, Protocol};
pub use tcp::{format_tcp_flags, parse_tcp, TcpFlags, TcpSegment};
pub use udp::{parse_udp, UdpDatagram};

use thiserror::Error;

/// Failure modes for the link/network/transport parsers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("input too short: need at least {needed} bytes, got {got}")]
    TooShort { needed: usize, got: usize },

    #[error("not an IPv4 header: version nibble is {version}")]
    NotIpv4 { version: u8 },

    #[error("invalid header length: {header_len} bytes (input is {input_len} bytes)")]
    InvalidHeaderLength { header_len: usize, input_len: usize },
}
