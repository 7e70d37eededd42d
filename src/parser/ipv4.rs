use std::net::Ipv4Addr;

use super::ParseError;

/// Minimum IPv4 header length in bytes (IHL == 5).
pub const MIN_HEADER_LEN: usize = 20;

/// Transport protocol carried by an IPv4 packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
    Other(u8),
}

impl From<u8> for Protocol {
    fn from(raw: u8) -> Self {
        match raw {
            6 => Protocol::Tcp,
            17 => Protocol::Udp,
            other => Protocol::Other(other),
        }
    }
}

/// A decoded IPv4 header. `payload` borrows from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Packet<'a> {
    pub version: u8,
    pub ihl: u8,
    pub total_len: u16,
    pub ttl: u8,
    pub protocol: Protocol,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    pub payload: &'a [u8],
}

/// Parse an IPv4 header from `buf`.
///
/// Fails if `buf` is shorter than 20 bytes, if the version nibble isn't 4,
/// or if the IHL-derived header length is below the 20-byte minimum or
/// exceeds `buf`'s length. There is deliberately no upper bound on the
/// total input length — only on the header length itself (max 60 bytes,
/// IHL being a 4-bit word count).
pub fn parse_ipv4(buf: &[u8]) -> Result<Ipv4Packet<'_>, ParseError> {
    if buf.len() < MIN_HEADER_LEN {
        return Err(ParseError::TooShort {
            needed: MIN_HEADER_LEN,
            got: buf.len(),
        });
    }

    let version = buf[0] >> 4;
    if version != 4 {
        return Err(ParseError::NotIpv4 { version });
    }

    let ihl = buf[0] & 0x0f;
    let header_len = ihl as usize * 4;
    if header_len < MIN_HEADER_LEN || header_len > buf.len() {
        return Err(ParseError::InvalidHeaderLength {
            header_len,
            input_len: buf.len(),
        });
    }

    let total_len = u16::from_be_bytes([buf[2], buf[3]]);
    let ttl = buf[8];
    let protocol = Protocol::from(buf[9]);
    let src_ip = Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15]);
    let dst_ip = Ipv4Addr::new(buf[16], buf[17], buf[18], buf[19]);

    Ok(Ipv4Packet {
        version,
        ihl,
        total_len,
        ttl,
        protocol,
        src_ip,
        dst_ip,
        payload: &buf[header_len..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<u8> {
        vec![
            0x45, 0x00, 0x00, 0x18, 0x00, 0x00, 0x00, 0x00, 0x40, 0x06, 0x00, 0x00, 0xc0, 0xa8,
            0x01, 0x01, 0xc0, 0xa8, 0x01, 0x02, 0xde, 0xad, 0xbe, 0xef,
        ]
    }

    #[test]
    fn parses_version_ihl_ttl_protocol_and_addresses() {
        let bytes = sample();
        let pkt = parse_ipv4(&bytes).unwrap();
        assert_eq!(pkt.version, 4);
        assert_eq!(pkt.ihl, 5);
        assert_eq!(pkt.ttl, 64);
        assert_eq!(pkt.protocol, Protocol::Tcp);
        assert_eq!(pkt.src_ip, Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(pkt.dst_ip, Ipv4Addr::new(192, 168, 1, 2));
        assert_eq!(pkt.payload, &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn rejects_short_input() {
        let bytes = [0x45u8; 19];
        assert!(matches!(
            parse_ipv4(&bytes),
            Err(ParseError::TooShort { needed: 20, got: 19 })
        ));
    }

    #[test]
    fn rejects_non_ipv4_version() {
        let mut bytes = sample();
        bytes[0] = 0x65; // version 6, IHL 5
        assert_eq!(parse_ipv4(&bytes), Err(ParseError::NotIpv4 { version: 6 }));
    }

    #[test]
    fn rejects_ihl_below_minimum() {
        let mut bytes = sample();
        bytes[0] = 0x44; // version 4, IHL 4 -> header_len 16 < 20
        assert!(matches!(
            parse_ipv4(&bytes),
            Err(ParseError::InvalidHeaderLength { header_len: 16, .. })
        ));
    }

    #[test]
    fn does_not_reject_long_total_input() {
        // Regression: the header-length bound must never be confused with an
        // upper bound on the overall packet size. A long payload is legal.
        let mut bytes = sample();
        bytes.extend_from_slice(&[0u8; 2000]);
        let pkt = parse_ipv4(&bytes).unwrap();
        assert_eq!(pkt.payload.len(), 4 + 2000);
    }

    #[test]
    fn header_length_equals_ihl_times_four() {
        let bytes = sample();
        let pkt = parse_ipv4(&bytes).unwrap();
        assert_eq!(bytes.len() - pkt.payload.len(), pkt.ihl as usize * 4);
    }
}
