use super::ParseError;

/// Minimum TCP header length in bytes (data offset == 5).
pub const MIN_HEADER_LEN: usize = 20;
/// Maximum TCP header length in bytes (data offset == 15, with options).
pub const MAX_HEADER_LEN: usize = 60;

/// TCP control-flag bitmasks (byte 13 of the header).
pub mod flag_bits {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
}

/// Decoded view over the raw TCP flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpFlags(pub u8);

impl TcpFlags {
    pub fn fin(self) -> bool {
        self.0 & flag_bits::FIN != 0
    }
    pub fn syn(self) -> bool {
        self.0 & flag_bits::SYN != 0
    }
    pub fn rst(self) -> bool {
        self.0 & flag_bits::RST != 0
    }
    pub fn psh(self) -> bool {
        self.0 & flag_bits::PSH != 0
    }
    pub fn ack(self) -> bool {
        self.0 & flag_bits::ACK != 0
    }
    pub fn urg(self) -> bool {
        self.0 & flag_bits::URG != 0
    }
}

/// Format TCP flags as a concatenation of single-letter tokens in bit order
/// F, S, R, P, A, U, emitting a letter only for set bits.
pub fn format_tcp_flags(flags: TcpFlags) -> String {
    let mut s = String::with_capacity(6);
    if flags.fin() {
        s.push('F');
    }
    if flags.syn() {
        s.push('S');
    }
    if flags.rst() {
        s.push('R');
    }
    if flags.psh() {
        s.push('P');
    }
    if flags.ack() {
        s.push('A');
    }
    if flags.urg() {
        s.push('U');
    }
    s
}

/// A decoded TCP segment. `payload` borrows from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSegment<'a> {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq: u32,
    pub ack: u32,
    pub data_offset: u8,
    pub flags: TcpFlags,
    pub window: u16,
    pub payload: &'a [u8],
}

/// Parse a TCP segment from `buf`.
///
/// Fails if `buf` is shorter than 20 bytes, or if the data-offset-derived
/// header length is below 20, above 60, or exceeds `buf`'s length.
pub fn parse_tcp(buf: &[u8]) -> Result<TcpSegment<'_>, ParseError> {
    if buf.len() < MIN_HEADER_LEN {
        return Err(ParseError::TooShort {
            needed: MIN_HEADER_LEN,
            got: buf.len(),
        });
    }

    let data_offset = buf[12] >> 4;
    let header_len = data_offset as usize * 4;
    if header_len < MIN_HEADER_LEN || header_len > MAX_HEADER_LEN || header_len > buf.len() {
        return Err(ParseError::InvalidHeaderLength {
            header_len,
            input_len: buf.len(),
        });
    }

    let src_port = u16::from_be_bytes([buf[0], buf[1]]);
    let dst_port = u16::from_be_bytes([buf[2], buf[3]]);
    let seq = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let ack = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
    let flags = TcpFlags(buf[13]);
    let window = u16::from_be_bytes([buf[14], buf[15]]);

    Ok(TcpSegment {
        src_port,
        dst_port,
        seq,
        ack,
        data_offset,
        flags,
        window,
        payload: &buf[header_len..],
    })
}
