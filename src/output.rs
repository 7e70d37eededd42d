//! JSON record shapes written to the output sink: one object per line.

use std::net::IpAddr;
use std::time::Duration;

use serde::Serialize;

use crate::tracker::{Connection, EventType};

/// Current UTC time formatted as ISO-8601 with millisecond precision.
pub fn now_iso8601() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// TCP-specific fields of a packet record.
#[derive(Debug, Clone, Serialize)]
pub struct TcpInfo {
    pub seq: u32,
    pub ack: u32,
    pub flags: String,
}

/// UDP-specific fields of a packet record.
#[derive(Debug, Clone, Serialize)]
pub struct UdpInfo {
    pub length: u16,
}

/// Hex preview of a payload, shown only at the highest verbosity.
#[derive(Debug, Clone, Serialize)]
pub struct PayloadInfo {
    pub size: usize,
    pub head: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
}

impl PayloadInfo {
    /// Head is the first up-to-64 bytes as hex; tail is the last 64 bytes,
    /// included only when the payload is longer than 64 bytes (spec.md §3).
    pub fn from_payload(data: &[u8]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }
        let head_len = data.len().min(64);
        let head = hex::encode(&data[..head_len]);
        let tail = if data.len() > 64 {
            Some(hex::encode(&data[data.len() - 64..]))
        } else {
            None
        };
        Some(PayloadInfo {
            size: data.len(),
            head,
            tail,
        })
    }
}

/// One captured packet, serialized as a single JSON line.
#[derive(Debug, Clone, Serialize)]
pub struct PacketRecord {
    pub timestamp: String,
    pub protocol: &'static str,
    pub src_ip: IpAddr,
    pub src_port: u16,
    pub dst_ip: IpAddr,
    pub dst_port: u16,
    pub direction: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp: Option<TcpInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udp: Option<UdpInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<PayloadInfo>,
}

/// Connection snapshot embedded in an event record.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionSummary {
    pub src_ip: IpAddr,
    pub src_port: u16,
    pub dst_ip: IpAddr,
    pub dst_port: u16,
    pub protocol: &'static str,
    pub state: &'static str,
    pub duration: String,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

impl ConnectionSummary {
    pub fn from_connection(conn: &Connection) -> Self {
        let now = std::time::SystemTime::now();
        ConnectionSummary {
            src_ip: conn.key.low_ip,
            src_port: conn.key.low_port,
            dst_ip: conn.key.high_ip,
            dst_port: conn.key.high_port,
            protocol: "TCP",
            state: conn.state.as_str(),
            duration: format_duration(conn.duration(now)),
            packets_sent: conn.packets_sent,
            packets_recv: conn.packets_received,
            bytes_sent: conn.bytes_sent,
            bytes_recv: conn.bytes_received,
        }
    }
}

/// A connection lifecycle event, serialized as a single JSON line.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub event_type: &'static str,
    pub timestamp: String,
    pub connection: ConnectionSummary,
}

impl EventRecord {
    pub fn new(event_type: EventType, connection: &Connection) -> Self {
        EventRecord {
            event_type: event_type.as_str(),
            timestamp: now_iso8601(),
            connection: ConnectionSummary::from_connection(connection),
        }
    }
}

/// Periodic capture statistics, serialized as a single JSON line.
#[derive(Debug, Clone, Serialize)]
pub struct StatsRecord {
    #[serde(rename = "type")]
    pub record_type: &'static str,
    pub timestamp: String,
    pub elapsed_seconds: f64,
    pub packets_captured: u64,
    pub bytes_processed: u64,
    pub packets_per_sec: f64,
    pub bytes_per_sec: f64,
}

/// Render a duration roughly the way Go's `time.Duration.String()` does:
/// sub-second durations in milliseconds, otherwise seconds with millisecond
/// precision.
fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_preview_has_no_tail_when_short() {
        let data = vec![0xABu8; 32];
        let preview = PayloadInfo::from_payload(&data).unwrap();
        assert_eq!(preview.size, 32);
        assert_eq!(preview.head.len(), 64);
        assert!(preview.tail.is_none());
    }

    #[test]
    fn payload_preview_has_tail_when_long() {
        let data = vec![0xCDu8; 200];
        let preview = PayloadInfo::from_payload(&data).unwrap();
        assert_eq!(preview.size, 200);
        assert_eq!(preview.head.len(), 128);
        assert_eq!(preview.tail.as_ref().unwrap().len(), 128);
    }

    #[test]
    fn empty_payload_has_no_preview() {
        assert!(PayloadInfo::from_payload(&[]).is_none());
    }

    #[test]
    fn packet_record_omits_absent_optional_fields() {
        let record = PacketRecord {
            timestamp: now_iso8601(),
            protocol: "TCP",
            src_ip: "127.0.0.1".parse().unwrap(),
            src_port: 1000,
            dst_ip: "127.0.0.1".parse().unwrap(),
            dst_port: 80,
            direction: "out",
            pid: None,
            process: None,
            tcp: None,
            udp: None,
            payload: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("pid"));
        assert!(!obj.contains_key("process"));
        assert!(!obj.contains_key("tcp"));
    }

    #[test]
    fn duration_formats_sub_second_as_milliseconds() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
    }

    #[test]
    fn duration_formats_whole_seconds_with_precision() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
    }
}
