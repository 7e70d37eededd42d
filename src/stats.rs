//! Periodic capture statistics: packets/bytes counters and derived rates.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::output::{now_iso8601, StatsRecord};

/// Tracks packet capture statistics with independently atomic counters,
/// matching the original `internal/stats/stats.go::StatsRecorder`.
pub struct StatsRecorder {
    start: Instant,
    packets_captured: AtomicU64,
    bytes_processed: AtomicU64,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            packets_captured: AtomicU64::new(0),
            bytes_processed: AtomicU64::new(0),
        }
    }

    /// Record one captured packet of `size` bytes.
    pub fn record_packet(&self, size: u64) {
        self.packets_captured.fetch_add(1, Ordering::Relaxed);
        self.bytes_processed.fetch_add(size, Ordering::Relaxed);
    }

    /// A point-in-time snapshot, ready to serialize as a `type: "stats"` line.
    pub fn snapshot(&self) -> StatsRecord {
        let elapsed = self.start.elapsed().as_secs_f64();
        let packets = self.packets_captured.load(Ordering::Relaxed);
        let bytes = self.bytes_processed.load(Ordering::Relaxed);
        let (packets_per_sec, bytes_per_sec) = if elapsed > 0.0 {
            (packets as f64 / elapsed, bytes as f64 / elapsed)
        } else {
            (0.0, 0.0)
        };

        StatsRecord {
            record_type: "stats",
            timestamp: now_iso8601(),
            elapsed_seconds: elapsed,
            packets_captured: packets,
            bytes_processed: bytes,
            packets_per_sec,
            bytes_per_sec,
        }
    }
}

impl Default for StatsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
