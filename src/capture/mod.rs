//! Packet capture: raw socket, local-IP set, direction classification, and
//! the background capture loop.

mod direction;
mod localip;
mod socket;

pub use direction::{classify, Direction};
pub use localip::LocalIpSet;
pub use socket::CaptureSocket;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Maximum Ethernet frame size; the capture loop provisions one buffer of
/// this size and reuses it across iterations (spec.md §5).
pub const MAX_FRAME_LEN: usize = 65535;

/// Owns the background capture thread and its shutdown signal.
///
/// Mirrors the teacher's `CaptureEngine`: `Drop` flips the shutdown flag so
/// the capture loop observes it and exits even on panic/early return.
pub struct CaptureEngine {
    shutdown: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl CaptureEngine {
    /// Spawn the capture loop on a dedicated OS thread. `on_frame` is called
    /// with each received frame; it owns filtering, decoding, attribution,
    /// tracking, and record emission.
    pub fn start(
        socket: CaptureSocket,
        mut on_frame: impl FnMut(&[u8]) + Send + 'static,
    ) -> anyhow::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);
        let interface = socket.interface().to_string();

        let thread = std::thread::Builder::new()
            .name("capture".into())
            .spawn(move || {
                let mut buf = vec![0u8; MAX_FRAME_LEN];
                while !shutdown_clone.load(Ordering::Relaxed) {
                    match socket.read_frame(&mut buf) {
                        Ok(n) => on_frame(&buf[..n]),
                        Err(e) => {
                            if shutdown_clone.load(Ordering::Relaxed) {
                                break;
                            }
                            tracing::warn!("capture read error on {interface}: {e}");
                        }
                    }
                }
                tracing::info!("capture loop on {interface} stopped");
            })
            .map_err(|e| anyhow::anyhow!("spawn capture thread: {e}"))?;

        Ok(Self {
            shutdown,
            thread: Some(thread),
        })
    }

    /// Signal the capture loop to stop. Idempotent.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaptureEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
