//! Main loop wiring: capture → parse → filter → classify → attribute →
//! track → emit. Grounded in the teacher's `lib.rs::run` setup closure and
//! `services.rs`'s one-thread-per-concern background task model.

use std::fs::File;
use std::io::Write;
use std::net::IpAddr;
use std::sync::Mutex;
use std::sync::Arc;

use crate::capture::{self, CaptureEngine, CaptureSocket, Direction, LocalIpSet};
use crate::config::{Settings, STATS_INTERVAL_SECS};
use crate::filters::{self, DirectionFilter, ProtocolFilter};
use crate::output::{EventRecord, PacketRecord, PayloadInfo, TcpInfo, UdpInfo};
use crate::parser::{self, EtherType, Protocol};
use crate::procfs;
use crate::stats::StatsRecorder;
use crate::tracker::Tracker;

type Sink = Mutex<Box<dyn Write + Send>>;

fn open_sink(path: &Option<std::path::PathBuf>, default_stderr: bool) -> anyhow::Result<Box<dyn Write + Send>> {
    match path {
        Some(p) => {
            let file = File::create(p)
                .map_err(|e| anyhow::anyhow!("open {}: {e}", p.display()))?;
            Ok(Box::new(file))
        }
        None if default_stderr => Ok(Box::new(std::io::stderr())),
        None => Ok(Box::new(std::io::stdout())),
    }
}

fn install_logging(settings: &Settings, log_writer: Box<dyn Write + Send>) {
    let default_level = if settings.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("portlens={default_level}").into());
    let writer = SharedWriter(Arc::new(Mutex::new(log_writer)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(move || writer.clone())
        .init();
}

/// A cloneable handle onto the log sink. `tracing_subscriber::fmt`'s
/// `with_writer` wants a factory returning an owned writer per call, not a
/// borrow, so this wraps the shared sink in an `Arc` rather than a reference.
#[derive(Clone)]
struct SharedWriter(Arc<Mutex<Box<dyn Write + Send>>>);

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().unwrap().flush()
    }
}

fn write_line(sink: &Sink, line: &str) {
    let mut guard = sink.lock().unwrap();
    let _ = writeln!(guard, "{line}");
}

/// Run the orchestrator to completion (blocks until a shutdown signal).
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let log_writer = open_sink(&settings.log_file, true)?;
    install_logging(&settings, log_writer);

    let output_sink: Arc<Sink> = Arc::new(Mutex::new(open_sink(&settings.output, false)?));

    tracing::info!(interface = %settings.interface, "starting capture");

    let local_ips = Arc::new(LocalIpSet::discover()?);
    let socket = CaptureSocket::open(&settings.interface)?;

    let tracker: Option<Arc<Tracker>> = if settings.stateful {
        let (tracker, events) = Tracker::new();
        let tracker = Arc::new(tracker);
        let event_sink = Arc::clone(&output_sink);
        tokio::task::spawn_blocking(move || {
            for event in events.iter() {
                let record = EventRecord::new(event.event_type, &event.connection);
                if let Ok(line) = serde_json::to_string(&record) {
                    write_line(&event_sink, &line);
                }
            }
        });
        Some(tracker)
    } else {
        None
    };

    let stats = Arc::new(StatsRecorder::new());
    if settings.stats {
        let stats_clone = Arc::clone(&stats);
        let stats_sink = Arc::clone(&output_sink);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(STATS_INTERVAL_SECS));
            loop {
                ticker.tick().await;
                let snapshot = stats_clone.snapshot();
                if let Ok(line) = serde_json::to_string(&snapshot) {
                    write_line(&stats_sink, &line);
                }
            }
        });
    }

    let protocol_filter = ProtocolFilter::parse(&settings.protocol);
    let direction_filter = DirectionFilter::parse(&settings.direction);
    let settings = Arc::new(settings);

    let capture_engine = {
        let local_ips = Arc::clone(&local_ips);
        let stats = Arc::clone(&stats);
        let tracker = tracker.clone();
        let output_sink = Arc::clone(&output_sink);
        let settings = Arc::clone(&settings);

        CaptureEngine::start(socket, move |frame| {
            stats.record_packet(frame.len() as u64);
            process_frame(
                frame,
                &settings,
                &local_ips,
                protocol_filter,
                direction_filter,
                tracker.as_deref(),
                &output_sink,
            );
        })?
    };

    wait_for_shutdown().await;
    capture_engine.stop();

    if let Some(tracker) = &tracker {
        tracker.close();
    }

    if settings.graceful && settings.stats {
        let summary = stats.snapshot();
        tracing::info!(summary = ?summary, "final stats summary");
    }

    tracing::info!("shutdown complete");
    Ok(())
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut interrupt = signal(SignalKind::interrupt()).expect("install SIGINT handler");
        let mut terminate = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Decode and route one captured frame: Ethernet → IPv4 → TCP/UDP, applying
/// every filter along the way, then emit a record for anything that
/// survives (spec.md §4.8).
#[allow(clippy::too_many_arguments)]
fn process_frame(
    frame: &[u8],
    settings: &Settings,
    local_ips: &LocalIpSet,
    protocol_filter: ProtocolFilter,
    direction_filter: DirectionFilter,
    tracker: Option<&Tracker>,
    sink: &Sink,
) {
    let ethernet = match parser::parse_ethernet(frame) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("parse ethernet error: {e}");
            return;
        }
    };
    if ethernet.ethertype != EtherType::Ipv4 {
        return;
    }

    let ipv4 = match parser::parse_ipv4(ethernet.payload) {
        Ok(ipv4) => ipv4,
        Err(e) => {
            tracing::warn!("parse ipv4 error: {e}");
            return;
        }
    };

    if !filters::matches_ip(
        &settings.ip,
        &ipv4.src_ip.to_string(),
        &ipv4.dst_ip.to_string(),
    ) {
        return;
    }

    let src_addr = IpAddr::V4(ipv4.src_ip);
    let dst_addr = IpAddr::V4(ipv4.dst_ip);
    let direction = capture::classify(&src_addr, &dst_addr, local_ips);
    if !direction_filter.matches(direction) {
        return;
    }

    match ipv4.protocol {
        Protocol::Tcp if protocol_filter.matches_tcp() => {
            handle_tcp(&ipv4, direction, settings, tracker, sink);
        }
        Protocol::Udp if protocol_filter.matches_udp() => {
            handle_udp(&ipv4, direction, settings, sink);
        }
        _ => {}
    }
}

fn handle_tcp(
    ipv4: &parser::Ipv4Packet<'_>,
    direction: Direction,
    settings: &Settings,
    tracker: Option<&Tracker>,
    sink: &Sink,
) {
    let tcp = match parser::parse_tcp(ipv4.payload) {
        Ok(tcp) => tcp,
        Err(e) => {
            tracing::warn!("parse tcp error: {e}");
            return;
        }
    };

    if !filters::matches_port(settings.port, tcp.src_port, tcp.dst_port) {
        return;
    }

    let proc = procfs::lookup_process(
        Protocol::Tcp,
        ipv4.src_ip,
        tcp.src_port,
        ipv4.dst_ip,
        tcp.dst_port,
    );
    if !filters::matches_process(&settings.process, settings.pid, proc.as_ref()) {
        return;
    }

    if let Some(tracker) = tracker {
        tracker.process_tcp_packet(
            IpAddr::V4(ipv4.src_ip),
            tcp.src_port,
            IpAddr::V4(ipv4.dst_ip),
            tcp.dst_port,
            tcp.flags,
            tcp.payload.len() as u64,
            direction == Direction::Out,
        );
    }

    if settings.verbosity < 2 {
        return;
    }

    let mut record = PacketRecord {
        timestamp: crate::output::now_iso8601(),
        protocol: "TCP",
        src_ip: IpAddr::V4(ipv4.src_ip),
        src_port: tcp.src_port,
        dst_ip: IpAddr::V4(ipv4.dst_ip),
        dst_port: tcp.dst_port,
        direction: direction.as_str(),
        pid: proc.as_ref().map(|p| p.pid),
        process: proc.map(|p| p.name),
        tcp: Some(TcpInfo {
            seq: tcp.seq,
            ack: tcp.ack,
            flags: parser::format_tcp_flags(tcp.flags),
        }),
        udp: None,
        payload: None,
    };
    if settings.verbosity >= 3 {
        record.payload = PayloadInfo::from_payload(tcp.payload);
    }

    if let Ok(line) = serde_json::to_string(&record) {
        write_line(sink, &line);
    }
}

fn handle_udp(ipv4: &parser::Ipv4Packet<'_>, direction: Direction, settings: &Settings, sink: &Sink) {
    let udp = match parser::parse_udp(ipv4.payload) {
        Ok(udp) => udp,
        Err(e) => {
            tracing::warn!("parse udp error: {e}");
            return;
        }
    };

    if !filters::matches_port(settings.port, udp.src_port, udp.dst_port) {
        return;
    }

    let proc = procfs::lookup_process(
        Protocol::Udp,
        ipv4.src_ip,
        udp.src_port,
        ipv4.dst_ip,
        udp.dst_port,
    );
    if !filters::matches_process(&settings.process, settings.pid, proc.as_ref()) {
        return;
    }

    if settings.verbosity < 2 {
        return;
    }

    let mut record = PacketRecord {
        timestamp: crate::output::now_iso8601(),
        protocol: "UDP",
        src_ip: IpAddr::V4(ipv4.src_ip),
        src_port: udp.src_port,
        dst_ip: IpAddr::V4(ipv4.dst_ip),
        dst_port: udp.dst_port,
        direction: direction.as_str(),
        pid: proc.as_ref().map(|p| p.pid),
        process: proc.map(|p| p.name),
        tcp: None,
        udp: Some(UdpInfo { length: udp.length }),
        payload: None,
    };
    if settings.verbosity >= 3 {
        record.payload = PayloadInfo::from_payload(udp.payload);
    }

    if let Ok(line) = serde_json::to_string(&record) {
        write_line(sink, &line);
    }
}
