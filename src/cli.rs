//! Command-line surface (spec.md §6), implemented with `clap`'s derive API.
//!
//! Every field is optional here even though several have spec-documented
//! defaults: the file-config merge (`Settings::merge`) needs to distinguish
//! "flag not passed" from "flag passed at its default", so the default
//! values themselves live in `Settings::merge`, not in these `#[arg(...)]`
//! attributes.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "portlens", version, about = "Linux packet capture with process attribution and TCP connection tracking")]
pub struct Args {
    /// Network interface to capture on.
    #[arg(short = 'i', long = "interface")]
    pub interface: Option<String>,

    /// Protocol to capture: tcp, udp, or all.
    #[arg(long = "protocol")]
    pub protocol: Option<String>,

    /// Filter by port number (0 = all ports).
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Filter by IP address (either endpoint).
    #[arg(long = "ip")]
    pub ip: Option<String>,

    /// Filter by direction: in, out, or all.
    #[arg(long = "direction")]
    pub direction: Option<String>,

    /// Filter by process name (exact match).
    #[arg(long = "process")]
    pub process: Option<String>,

    /// Filter by process ID (exact match).
    #[arg(long = "pid")]
    pub pid: Option<u32>,

    /// Enable TCP connection state tracking.
    #[arg(long = "stateful")]
    pub stateful: bool,

    /// Output verbosity: 0=minimal, 1=normal, 2=detailed, 3=verbose.
    #[arg(short = 'v', long = "verbosity")]
    pub verbosity: Option<u8>,

    /// Write packet/event records to this file instead of stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<String>,

    /// Enable debug-level logging.
    #[arg(long = "debug")]
    pub debug: bool,

    /// Write logs to this file instead of stderr.
    #[arg(long = "log-file")]
    pub log_file: Option<String>,

    /// Config file path.
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Emit periodic capture statistics.
    #[arg(long = "stats")]
    pub stats: bool,

    /// Write a final stats summary to the log sink on shutdown.
    #[arg(long = "graceful")]
    pub graceful: bool,
}
