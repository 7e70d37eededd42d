//! Centralized runtime constants, YAML file config, and the CLI/file merge.
//!
//! Mirrors the original Go program's `internal/config` package: a thin file
//! config struct with every field optional, a `SUDO_USER`-aware default
//! path, and "file missing" treated as an empty config rather than an error.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::AppError;

/// Application name used for the default config directory.
pub const APP_NAME: &str = "portlens-rs";

/// Interval at which the stats recorder emits a snapshot line (seconds).
pub const STATS_INTERVAL_SECS: u64 = 5;

/// Maximum Ethernet frame size the capture loop buffers (spec.md §5).
pub const MAX_FRAME_LEN: usize = crate::capture::MAX_FRAME_LEN;

/// YAML config file shape. Every field is optional so that a file setting
/// only some keys still deserializes, and a missing file round-trips to the
/// all-`None` default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub interface: Option<String>,
    pub protocol: Option<String>,
    pub port: Option<u16>,
    pub ip: Option<String>,
    pub direction: Option<String>,
    pub process: Option<String>,
    pub pid: Option<u32>,
    pub stateful: Option<bool>,
    pub verbosity: Option<u8>,
    pub output: Option<String>,
    pub debug: Option<bool>,
    #[serde(rename = "log-file")]
    pub log_file: Option<String>,
    pub stats: Option<bool>,
    pub graceful: Option<bool>,
}

impl FileConfig {
    /// Default config file path, substituting the invoking (pre-sudo) user's
    /// home directory when `SUDO_USER` is set, matching the original
    /// `DefaultPath` behavior.
    pub fn default_path() -> PathBuf {
        if let Ok(sudo_user) = std::env::var("SUDO_USER") {
            if !sudo_user.is_empty() {
                return PathBuf::from("/home")
                    .join(sudo_user)
                    .join(".config")
                    .join(APP_NAME)
                    .join("config.yaml");
            }
        }
        dirs_home()
            .unwrap_or_default()
            .join(".config")
            .join(APP_NAME)
            .join("config.yaml")
    }

    /// Read and parse `path`. A missing file is not an error — it returns
    /// the all-`None` default, the Rust analogue of the Go `Load`
    /// function's "file not found → empty struct, no error" behavior.
    pub fn load(path: &std::path::Path) -> Result<Self, AppError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        let cfg: FileConfig = serde_norway::from_str(&data)?;
        Ok(cfg)
    }
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Fully-resolved configuration: CLI flags layered over the YAML file,
/// layered over hard-coded defaults (spec.md §6).
#[derive(Debug, Clone)]
pub struct Settings {
    pub interface: String,
    pub protocol: String,
    pub port: u16,
    pub ip: String,
    pub direction: String,
    pub process: String,
    pub pid: u32,
    pub stateful: bool,
    pub verbosity: u8,
    pub output: Option<PathBuf>,
    pub debug: bool,
    pub log_file: Option<PathBuf>,
    pub stats: bool,
    pub graceful: bool,
}

impl Settings {
    /// Merge CLI args over a loaded file config. A CLI flag that was
    /// explicitly passed always wins; otherwise the file's value is used;
    /// otherwise the hard-coded default (spec.md §6) applies.
    pub fn merge(cli: &crate::cli::Args, file: FileConfig) -> Self {
        Settings {
            interface: cli.interface.clone().or(file.interface).unwrap_or_default(),
            protocol: cli.protocol.clone().or(file.protocol).unwrap_or_else(|| "all".into()),
            port: cli.port.or(file.port).unwrap_or(0),
            ip: cli.ip.clone().or(file.ip).unwrap_or_default(),
            direction: cli.direction.clone().or(file.direction).unwrap_or_else(|| "all".into()),
            process: cli.process.clone().or(file.process).unwrap_or_default(),
            pid: cli.pid.or(file.pid).unwrap_or(0),
            stateful: cli.stateful || file.stateful.unwrap_or(false),
            verbosity: cli.verbosity.or(file.verbosity).unwrap_or(2),
            output: cli.output.clone().or(file.output).map(PathBuf::from),
            debug: cli.debug || file.debug.unwrap_or(false),
            log_file: cli.log_file.clone().or(file.log_file).map(PathBuf::from),
            stats: cli.stats || file.stats.unwrap_or(false),
            graceful: cli.graceful || file.graceful.unwrap_or(false),
        }
    }
}
