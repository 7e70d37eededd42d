//! Unified error type for startup and runtime failures.
//!
//! `AppError` is the error type threaded through the orchestrator. It
//! carries a `kind()` used for the stable `"<operation>: <reason>"` startup
//! message (spec.md §7), distinct from the Display-formatted full message.

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// I/O failure: socket open/bind, output/log file open, `/proc` read.
    #[error("{0}")]
    Io(String),

    /// Config file present but unparsable.
    #[error("{0}")]
    Config(String),

    /// Packet capture setup or read failure.
    #[error("{0}")]
    Capture(String),
}

impl AppError {
    /// Returns the error kind as a string matching the variant name, used by
    /// `§7`'s `io_fatal` / `config_invalid` error-kind taxonomy.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Io(_) => "Io",
            AppError::Config(_) => "Config",
            AppError::Capture(_) => "Capture",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_norway::Error> for AppError {
    fn from(err: serde_norway::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant_name() {
        assert_eq!(AppError::Io("x".into()).kind(), "Io");
        assert_eq!(AppError::Config("x".into()).kind(), "Config");
        assert_eq!(AppError::Capture("x".into()).kind(), "Capture");
    }

    #[test]
    fn display_shows_message_only() {
        let err = AppError::Capture("bind failed".into());
        assert_eq!(err.to_string(), "bind failed");
    }

    #[test]
    fn from_io_error_produces_io_variant() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such interface");
        let app_err: AppError = io_err.into();
        assert_eq!(app_err.kind(), "Io");
        assert!(app_err.to_string().contains("no such interface"));
    }
}
