//! Domain error types for the terminal front end.

use std::fmt;

/// Errors that stop the terminal session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config { reason: String },
    /// Reading stdin or writing stdout failed.
    Io { reason: String },
    /// The tutor session could not be opened (use as context wrapper).
    Startup,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "invalid configuration: {reason}"),
            Self::Io { reason } => write!(f, "terminal I/O failed: {reason}"),
            Self::Startup => write!(f, "could not start the tutor session"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            reason: e.to_string(),
        }
    }
}

impl From<config::ConfigError> for CliError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config {
            reason: e.to_string(),
        }
    }
}
