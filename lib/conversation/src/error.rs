//! Error types for the conversation crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ResponderError`: answering a single input
//! - `SessionError`: session store operations
//! - `FeedbackError`: invalid feedback input
//! - `SnapshotError`: writing or reading conversation snapshots
//! - `ServiceError`: high-level wrapper for context

use pidgin_tutor_core::CallerId;
use std::fmt;
use std::path::PathBuf;

/// Errors from answering an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderError {
    /// The generative model failed (use as context wrapper).
    Generation { backend: String },
}

impl fmt::Display for ResponderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generation { backend } => {
                write!(f, "generation failed on backend '{backend}'")
            }
        }
    }
}

impl std::error::Error for ResponderError {}

/// Errors from session store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No session exists for the caller.
    NotFound { caller: CallerId },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { caller } => write!(f, "no session for caller '{caller}'"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Errors from feedback input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    /// Star rating outside 1 to 5.
    StarsOutOfRange { stars: u8 },
    /// Text that is not a known rating.
    UnknownRating { input: String },
}

impl fmt::Display for FeedbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StarsOutOfRange { stars } => {
                write!(f, "star rating must be between 1 and 5, got {stars}")
            }
            Self::UnknownRating { input } => write!(f, "unknown rating '{input}'"),
        }
    }
}

impl std::error::Error for FeedbackError {}

/// Errors from conversation snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Serializing or parsing the snapshot failed.
    Encoding { reason: String },
    /// Writing the snapshot file failed.
    WriteFailed { path: PathBuf, reason: String },
    /// Reading the snapshot file failed.
    ReadFailed { path: PathBuf, reason: String },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoding { reason } => write!(f, "snapshot encoding failed: {reason}"),
            Self::WriteFailed { path, reason } => {
                write!(f, "failed to write snapshot {}: {reason}", path.display())
            }
            Self::ReadFailed { path, reason } => {
                write!(f, "failed to read snapshot {}: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

/// High-level service errors.
///
/// Use these to add context when wrapping lower-level errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Session lookup or save context.
    Session { caller: CallerId },
    /// Answering an input context.
    Respond { caller: CallerId },
    /// Snapshot context.
    Snapshot { caller: CallerId },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session { caller } => write!(f, "session operation failed for '{caller}'"),
            Self::Respond { caller } => write!(f, "could not answer '{caller}'"),
            Self::Snapshot { caller } => {
                write!(f, "could not save conversation of '{caller}'")
            }
        }
    }
}

impl std::error::Error for ServiceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_error_display() {
        let err = SessionError::NotFound {
            caller: CallerId::from("ada"),
        };
        assert_eq!(err.to_string(), "no session for caller 'ada'");
    }

    #[test]
    fn feedback_error_display() {
        let err = FeedbackError::StarsOutOfRange { stars: 9 };
        assert!(err.to_string().contains('9'));
    }

    #[test]
    fn snapshot_error_display() {
        let err = SnapshotError::WriteFailed {
            path: PathBuf::from("data/log.json"),
            reason: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("data/log.json"));
        assert!(err.to_string().contains("permission denied"));
    }
}
