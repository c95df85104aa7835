//! Error types for the AI crate.
//!
//! Prompt building and output cleanup are total and have no error type.
//! Only calls into a generative model can fail; callers receive a
//! `Report<GenerationError>` and add their own context on the way up.

use std::fmt;

/// Errors from generative model calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The model server could not be reached or reported itself unhealthy.
    ProviderUnavailable { provider: String, reason: String },
    /// The generation request failed.
    RequestFailed { reason: String },
    /// The model answered with something that is not a generation result.
    ResponseParseFailed { reason: String },
    /// Timed out waiting for the model.
    Timeout,
    /// Backend configuration is unusable.
    InvalidConfig { reason: String },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "model provider '{provider}' unavailable: {reason}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "generation request failed: {reason}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse generation response: {reason}")
            }
            Self::Timeout => write!(f, "generation request timed out"),
            Self::InvalidConfig { reason } => {
                write!(f, "invalid model configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for GenerationError {}
