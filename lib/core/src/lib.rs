//! Core types for the pidgin-tutor workspace.
//!
//! Holds the shared `Result` alias and the identifier types passed
//! between the conversation core and its front ends.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{CallerId, FeedbackId, ParseIdError, SessionId};
