//! Generative model support for pidgin-tutor.
//!
//! This crate provides:
//!
//! - **Backend**: the optional generative model capability and its handle
//! - **Prompt**: rendering of windowed history into a model prompt
//! - **Postprocess**: cleanup of raw generated text for display
//! - **HTTP**: a backend for a text-generation server

pub mod backend;
pub mod error;
pub mod http;
pub mod postprocess;
pub mod prompt;

pub use backend::{GenerationParams, GenerativeBackend, ModelHandle};
pub use error::GenerationError;
pub use http::{HttpBackend, HttpBackendConfig};
pub use postprocess::ResponseCleaner;
pub use prompt::{PromptBuilder, PromptTokens, PromptTurn};
