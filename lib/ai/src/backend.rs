//! Generative model capability.
//!
//! The tutor never runs a model itself. A backend turns a prompt into raw
//! continuation text, and the application decides once at startup whether
//! one is available by building a [`ModelHandle`].

use crate::error::GenerationError;
use async_trait::async_trait;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Sampling parameters for a generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum number of new tokens to generate.
    pub max_new_tokens: u32,
    /// Sampling temperature. Anything above zero is non-deterministic.
    pub temperature: f32,
    /// Top-k sampling cutoff.
    pub top_k: u32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Size of n-grams the model must not repeat. Zero turns the check off.
    pub no_repeat_ngram_size: u32,
}

impl GenerationParams {
    /// Sets the maximum number of new tokens.
    #[must_use]
    pub fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the top-k cutoff.
    #[must_use]
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets the nucleus cutoff.
    #[must_use]
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// Sets the no-repeat n-gram size.
    #[must_use]
    pub fn with_no_repeat_ngram_size(mut self, size: u32) -> Self {
        self.no_repeat_ngram_size = size;
        self
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 150,
            temperature: 0.7,
            top_k: 50,
            top_p: 0.95,
            no_repeat_ngram_size: 3,
        }
    }
}

/// Trait for generative model backends.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Generates raw continuation text for `prompt`.
    ///
    /// The output may still contain marker tokens and the echoed prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, Report<GenerationError>>;

    /// Returns a short name for logs.
    fn name(&self) -> &str;
}

/// A generative model that may or may not be loaded.
#[derive(Clone, Default)]
pub enum ModelHandle {
    /// No model; responses come from the rule table.
    #[default]
    Absent,
    /// A loaded model.
    Present(Arc<dyn GenerativeBackend>),
}

impl ModelHandle {
    /// Wraps a backend.
    #[must_use]
    pub fn present(backend: impl GenerativeBackend + 'static) -> Self {
        Self::Present(Arc::new(backend))
    }

    /// Returns true if a model is loaded.
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Returns the backend, if any.
    #[must_use]
    pub fn backend(&self) -> Option<&Arc<dyn GenerativeBackend>> {
        match self {
            Self::Present(backend) => Some(backend),
            Self::Absent => None,
        }
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("ModelHandle::Absent"),
            Self::Present(backend) => write!(f, "ModelHandle::Present({})", backend.name()),
        }
    }
}
