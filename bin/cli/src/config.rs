//! Centralized CLI configuration.
//!
//! Loaded via the `config` crate from `PIDGIN_TUTOR_`-prefixed environment
//! variables, with `__` separating nested keys, for example
//! `PIDGIN_TUTOR_MODEL__ENDPOINT=http://localhost:8080`.

use pidgin_tutor_ai::{GenerationParams, PromptTokens};
use pidgin_tutor_conversation::DEFAULT_HISTORY_CAPACITY;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PIDGIN_TUTOR";

/// CLI configuration composed from its sections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TutorConfig {
    /// History configuration.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Generative model configuration.
    #[serde(default)]
    pub model: ModelConfig,

    /// Snapshot configuration.
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Terminal user configuration.
    #[serde(default)]
    pub caller: CallerConfig,
}

/// History-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Exchanges kept per session.
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

/// Turn marker style used in prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStyle {
    /// `<user>` and `<bot>`.
    #[default]
    Plain,
    /// `<|user|>` and `<|bot|>`.
    Gpt2,
}

/// Generative model configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Base URL of a text-generation server. Without it the tutor answers
    /// from its rule table only.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Top-k sampling cutoff.
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Nucleus sampling cutoff.
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Size of n-grams the model must not repeat. Zero turns the check off.
    #[serde(default = "default_no_repeat_ngram_size")]
    pub no_repeat_ngram_size: u32,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Turn markers the model was trained with.
    #[serde(default)]
    pub token_style: TokenStyle,
}

fn default_max_new_tokens() -> u32 {
    GenerationParams::default().max_new_tokens
}

fn default_temperature() -> f32 {
    GenerationParams::default().temperature
}

fn default_top_k() -> u32 {
    GenerationParams::default().top_k
}

fn default_top_p() -> f32 {
    GenerationParams::default().top_p
}

fn default_no_repeat_ngram_size() -> u32 {
    GenerationParams::default().no_repeat_ngram_size
}

fn default_request_timeout_seconds() -> u64 {
    60
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            no_repeat_ngram_size: default_no_repeat_ngram_size(),
            request_timeout_seconds: default_request_timeout_seconds(),
            token_style: TokenStyle::default(),
        }
    }
}

impl ModelConfig {
    /// Returns the endpoint, treating a blank value as unset.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Returns the sampling parameters.
    #[must_use]
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams::default()
            .with_max_new_tokens(self.max_new_tokens)
            .with_temperature(self.temperature)
            .with_top_k(self.top_k)
            .with_top_p(self.top_p)
            .with_no_repeat_ngram_size(self.no_repeat_ngram_size)
    }

    /// Returns the prompt markers for the configured style.
    #[must_use]
    pub fn tokens(&self) -> PromptTokens {
        match self.token_style {
            TokenStyle::Plain => PromptTokens::plain(),
            TokenStyle::Gpt2 => PromptTokens::gpt2_chat(),
        }
    }

    /// Returns the HTTP request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Snapshot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    /// Directory `/save` writes to when no path is given.
    #[serde(default = "default_snapshot_dir")]
    pub dir: PathBuf,
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            dir: default_snapshot_dir(),
        }
    }
}

/// Terminal user configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CallerConfig {
    /// Name the tutor greets the terminal user by.
    #[serde(default = "default_caller_name")]
    pub name: String,
}

fn default_caller_name() -> String {
    "learner".to_string()
}

impl Default for CallerConfig {
    fn default() -> Self {
        Self {
            name: default_caller_name(),
        }
    }
}

impl TutorConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_config(
            config::Config::builder()
                .add_source(
                    config::Environment::with_prefix(ENV_PREFIX)
                        .prefix_separator("_")
                        .separator("__")
                        .try_parsing(true),
                )
                .build()?,
        )
    }

    /// Deserializes configuration from an already built source.
    ///
    /// # Errors
    ///
    /// Returns an error if a value has the wrong type.
    pub fn from_config(config: config::Config) -> Result<Self, config::ConfigError> {
        config.try_deserialize()
    }
}
