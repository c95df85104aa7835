//! HTTP backend for a text-generation server.
//!
//! Speaks the text-generation-inference wire format: `POST /generate` with
//! `{"inputs", "parameters"}` answered by `{"generated_text"}`, and
//! `GET /health` for the startup probe.

use crate::backend::{GenerationParams, GenerativeBackend, ModelHandle};
use crate::error::GenerationError;
use async_trait::async_trait;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Settings for connecting to a generation server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpBackendConfig {
    /// Base URL of the server, e.g. `http://localhost:8080`.
    pub endpoint: String,
    /// Client-side request timeout.
    pub request_timeout: Duration,
    /// Stop sequences sent with every request.
    pub stop: Vec<String>,
}

impl HttpBackendConfig {
    /// Creates a configuration with a 60 second timeout and no stop sequences.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            request_timeout: Duration::from_secs(60),
            stop: Vec::new(),
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Adds a stop sequence.
    #[must_use]
    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop.push(stop.into());
        self
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters<'a>,
}

#[derive(Debug, Serialize)]
struct GenerateParameters<'a> {
    max_new_tokens: u32,
    temperature: f32,
    top_k: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "is_zero")]
    no_repeat_ngram_size: u32,
    do_sample: bool,
    return_full_text: bool,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop: &'a [String],
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    generated_text: String,
}

/// Generation backend backed by an HTTP model server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: HttpBackendConfig,
}

impl HttpBackend {
    /// Creates a backend. Does not contact the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is empty or the HTTP client cannot
    /// be built.
    pub fn new(config: HttpBackendConfig) -> Result<Self, Report<GenerationError>> {
        if config.endpoint.trim().is_empty() {
            return Err(GenerationError::InvalidConfig {
                reason: "endpoint is empty".to_string(),
            }
            .into());
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GenerationError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &HttpBackendConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.endpoint.trim_end_matches('/'))
    }

    fn request_body<'a>(&'a self, prompt: &'a str, params: &GenerationParams) -> GenerateRequest<'a> {
        GenerateRequest {
            inputs: prompt,
            parameters: GenerateParameters {
                max_new_tokens: params.max_new_tokens,
                temperature: params.temperature,
                top_k: params.top_k,
                top_p: params.top_p,
                no_repeat_ngram_size: params.no_repeat_ngram_size,
                do_sample: params.temperature > 0.0,
                return_full_text: false,
                stop: &self.config.stop,
            },
        }
    }

    /// Checks that the server is up and ready to generate.
    ///
    /// # Errors
    ///
    /// Returns `ProviderUnavailable` if the server cannot be reached or
    /// answers with a non-success status.
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint))]
    pub async fn probe(&self) -> Result<(), Report<GenerationError>> {
        let unavailable = |reason: String| GenerationError::ProviderUnavailable {
            provider: self.config.endpoint.clone(),
            reason,
        };

        let response = self
            .client
            .get(self.url("health"))
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("health check returned {}", response.status())).into());
        }

        debug!("model server healthy");
        Ok(())
    }

    /// Probes the server and wraps this backend in a handle.
    ///
    /// A failed probe is not an error: the tutor runs without a model.
    pub async fn into_handle(self) -> ModelHandle {
        match self.probe().await {
            Ok(()) => ModelHandle::present(self),
            Err(report) => {
                warn!(error = %report, "model server not available, using rule-based responses");
                ModelHandle::Absent
            }
        }
    }
}

impl ModelHandle {
    /// Connects to a generation server. Returns `Absent` when none is
    /// configured, the configuration is invalid or the server does not
    /// answer its health probe.
    pub async fn connect(config: Option<HttpBackendConfig>) -> Self {
        let Some(config) = config else {
            info!("no model endpoint configured, using rule-based responses");
            return Self::Absent;
        };

        match HttpBackend::new(config) {
            Ok(backend) => backend.into_handle().await,
            Err(report) => {
                warn!(error = %report, "invalid model configuration, using rule-based responses");
                Self::Absent
            }
        }
    }
}

#[async_trait]
impl GenerativeBackend for HttpBackend {
    #[instrument(skip(self, prompt, params), fields(prompt_len = prompt.len()))]
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, Report<GenerationError>> {
        let response = self
            .client
            .post(self.url("generate"))
            .json(&self.request_body(prompt, params))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::RequestFailed {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::RequestFailed {
                reason: format!("server returned {status}"),
            }
            .into());
        }

        let body: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| GenerationError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;

        debug!(generated_len = body.generated_text.len(), "generation complete");
        Ok(body.generated_text)
    }

    fn name(&self) -> &str {
        &self.config.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_endpoint_is_rejected() {
        assert!(HttpBackend::new(HttpBackendConfig::new("  ")).is_err());
    }

    #[test]
    fn urls_tolerate_trailing_slash() {
        let backend =
            HttpBackend::new(HttpBackendConfig::new("http://localhost:8080/")).expect("backend");
        assert_eq!(backend.url("generate"), "http://localhost:8080/generate");
        assert_eq!(backend.url("health"), "http://localhost:8080/health");
    }

    #[test]
    fn request_body_carries_sampling_parameters() {
        let backend = HttpBackend::new(
            HttpBackendConfig::new("http://localhost:8080").with_stop("<|endoftext|>"),
        )
        .expect("backend");
        let params = GenerationParams::default();

        let body = serde_json::to_value(backend.request_body("<user> hi <bot>", &params))
            .expect("serialize");

        assert_eq!(body["inputs"], "<user> hi <bot>");
        assert_eq!(body["parameters"]["max_new_tokens"], 150);
        assert_eq!(body["parameters"]["top_k"], 50);
        assert_eq!(body["parameters"]["no_repeat_ngram_size"], 3);
        assert_eq!(body["parameters"]["do_sample"], true);
        assert_eq!(body["parameters"]["return_full_text"], false);
        assert_eq!(body["parameters"]["stop"][0], "<|endoftext|>");
    }

    #[test]
    fn stop_is_omitted_when_empty() {
        let backend =
            HttpBackend::new(HttpBackendConfig::new("http://localhost:8080")).expect("backend");
        let body = serde_json::to_value(backend.request_body("x", &GenerationParams::default()))
            .expect("serialize");
        assert!(body["parameters"].get("stop").is_none());
    }

    #[test]
    fn no_repeat_ngram_size_zero_is_omitted() {
        let backend =
            HttpBackend::new(HttpBackendConfig::new("http://localhost:8080")).expect("backend");
        let params = GenerationParams::default().with_no_repeat_ngram_size(0);
        let body = serde_json::to_value(backend.request_body("x", &params)).expect("serialize");
        assert!(body["parameters"].get("no_repeat_ngram_size").is_none());
    }

    #[test]
    fn response_parsing() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"generated_text": " Loop na repeat."}"#).expect("parse");
        assert_eq!(parsed.generated_text, " Loop na repeat.");
    }

    #[tokio::test]
    async fn unreachable_server_yields_absent_handle() {
        let backend = HttpBackend::new(
            HttpBackendConfig::new("http://127.0.0.1:9")
                .with_request_timeout(Duration::from_millis(500)),
        )
        .expect("backend");

        let handle = backend.into_handle().await;

        assert!(!handle.is_present());
    }

    #[tokio::test]
    async fn connect_without_config_is_absent() {
        assert!(!ModelHandle::connect(None).await.is_present());
        assert!(
            !ModelHandle::connect(Some(HttpBackendConfig::new("")))
                .await
                .is_present()
        );
    }
}
