//! OllamaAdvisor - treatment advice from a local Ollama server.
//!
//! Calls the non-streaming `/api/generate` endpoint with a fixed prompt
//! template and low-variance sampling. Every failure degrades to the
//! fixed fallback reply.

use async_trait::async_trait;
use phyto_core::advisory::{
    Advice, AdvisoryError, AdvisoryRequest, AdvisoryService, SamplingOptions,
    build_treatment_prompt,
};
use phyto_core::config::AdvisorConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.2:3b";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Advisory backend for the Ollama HTTP API.
#[derive(Clone, Debug)]
pub struct OllamaAdvisor {
    client: Client,
    generate_url: String,
    model: String,
    timeout: Duration,
    sampling: SamplingOptions,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: &'a SamplingOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

impl OllamaAdvisor {
    /// Creates an advisor for the Ollama server at `base_url`.
    pub fn new(base_url: impl AsRef<str>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            generate_url: format!("{}/api/generate", base_url.as_ref().trim_end_matches('/')),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
            sampling: SamplingOptions::default(),
        }
    }

    pub fn from_config(config: &AdvisorConfig) -> Self {
        Self::new(&config.base_url, config.model.clone())
            .with_timeout(config.timeout())
            .with_sampling(config.sampling)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingOptions) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn generate_url(&self) -> &str {
        &self.generate_url
    }

    /// Performs one generate call, surfacing the precise failure.
    pub async fn try_advise(&self, request: &AdvisoryRequest) -> Result<String, AdvisoryError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: build_treatment_prompt(request),
            stream: false,
            options: &self.sampling,
        };

        let response = self
            .client
            .post(&self.generate_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Ollama error body".to_string());
            return Err(AdvisoryError::Status {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|err| {
            if err.is_timeout() {
                AdvisoryError::Timeout {
                    budget: self.timeout,
                }
            } else {
                AdvisoryError::Decode(err.to_string())
            }
        })?;

        match parsed.response {
            Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            _ => Err(AdvisoryError::EmptyResponse),
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> AdvisoryError {
        if err.is_timeout() {
            AdvisoryError::Timeout {
                budget: self.timeout,
            }
        } else {
            AdvisoryError::Unreachable(err.to_string())
        }
    }
}

impl Default for OllamaAdvisor {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_MODEL)
    }
}

#[async_trait]
impl AdvisoryService for OllamaAdvisor {
    async fn advise(&self, request: &AdvisoryRequest) -> Advice {
        let started = Instant::now();
        match self.try_advise(request).await {
            Ok(text) => {
                tracing::info!(
                    model = %self.model,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    chars = text.len(),
                    "Advisory reply generated"
                );
                Advice::from_model(text)
            }
            Err(err) => {
                tracing::warn!(
                    model = %self.model,
                    url = %self.generate_url,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "Advisory call failed, using fallback"
                );
                Advice::fallback()
            }
        }
    }
}
