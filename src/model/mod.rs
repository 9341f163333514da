pub mod types;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

pub use types::{CompletionRequest, CompletionResponse, Message, Role, UpstreamReply};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion API key is not configured")]
    MissingApiKey,
    #[error("{0}")]
    Network(String),
    #[error("could not build completion request: {0}")]
    Request(String),
}

/// Anything that can answer a `chat/completions` request.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Whether credentials for the upstream are present.
    fn is_configured(&self) -> bool {
        true
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<UpstreamReply, CompletionError>;
}

/// Connection settings for an OpenAI-compatible completion endpoint.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Sent as `HTTP-Referer` for upstream attribution.
    pub referer: String,
    /// Sent as `X-Title` for upstream attribution.
    pub title: String,
    pub timeout: Duration,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            api_key: None,
            referer: "http://localhost:8000".to_string(),
            title: "Inspair.Health".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

// A wrapper for the OpenRouter chat completions API
pub struct OpenRouterClient {
    settings: CompletionSettings,
    client: Client,
}

impl OpenRouterClient {
    pub fn new(settings: CompletionSettings) -> Result<Self, reqwest::Error> {
        info!("Using completion endpoint at: {}", settings.endpoint);

        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { settings, client })
    }
}

#[async_trait]
impl CompletionApi for OpenRouterClient {
    fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<UpstreamReply, CompletionError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingApiKey)?;

        info!(
            "Sending {} messages to {} (max_tokens: {})",
            request.messages.len(),
            request.model,
            request.max_tokens
        );

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.settings.referer)
            .header("X-Title", &self.settings.title)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    CompletionError::Request(e.to_string())
                } else {
                    CompletionError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        info!("Completion API status: {}", status);
        debug!("Completion API response: {}", body);

        Ok(UpstreamReply { status, body })
    }
}
