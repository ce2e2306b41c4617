//! OpenAI API Provider
//!
//! Chat completions against api.openai.com or any compatible endpoint.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use super::wire::{ChatCompletionRequest, exchange};
use super::{LlmProvider, LlmResponse, ProviderConfig};
use crate::constants::llm::{DEFAULT_OPENAI_BASE, DEFAULT_OPENAI_MODEL, env};
use crate::types::{Message, RapportError, Result};

const PROVIDER_NAME: &str = "openai";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key_str = config
            .api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(env::OPENAI_API_KEY).ok())
            .ok_or_else(|| {
                RapportError::Config(format!(
                    "OpenAI API key not found. Set {} env var or provide llm.api_key in config",
                    env::OPENAI_API_KEY
                ))
            })?;

        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        Url::parse(&api_base).map_err(|e| {
            RapportError::Config(format!("Invalid OpenAI base URL '{}': {}", api_base, e))
        })?;

        let model = config
            .model
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RapportError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base,
            model,
            max_tokens: config.max_tokens,
            client,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, history: &[Message], temperature: f32) -> Result<LlmResponse> {
        info!(
            "Generating with OpenAI (model: {}, temperature: {})",
            self.model, temperature
        );

        let body = ChatCompletionRequest::new(
            Some(self.model.clone()),
            history,
            temperature,
            self.max_tokens,
        );
        let request = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(self.api_key.expose_secret());

        exchange(request, &body, PROVIDER_NAME, &self.model).await
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/models", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("OpenAI API is available");
                Ok(true)
            }
            Ok(resp) => {
                warn!("OpenAI API check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("OpenAI API check failed: {}", e);
                Ok(false)
            }
        }
    }
}
