//! Azure OpenAI Provider
//!
//! Chat completions against an Azure deployment. The endpoint, deployment,
//! API version and key are resolved once at construction, from the config
//! first and the `AZURE_OPENAI_*` environment second. Anything missing is a
//! configuration error naming every absent variable.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use super::wire::{ChatCompletionRequest, exchange};
use super::{LlmProvider, LlmResponse, ProviderConfig};
use crate::constants::llm::env;
use crate::types::{Message, RapportError, Result};

const PROVIDER_NAME: &str = "azure";

/// Azure OpenAI provider with secure API key handling
pub struct AzureOpenAiProvider {
    api_key: SecretString,
    endpoint: Url,
    deployment: String,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for AzureOpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint.as_str())
            .field("deployment", &self.deployment)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Fully resolved Azure settings
#[derive(Debug, PartialEq, Eq)]
struct AzureSettings {
    api_key: String,
    api_base: String,
    deployment: String,
    api_version: String,
}

impl AzureSettings {
    fn resolve(config: &ProviderConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let mut missing = Vec::new();

        let api_key = non_empty(config.api_key.clone()).or_else(|| non_empty(lookup(env::AZURE_API_KEY)));
        if api_key.is_none() {
            missing.push(env::AZURE_API_KEY);
        }

        let api_base = non_empty(config.api_base.clone())
            .or_else(|| non_empty(lookup(env::AZURE_API_BASE)))
            .or_else(|| non_empty(lookup(env::AZURE_ENDPOINT)));
        if api_base.is_none() {
            missing.push(env::AZURE_API_BASE);
        }

        let deployment =
            non_empty(config.model.clone()).or_else(|| non_empty(lookup(env::AZURE_DEPLOYMENT)));
        if deployment.is_none() {
            missing.push(env::AZURE_DEPLOYMENT);
        }

        let api_version = non_empty(config.api_version.clone())
            .or_else(|| non_empty(lookup(env::AZURE_API_VERSION)));
        if api_version.is_none() {
            missing.push(env::AZURE_API_VERSION);
        }

        match (api_key, api_base, deployment, api_version) {
            (Some(api_key), Some(api_base), Some(deployment), Some(api_version)) => Ok(Self {
                api_key,
                api_base,
                deployment,
                api_version,
            }),
            _ => Err(RapportError::Config(format!(
                "Azure OpenAI configuration incomplete, missing: {}",
                missing.join(", ")
            ))),
        }
    }

    fn endpoint(&self) -> Result<Url> {
        let raw = format!(
            "{}/openai/deployments/{}/chat/completions",
            self.api_base.trim_end_matches('/'),
            self.deployment
        );
        let mut url = Url::parse(&raw).map_err(|e| {
            RapportError::Config(format!("Invalid Azure endpoint '{}': {}", self.api_base, e))
        })?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

impl AzureOpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        Self::with_lookup(config, |key| std::env::var(key).ok())
    }

    /// Construct with an explicit variable source instead of the process environment
    pub fn with_lookup(
        config: ProviderConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let settings = AzureSettings::resolve(&config, lookup)?;
        let endpoint = settings.endpoint()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RapportError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(settings.api_key),
            endpoint,
            deployment: settings.deployment,
            max_tokens: config.max_tokens,
            client,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAiProvider {
    async fn generate(&self, history: &[Message], temperature: f32) -> Result<LlmResponse> {
        info!(
            "Generating with Azure OpenAI (deployment: {}, temperature: {})",
            self.deployment, temperature
        );

        let body = ChatCompletionRequest::new(None, history, temperature, self.max_tokens);
        let request = self
            .client
            .post(self.endpoint.clone())
            .header("api-key", self.api_key.expose_secret());

        exchange(request, &body, PROVIDER_NAME, &self.deployment).await
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.deployment
    }

    async fn health_check(&self) -> Result<bool> {
        let probe = [Message::user("ping")];
        match self.generate(&probe, 0.0).await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Azure OpenAI check failed: {}", e);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn azure_config() -> ProviderConfig {
        ProviderConfig {
            provider: "azure".to_string(),
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn test_missing_variables_are_all_named() {
        let err = AzureOpenAiProvider::with_lookup(azure_config(), lookup_from(&[]))
            .err()
            .unwrap();
        let msg = err.to_string();
        assert!(err.is_config());
        assert!(msg.contains("AZURE_OPENAI_API_KEY"));
        assert!(msg.contains("AZURE_OPENAI_API_BASE"));
        assert!(msg.contains("AZURE_OPENAI_API_DEPLOYMENT_NAME"));
        assert!(msg.contains("AZURE_OPENAI_API_VERSION"));
    }

    #[test]
    fn test_endpoint_built_from_environment() {
        let provider = AzureOpenAiProvider::with_lookup(
            azure_config(),
            lookup_from(&[
                ("AZURE_OPENAI_API_KEY", "k"),
                ("AZURE_OPENAI_ENDPOINT", "https://acme.openai.azure.com/"),
                ("AZURE_OPENAI_API_DEPLOYMENT_NAME", "gpt4o"),
                ("AZURE_OPENAI_API_VERSION", "2024-06-01"),
            ]),
        )
        .unwrap();

        assert_eq!(
            provider.endpoint().as_str(),
            "https://acme.openai.azure.com/openai/deployments/gpt4o/chat/completions?api-version=2024-06-01"
        );
        assert_eq!(provider.model(), "gpt4o");
        assert!(!format!("{:?}", provider).contains("\"k\""));
    }

    #[test]
    fn test_config_values_win_over_environment() {
        let config = ProviderConfig {
            model: Some("from-config".to_string()),
            api_key: Some("key".to_string()),
            api_base: Some("https://config.example.com".to_string()),
            api_version: Some("2024-02-01".to_string()),
            ..azure_config()
        };
        let provider = AzureOpenAiProvider::with_lookup(
            config,
            lookup_from(&[("AZURE_OPENAI_API_DEPLOYMENT_NAME", "from-env")]),
        )
        .unwrap();
        assert_eq!(provider.model(), "from-config");
    }

    #[test]
    fn test_invalid_base_is_config_error() {
        let err = AzureOpenAiProvider::with_lookup(
            azure_config(),
            lookup_from(&[
                ("AZURE_OPENAI_API_KEY", "k"),
                ("AZURE_OPENAI_API_BASE", "not a url"),
                ("AZURE_OPENAI_API_DEPLOYMENT_NAME", "d"),
                ("AZURE_OPENAI_API_VERSION", "v"),
            ]),
        )
        .err()
        .unwrap();
        assert!(err.is_config());
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let err = AzureOpenAiProvider::with_lookup(
            azure_config(),
            lookup_from(&[
                ("AZURE_OPENAI_API_KEY", "  "),
                ("AZURE_OPENAI_API_BASE", "https://a.example.com"),
                ("AZURE_OPENAI_API_DEPLOYMENT_NAME", "d"),
                ("AZURE_OPENAI_API_VERSION", "v"),
            ]),
        )
        .err()
        .unwrap();
        let msg = err.to_string();
        assert!(msg.contains("AZURE_OPENAI_API_KEY"));
        assert!(!msg.contains("AZURE_OPENAI_API_VERSION"));
    }
}
