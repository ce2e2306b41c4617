//! LLM Provider Abstraction
//!
//! Defines the LlmProvider trait: given a role-tagged message history and a
//! temperature, return one generated message. Every provider turns the wire
//! response into a [`Message`] through
//! [`normalize_content`](crate::types::normalize_content), so nothing past
//! this module ever sees the service's content shapes.
//!
//! ## Modules
//!
//! - `azure`: Azure OpenAI deployments (default)
//! - `openai`: OpenAI-compatible chat completions
//! - `wire`: shared request/response types and the HTTP exchange

mod azure;
mod openai;
mod wire;

#[cfg(test)]
pub mod testing;

pub use azure::AzureOpenAiProvider;
pub use openai::OpenAiProvider;

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::types::{Message, RapportError, Result};

// =============================================================================
// LLM Response with Usage Metrics
// =============================================================================

/// Generated message plus the usage reported by the service
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Normalized model-authored message
    pub message: Message,
    pub usage: TokenUsage,
    pub timing: ResponseTiming,
    pub metadata: ResponseMetadata,
}

impl LlmResponse {
    /// Create response with a message only (usage unknown)
    pub fn message_only(message: Message) -> Self {
        Self {
            message,
            usage: TokenUsage::default(),
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    /// Wall-clock time of the call in milliseconds
    pub total_ms: u64,
}

impl ResponseTiming {
    pub fn from_duration(duration: std::time::Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
        }
    }
}

/// Response metadata
#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    pub model: String,
    pub provider: String,
}

/// Shared LLM provider type; one instance backs all five stage invokers.
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for LLM providers
///
/// API keys are never serialized and are redacted in debug output. Each
/// provider converts the key to SecretString internally.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type: "azure" or "openai"
    pub provider: String,
    /// Model name (deployment name for Azure)
    pub model: Option<String>,
    pub api_base: Option<String>,
    /// Azure API version
    pub api_version: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: usize,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::from_llm(&LlmConfig::default())
    }
}

impl ProviderConfig {
    pub fn from_llm(llm: &LlmConfig) -> Self {
        Self {
            provider: llm.provider.clone(),
            model: llm.model.clone(),
            api_base: llm.api_base.clone(),
            api_version: llm.api_version.clone(),
            api_key: llm.api_key.clone(),
            timeout_secs: llm.timeout_secs,
            max_tokens: llm.max_tokens,
        }
    }

    /// Apply CLI overrides
    pub fn with_overrides(mut self, provider: Option<&str>, model: Option<&str>) -> Self {
        if let Some(provider) = provider {
            self.provider = provider.to_string();
        }
        if let Some(model) = model {
            self.model = Some(model.to_string());
        }
        self
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// Generation capability: role-tagged history in, one model message out
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate the next message for `history` at the given temperature.
    ///
    /// The returned message text is raw: no validation is applied.
    async fn generate(&self, history: &[Message], temperature: f32) -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model or deployment in use
    fn model(&self) -> &str;

    /// Check if the provider answers at all
    async fn health_check(&self) -> Result<bool>;
}

/// Create a shared provider from configuration.
///
/// Fails before any network traffic when credentials or endpoints are missing.
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "azure" | "azure-openai" => Ok(Arc::new(AzureOpenAiProvider::new(config.clone())?)),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        _ => Err(RapportError::Config(format!(
            "Unknown provider: {}. Supported: azure, openai",
            config.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_is_config_error() {
        let config = ProviderConfig {
            provider: "ollama".to_string(),
            ..ProviderConfig::default()
        };
        let err = create_provider(&config).err().unwrap();
        assert!(err.is_config());
        assert!(err.to_string().contains("ollama"));
    }

    #[test]
    fn test_overrides() {
        let config = ProviderConfig::default().with_overrides(Some("openai"), Some("gpt-4o"));
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ProviderConfig {
            api_key: Some("sk-secret".to_string()),
            ..ProviderConfig::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
