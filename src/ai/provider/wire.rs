//! Chat Completions wire format
//!
//! Shared by the Azure and OpenAI providers. Response content is kept as a raw
//! JSON value and collapsed into text by `normalize_content`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

use super::{LlmResponse, ResponseMetadata, ResponseTiming, TokenUsage};
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Message, Result, normalize_content};

#[derive(Debug, Serialize)]
pub(super) struct ChatCompletionRequest {
    /// Azure routes by deployment and omits the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<WireMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
}

impl ChatCompletionRequest {
    pub fn new(
        model: Option<String>,
        history: &[Message],
        temperature: f32,
        max_tokens: usize,
    ) -> Self {
        Self {
            model,
            messages: history
                .iter()
                .map(|m| WireMessage {
                    role: m.origin.as_role(),
                    content: m.text.clone(),
                })
                .collect(),
            temperature,
            max_tokens: Some(max_tokens),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct WireMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    /// String or list of fragments
    #[serde(default)]
    pub content: Value,
}

#[derive(Debug, Deserialize)]
pub(super) struct UsageInfo {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// First choice as a normalized message
    pub fn into_message(self, provider: &str) -> Result<(Message, TokenUsage)> {
        let usage = self
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        let choice = self.choices.into_iter().next().ok_or_else(|| {
            LlmError::new(ErrorCategory::ParseError, "No choices in response").provider(provider)
        })?;

        let role = choice.message.role.as_deref().unwrap_or("assistant");
        Ok((Message::from_wire(role, &choice.message.content), usage))
    }
}

/// Send a prepared request and decode the reply
pub(super) async fn exchange(
    request: reqwest::RequestBuilder,
    body: &ChatCompletionRequest,
    provider: &str,
    model: &str,
) -> Result<LlmResponse> {
    let start_time = Instant::now();

    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| ErrorClassifier::classify(&e.to_string(), provider))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(ErrorClassifier::classify_http_status(status.as_u16(), &text, provider).into());
    }

    let decoded: ChatCompletionResponse = response.json().await.map_err(|e| {
        LlmError::new(
            ErrorCategory::ParseError,
            format!("Failed to parse response: {}", e),
        )
        .provider(provider)
    })?;

    let (message, usage) = decoded.into_message(provider)?;
    let elapsed = start_time.elapsed();

    debug!(
        provider,
        chars = message.text.len(),
        tokens = usage.total(),
        ms = elapsed.as_millis() as u64,
        "Received completion"
    );

    Ok(LlmResponse {
        message,
        usage,
        timing: ResponseTiming::from_duration(elapsed),
        metadata: ResponseMetadata {
            model: model.to_string(),
            provider: provider.to_string(),
        },
    })
}
