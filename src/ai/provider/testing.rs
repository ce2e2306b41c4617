//! Scripted provider for orchestration tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{LlmProvider, LlmResponse};
use crate::types::{ErrorCategory, LlmError, Message, Result};

/// One recorded `generate` call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub history: Vec<Message>,
    pub temperature: f32,
}

impl RecordedCall {
    /// System instruction at the head of the history
    pub fn system(&self) -> &str {
        self.history.first().map(|m| m.text.as_str()).unwrap_or("")
    }

    /// The stage prompt (last entry)
    pub fn prompt(&self) -> &str {
        self.history.last().map(|m| m.text.as_str()).unwrap_or("")
    }
}

type Responder = Box<dyn Fn(usize, &[Message]) -> Option<String> + Send + Sync>;

/// Replays queued replies and records every history it receives.
///
/// A `None` from the responder is reported as a network failure.
pub struct MockProvider {
    responder: Responder,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockProvider {
    /// Reply with `replies` in order, failing once they run out
    pub fn scripted(replies: &[&str]) -> Self {
        let queue: Mutex<VecDeque<String>> =
            Mutex::new(replies.iter().map(|r| r.to_string()).collect());
        Self::with_responder(move |_, _| {
            queue
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .pop_front()
        })
    }

    /// Reply with `replies` in order but fail the call at index `fail_at`
    pub fn failing_at(replies: &[&str], fail_at: usize) -> Self {
        let replies: Vec<String> = replies.iter().map(|r| r.to_string()).collect();
        Self::with_responder(move |index, _| {
            if index == fail_at {
                None
            } else {
                let offset = if index > fail_at { index - 1 } else { index };
                replies.get(offset).cloned()
            }
        })
    }

    /// Compute each reply from the call index and history
    pub fn with_responder(
        f: impl Fn(usize, &[Message]) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(f),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn generate(&self, history: &[Message], temperature: f32) -> Result<LlmResponse> {
        let index = {
            let mut calls = self.calls.lock().unwrap_or_else(|p| p.into_inner());
            calls.push(RecordedCall {
                history: history.to_vec(),
                temperature,
            });
            calls.len() - 1
        };

        match (self.responder)(index, history) {
            Some(text) => Ok(LlmResponse::message_only(Message::model(text))),
            None => Err(LlmError::new(ErrorCategory::Network, "mock connection reset")
                .provider("mock")
                .into()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
