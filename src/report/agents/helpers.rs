//! Stage Agent Helpers
//!
//! The invoker wrapper shared by all five stages and the generic runner that
//! holds their common execution pattern:
//! 1. Build prompt -> 2. Invoke -> 3. Post-process reply -> 4. Log summary

use tracing::{debug, info};

use crate::ai::SharedProvider;
use crate::report::contract::Stage;
use crate::report::state::{RunState, StageUpdate};
use crate::types::{Message, Result, capitalize_first};

// =============================================================================
// Agent Invoker
// =============================================================================

/// One generation capability bound to one stage's instruction and temperature.
///
/// Both are fixed at construction and never change for the invoker's lifetime.
#[derive(Clone)]
pub struct AgentInvoker {
    stage: Stage,
    provider: SharedProvider,
    system_instruction: String,
    temperature: f32,
}

impl AgentInvoker {
    pub fn new(stage: Stage, provider: SharedProvider, temperature: f32) -> Self {
        Self {
            stage,
            provider,
            system_instruction: stage.descriptor().system_instruction.to_string(),
            temperature,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Send `history` headed by the stage instruction; the reply is returned unvalidated
    pub async fn invoke(&self, history: &[Message]) -> Result<Message> {
        let mut full = Vec::with_capacity(history.len() + 1);
        full.push(Message::system(self.system_instruction.as_str()));
        full.extend_from_slice(history);

        let response = self.provider.generate(&full, self.temperature).await?;
        Ok(response.message)
    }
}

impl std::fmt::Debug for AgentInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentInvoker")
            .field("stage", &self.stage)
            .field("provider", &self.provider.name())
            .field("temperature", &self.temperature)
            .finish()
    }
}

// =============================================================================
// Agent Runner Abstraction
// =============================================================================

/// Stage-specific behavior for the generic runner.
#[allow(clippy::type_complexity)]
pub struct StageAgentConfig<'a> {
    pub stage: Stage,
    /// Prompt built from the slots the stage reads
    pub build_prompt: Box<dyn Fn(&RunState) -> String + Send + Sync + 'a>,
    /// Turns the raw reply into the slot value
    pub finish: Box<dyn Fn(&str) -> String + Send + Sync + 'a>,
    /// One-line description of the produced value for debug logs
    pub summarize: Box<dyn Fn(&str) -> String + Send + Sync + 'a>,
}

impl<'a> StageAgentConfig<'a> {
    /// Slot value is the reply verbatim
    pub fn verbatim(
        stage: Stage,
        build_prompt: impl Fn(&RunState) -> String + Send + Sync + 'a,
    ) -> Self {
        Self {
            stage,
            build_prompt: Box::new(build_prompt),
            finish: Box::new(|raw| raw.to_string()),
            summarize: Box::new(|value| format!("{} chars", value.chars().count())),
        }
    }
}

/// Generic stage runner.
///
/// The stage's history is its prompt alone; the returned update carries the
/// prompt and the reply so the log keeps causal order.
pub async fn run_stage_agent(
    invoker: &AgentInvoker,
    state: &RunState,
    config: StageAgentConfig<'_>,
) -> Result<StageUpdate> {
    let prompt = (config.build_prompt)(state);
    debug!(
        "{}Agent: prompt of {} chars",
        capitalize_first(config.stage.id()),
        prompt.chars().count()
    );

    let prompt = Message::user(prompt);
    let reply = invoker.invoke(std::slice::from_ref(&prompt)).await?;
    let value = (config.finish)(&reply.text);

    info!(
        "{}Agent: {}",
        capitalize_first(config.stage.id()),
        (config.summarize)(&value)
    );

    Ok(StageUpdate {
        stage: config.stage,
        messages: vec![prompt, reply],
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::MockProvider;
    use crate::types::{Origin, RunId};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_invoker_prepends_instruction() {
        let provider = Arc::new(MockProvider::scripted(&["{}"]));
        let invoker = AgentInvoker::new(Stage::Critic, provider.clone(), 0.0);

        let reply = invoker.invoke(&[Message::user("Vérifie")]).await.unwrap();
        assert_eq!(reply.origin, Origin::Model);

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].history[0].origin, Origin::System);
        assert_eq!(calls[0].system(), Stage::Critic.descriptor().system_instruction);
        assert_eq!(calls[0].prompt(), "Vérifie");
        assert_eq!(calls[0].temperature, 0.0);
    }

    #[tokio::test]
    async fn test_runner_returns_prompt_and_reply() {
        let provider = Arc::new(MockProvider::scripted(&["  réponse  "]));
        let invoker = AgentInvoker::new(Stage::Outline, provider, 0.1);
        let state = RunState::new(RunId::new("cli-t"), "req");

        let config = StageAgentConfig {
            finish: Box::new(|raw| raw.trim().to_string()),
            ..StageAgentConfig::verbatim(Stage::Outline, |s| format!("P: {}", s.request()))
        };
        let update = run_stage_agent(&invoker, &state, config).await.unwrap();

        assert_eq!(update.value, "réponse");
        assert_eq!(update.messages.len(), 2);
        assert_eq!(update.messages[0].text, "P: req");
        assert_eq!(update.messages[1].text, "  réponse  ");
    }

    #[tokio::test]
    async fn test_runner_propagates_failure() {
        let provider = Arc::new(MockProvider::scripted(&[]));
        let invoker = AgentInvoker::new(Stage::Math, provider, 0.0);
        let state = RunState::new(RunId::new("cli-t"), "req");

        let result = run_stage_agent(
            &invoker,
            &state,
            StageAgentConfig::verbatim(Stage::Math, |_| "p".to_string()),
        )
        .await;
        assert!(result.is_err());
    }
}
