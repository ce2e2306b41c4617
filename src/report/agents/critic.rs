//! Critic Agent
//!
//! Reviews previews of the outline, research and math slots. Its output is
//! advisory unless revision cycles are enabled.

use super::{AgentInvoker, StageAgent, StageAgentConfig, run_stage_agent};
use crate::report::contract::{CritiqueView, Slot, Stage};
use crate::report::prompts;
use crate::report::state::{RunState, StageUpdate};
use crate::types::Result;

pub struct CriticAgent {
    invoker: AgentInvoker,
    preview_chars: usize,
}

impl CriticAgent {
    pub fn new(invoker: AgentInvoker, preview_chars: usize) -> Self {
        Self {
            invoker,
            preview_chars,
        }
    }
}

#[async_trait::async_trait]
impl StageAgent for CriticAgent {
    fn stage(&self) -> Stage {
        Stage::Critic
    }

    async fn run(&self, state: &RunState) -> Result<StageUpdate> {
        let preview_chars = self.preview_chars;
        run_stage_agent(
            &self.invoker,
            state,
            StageAgentConfig {
                summarize: Box::new(|value| match CritiqueView::parse(value) {
                    Some(view) => format!(
                        "{} blocking, {} warnings, {} fixes",
                        view.blocking_issues.len(),
                        view.warnings.len(),
                        view.suggested_fixes.len()
                    ),
                    None => format!("{} chars, not parseable as a critique", value.len()),
                }),
                ..StageAgentConfig::verbatim(Stage::Critic, move |state| {
                    prompts::critic_prompt(
                        state.slot(Slot::Outline),
                        state.slot(Slot::Research),
                        state.slot(Slot::Math),
                        preview_chars,
                    )
                })
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::MockProvider;
    use crate::types::{Message, RunId};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_critic_sees_truncated_previews() {
        let provider = Arc::new(MockProvider::scripted(&["{\"blocking_issues\": []}"]));
        let agent = CriticAgent::new(AgentInvoker::new(Stage::Critic, provider.clone(), 0.0), 10);

        let mut state = RunState::new(RunId::new("cli-c"), "req");
        state.apply(StageUpdate {
            stage: Stage::Research,
            messages: vec![Message::model("r")],
            value: "0123456789ABCDEF".to_string(),
        });

        agent.run(&state).await.unwrap();
        let prompt = provider.calls()[0].prompt().to_string();
        assert!(prompt.contains("Research: 0123456789\n"));
        assert!(!prompt.contains("ABCDEF"));
        assert!(prompt.contains("Outline: \n"));
    }
}
