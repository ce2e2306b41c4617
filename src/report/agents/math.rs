//! Math Agent
//!
//! Computes the requested figures from the research synthesis. Missing inputs
//! are handled by the instruction, not here: the agent is told to return an
//! empty computation list plus a note.

use super::{AgentInvoker, StageAgent, StageAgentConfig, run_stage_agent};
use crate::report::contract::{MathView, Slot, Stage};
use crate::report::prompts;
use crate::report::state::{RunState, StageUpdate};
use crate::types::Result;

pub struct MathAgent {
    invoker: AgentInvoker,
    computations: Vec<String>,
}

impl MathAgent {
    pub fn new(invoker: AgentInvoker, computations: Vec<String>) -> Self {
        Self {
            invoker,
            computations,
        }
    }
}

#[async_trait::async_trait]
impl StageAgent for MathAgent {
    fn stage(&self) -> Stage {
        Stage::Math
    }

    async fn run(&self, state: &RunState) -> Result<StageUpdate> {
        let computations = self.computations.as_slice();
        run_stage_agent(
            &self.invoker,
            state,
            StageAgentConfig {
                summarize: Box::new(|value| match MathView::parse(value) {
                    Some(view) => format!(
                        "{} computations, {} notes",
                        view.computations.len(),
                        view.notes.len()
                    ),
                    None => format!("{} chars, not parseable as computations", value.len()),
                }),
                ..StageAgentConfig::verbatim(Stage::Math, move |state| {
                    prompts::math_prompt(computations, state.slot(Slot::Research))
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
    use crate::types::RunId;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_empty_research_still_runs() {
        let reply = r#"{"computations": [], "notes": ["Aucune donnée de recherche fournie"]}"#;
        let provider = Arc::new(MockProvider::scripted(&[reply]));
        let agent = MathAgent::new(
            AgentInvoker::new(Stage::Math, provider.clone(), 0.0),
            vec!["Part NY/USA".to_string()],
        );
        let state = RunState::new(RunId::new("cli-m"), "req");

        let update = agent.run(&state).await.unwrap();
        let view = MathView::parse(&update.value).unwrap();
        assert!(view.computations.is_empty());
        assert_eq!(view.notes.len(), 1);

        let call = &provider.calls()[0];
        assert!(call.prompt().ends_with("Data: "));
        assert!(call.system().contains("empty computations list"));
    }
}
