//! Outline Agent
//!
//! Plans the title and section tree from the user's request.

use super::{AgentInvoker, StageAgent, StageAgentConfig, run_stage_agent};
use crate::report::contract::{OutlineView, Stage};
use crate::report::prompts;
use crate::report::state::{RunState, StageUpdate};
use crate::types::Result;

pub struct OutlineAgent {
    invoker: AgentInvoker,
}

impl OutlineAgent {
    pub fn new(invoker: AgentInvoker) -> Self {
        Self { invoker }
    }

    pub fn invoker(&self) -> &AgentInvoker {
        &self.invoker
    }
}

#[async_trait::async_trait]
impl StageAgent for OutlineAgent {
    fn stage(&self) -> Stage {
        Stage::Outline
    }

    async fn run(&self, state: &RunState) -> Result<StageUpdate> {
        run_stage_agent(
            &self.invoker,
            state,
            StageAgentConfig {
                summarize: Box::new(|value| match OutlineView::parse(value) {
                    Some(view) => format!("'{}' with {} sections", view.title, view.sections.len()),
                    None => format!("{} chars, not parseable as an outline", value.len()),
                }),
                ..StageAgentConfig::verbatim(Stage::Outline, |state| {
                    prompts::outline_prompt(state.request())
                })
            },
        )
        .await
    }
}
