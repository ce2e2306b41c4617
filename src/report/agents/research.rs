//! Research Agent
//!
//! Synthesizes figures from the injected data block and the outline. When a
//! search tool is attached, encyclopedia summaries for the request are added
//! to the prompt. On a revision pass the critique is appended as well.

use std::sync::Arc;
use tracing::warn;

use super::{AgentInvoker, StageAgent, StageAgentConfig, run_stage_agent};
use crate::report::contract::{Slot, Stage};
use crate::report::prompts;
use crate::report::state::{RunState, StageUpdate};
use crate::tools::WikiSearch;
use crate::types::Result;

struct SearchBinding {
    tool: Arc<WikiSearch>,
    max_results: usize,
    lang: String,
}

pub struct ResearchAgent {
    invoker: AgentInvoker,
    data_block: String,
    search: Option<SearchBinding>,
}

impl ResearchAgent {
    pub fn new(invoker: AgentInvoker, data_block: String) -> Self {
        Self {
            invoker,
            data_block,
            search: None,
        }
    }

    pub fn with_search(mut self, tool: Arc<WikiSearch>, max_results: usize, lang: &str) -> Self {
        self.search = Some(SearchBinding {
            tool,
            max_results,
            lang: lang.to_string(),
        });
        self
    }

    async fn gather_evidence(&self, request: &str) -> Option<String> {
        let binding = self.search.as_ref()?;
        match binding
            .tool
            .search(request, binding.max_results, &binding.lang)
            .await
        {
            Ok(text) if WikiSearch::is_sentinel(&text) => None,
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Search failed, continuing without summaries: {}", e);
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl StageAgent for ResearchAgent {
    fn stage(&self) -> Stage {
        Stage::Research
    }

    async fn run(&self, state: &RunState) -> Result<StageUpdate> {
        let evidence = self.gather_evidence(state.request()).await;
        let data_block = self.data_block.as_str();

        run_stage_agent(
            &self.invoker,
            state,
            StageAgentConfig::verbatim(Stage::Research, move |state| {
                let critique = (state.revisions() > 0).then(|| state.slot(Slot::Critique));
                prompts::research_prompt(
                    data_block,
                    state.slot(Slot::Outline),
                    evidence.as_deref(),
                    critique,
                )
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::MockProvider;
    use crate::constants::research::DEFAULT_DATA_BLOCK;
    use crate::tools::CallBudget;
    use crate::types::{Message, RunId};

    #[tokio::test]
    async fn test_prompt_carries_data_block_and_outline() {
        let provider = Arc::new(MockProvider::scripted(&["{\"key_points\": []}"]));
        let agent = ResearchAgent::new(
            AgentInvoker::new(Stage::Research, provider.clone(), 0.0),
            DEFAULT_DATA_BLOCK.to_string(),
        );

        let mut state = RunState::new(RunId::new("cli-r"), "req");
        state.apply(StageUpdate {
            stage: Stage::Outline,
            messages: vec![Message::model("{\"title\": \"PIB\"}")],
            value: "{\"title\": \"PIB\"}".to_string(),
        });

        agent.run(&state).await.unwrap();
        let prompt = provider.calls()[0].prompt().to_string();
        assert!(prompt.contains(DEFAULT_DATA_BLOCK));
        assert!(prompt.contains("Outline: {\"title\": \"PIB\"}"));
        assert!(!prompt.contains("Révision"));
    }

    #[tokio::test]
    async fn test_exhausted_search_adds_nothing() {
        let provider = Arc::new(MockProvider::scripted(&["{}"]));
        let search = Arc::new(WikiSearch::new(Arc::new(CallBudget::new(0)), 5).unwrap());
        let agent = ResearchAgent::new(
            AgentInvoker::new(Stage::Research, provider.clone(), 0.0),
            "DATA".to_string(),
        )
        .with_search(search, 2, "en");

        let state = RunState::new(RunId::new("cli-r"), "req");
        agent.run(&state).await.unwrap();
        assert!(!provider.calls()[0].prompt().contains("Résumés encyclopédiques"));
    }
}
