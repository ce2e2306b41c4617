//! Stage Agents
//!
//! One agent per stage. Each is a pure `(RunState) -> StageUpdate` function
//! over its own [`AgentInvoker`].

pub mod critic;
pub mod helpers;
pub mod math;
pub mod outline;
pub mod research;
pub mod writer;

pub use critic::CriticAgent;
pub use helpers::{AgentInvoker, StageAgentConfig, run_stage_agent};
pub use math::MathAgent;
pub use outline::OutlineAgent;
pub use research::ResearchAgent;
pub use writer::WriterAgent;

use std::sync::Arc;

use super::contract::Stage;
use super::state::{RunState, StageUpdate};
use crate::ai::SharedProvider;
use crate::config::Config;
use crate::tools::WikiSearch;
use crate::types::Result;

/// Trait for stage agents
#[async_trait::async_trait]
pub trait StageAgent: Send + Sync {
    fn stage(&self) -> Stage;

    /// Read the slots this stage needs and produce its update
    async fn run(&self, state: &RunState) -> Result<StageUpdate>;
}

/// The five agents of a pipeline, all sharing one provider
pub struct AgentSet {
    outline: OutlineAgent,
    research: ResearchAgent,
    math: MathAgent,
    critic: CriticAgent,
    writer: WriterAgent,
}

impl AgentSet {
    pub fn new(provider: SharedProvider, config: &Config, search: Option<Arc<WikiSearch>>) -> Self {
        let temps = &config.pipeline.temperatures;
        let invoker = |stage, temperature| AgentInvoker::new(stage, provider.clone(), temperature);

        let mut research = ResearchAgent::new(
            invoker(Stage::Research, temps.research),
            config.research.data_block.clone(),
        );
        if let Some(search) = search {
            research = research.with_search(search, config.search.max_results, &config.search.lang);
        }

        Self {
            outline: OutlineAgent::new(invoker(Stage::Outline, temps.outline)),
            research,
            math: MathAgent::new(
                invoker(Stage::Math, temps.math),
                config.research.computations.clone(),
            ),
            critic: CriticAgent::new(
                invoker(Stage::Critic, temps.critic),
                config.pipeline.preview_chars,
            ),
            writer: WriterAgent::new(invoker(Stage::Writer, temps.writer)),
        }
    }

    pub fn get(&self, stage: Stage) -> &dyn StageAgent {
        match stage {
            Stage::Outline => &self.outline,
            Stage::Research => &self.research,
            Stage::Math => &self.math,
            Stage::Critic => &self.critic,
            Stage::Writer => &self.writer,
        }
    }
}
