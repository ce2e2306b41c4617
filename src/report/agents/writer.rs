//! Writer Agent
//!
//! Assembles the final Markdown report from every upstream slot. A Markdown
//! fence around the reply is removed before the slot is written.

use super::{AgentInvoker, StageAgent, StageAgentConfig, run_stage_agent};
use crate::report::contract::{OutlineView, Slot, Stage};
use crate::report::fallback::strip_markdown_fence;
use crate::report::prompts;
use crate::report::state::{RunState, StageUpdate};
use crate::types::Result;

pub struct WriterAgent {
    invoker: AgentInvoker,
}

impl WriterAgent {
    pub fn new(invoker: AgentInvoker) -> Self {
        Self { invoker }
    }

    pub fn invoker(&self) -> &AgentInvoker {
        &self.invoker
    }
}

/// Whether the report's first line is an H1 carrying the outline title
pub fn title_matches(report: &str, outline: &str) -> Option<bool> {
    let title = OutlineView::parse(outline)?.title;
    let first = report.lines().next().unwrap_or("");
    Some(first.starts_with("# ") && first[2..].trim() == title.trim())
}

#[async_trait::async_trait]
impl StageAgent for WriterAgent {
    fn stage(&self) -> Stage {
        Stage::Writer
    }

    async fn run(&self, state: &RunState) -> Result<StageUpdate> {
        let outline = state.slot(Slot::Outline);
        run_stage_agent(
            &self.invoker,
            state,
            StageAgentConfig {
                stage: Stage::Writer,
                build_prompt: Box::new(|state| {
                    prompts::writer_prompt(
                        state.request(),
                        state.slot(Slot::Outline),
                        state.slot(Slot::Research),
                        state.slot(Slot::Math),
                        state.slot(Slot::Critique),
                    )
                }),
                finish: Box::new(|raw| strip_markdown_fence(raw).trim().to_string()),
                summarize: Box::new(move |value| {
                    let title = match title_matches(value, outline) {
                        Some(true) => "title from outline",
                        Some(false) => "title differs from outline",
                        None => "no outline title",
                    };
                    format!("{} chars, {}", value.chars().count(), title)
                }),
            },
        )
        .await
    }
}
