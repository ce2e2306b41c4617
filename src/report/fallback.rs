//! Extraction / Fallback Resolver
//!
//! Picks the report text once the orchestrator has stopped, in strict order:
//! 1. the Writer's `final_report` slot, returned as is
//! 2. a recovery pass through the pipeline (resume or full rerun)
//! 3. the most recent model message that starts with a heading marker
//!
//! When all three come up empty the run produced no report.

use tracing::{info, warn};

use super::checkpoint::RunStatus;
use super::contract::Slot;
use super::pipeline::ReportPipeline;
use super::state::RunState;
use crate::cli::ProgressEvent;
use crate::config::RecoveryStrategy;
use crate::types::{RapportError, Result};

/// Remove a Markdown code fence wrapping the whole text.
///
/// Text that does not open with a fence is returned unchanged, and so is
/// text whose body opens with another fence.
pub fn strip_markdown_fence(text: &str) -> &str {
    let trimmed = text.trim_start();
    if !trimmed.starts_with("```") {
        return text;
    }

    // Drop the opening fence line, including any info string
    let body = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return "",
    };
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body).trim();

    // Only one outer layer is ever removed
    if body.starts_with("```") {
        return text;
    }
    body
}

/// Where the resolved text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSource {
    /// Writer completed normally
    Writer,
    /// Writer completed during the recovery pass
    Recovered,
    /// Best-effort text found in the message log
    MessageLog,
}

impl ReportSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Writer => "writer",
            Self::Recovered => "recovered",
            Self::MessageLog => "message_log",
        }
    }

    /// Whether the text is the Writer's structured output
    pub fn is_complete(&self) -> bool {
        !matches!(self, Self::MessageLog)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReport {
    pub text: String,
    pub source: ReportSource,
}

pub struct FallbackResolver<'a> {
    pipeline: &'a ReportPipeline,
    strategy: RecoveryStrategy,
}

impl<'a> FallbackResolver<'a> {
    pub fn new(pipeline: &'a ReportPipeline, strategy: RecoveryStrategy) -> Self {
        Self { pipeline, strategy }
    }

    pub async fn resolve(&self, state: &mut RunState) -> Result<ResolvedReport> {
        if let Some(text) = final_report(state) {
            return Ok(ResolvedReport {
                text,
                source: ReportSource::Writer,
            });
        }

        if let Some(text) = self.recover(state).await {
            return Ok(ResolvedReport {
                text,
                source: ReportSource::Recovered,
            });
        }

        match scan_message_log(state) {
            Some(text) => {
                info!("Using report found in the message log");
                Ok(ResolvedReport {
                    text,
                    source: ReportSource::MessageLog,
                })
            }
            None => Err(RapportError::NoReport),
        }
    }

    async fn recover(&self, state: &mut RunState) -> Option<String> {
        if self.strategy == RecoveryStrategy::None {
            return None;
        }
        self.pipeline.emit(ProgressEvent::Recovery {
            strategy: self.strategy,
        });

        match self.strategy {
            RecoveryStrategy::Resume => {
                state.reopen_writer();
                if let Err(e) = self.pipeline.run(state).await {
                    warn!("Recovery by resume failed: {}", e);
                }
                final_report(state)
            }
            RecoveryStrategy::Rerun => {
                // The recorded run stays untouched until the rerun has a report
                let mut fresh = RunState::new(state.run_id.clone(), state.request());
                if let Err(e) = self.pipeline.run_unrecorded(&mut fresh).await {
                    warn!("Recovery by rerun failed: {}", e);
                }
                let text = final_report(&fresh)?;
                self.pipeline.checkpoint(&fresh, RunStatus::Completed);
                *state = fresh;
                Some(text)
            }
            RecoveryStrategy::None => None,
        }
    }
}

fn final_report(state: &RunState) -> Option<String> {
    state
        .slots()
        .is_filled(Slot::FinalReport)
        .then(|| state.slot(Slot::FinalReport).to_string())
}

/// Latest model message whose trimmed text opens with `#`
fn scan_message_log(state: &RunState) -> Option<String> {
    state
        .messages()
        .iter()
        .rev()
        .find(|m| m.looks_like_report())
        .map(|m| m.text.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::MockProvider;
    use crate::config::Config;
    use crate::report::checkpoint::MemoryCheckpointer;
    use crate::report::contract::Stage;
    use crate::report::pipeline::tests::{
        CRITIQUE_OK, MATH, OUTLINE, REPORT, RESEARCH, pipeline_with,
    };
    use crate::report::state::StageUpdate;
    use crate::types::{Message, RunId};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn idle_pipeline() -> (Arc<MockProvider>, ReportPipeline) {
        let provider = Arc::new(MockProvider::scripted(&[]));
        let pipeline = pipeline_with(provider.clone(), &Config::default());
        (provider, pipeline)
    }

    fn state_with_log(messages: Vec<Message>) -> RunState {
        let mut state = RunState::new(RunId::new("cli-f"), "req");
        state.apply(StageUpdate {
            stage: Stage::Outline,
            messages,
            value: "{}".to_string(),
        });
        state
    }

    // =========================================================================
    // Fence stripping
    // =========================================================================

    #[test]
    fn test_strip_fence_exact() {
        assert_eq!(
            strip_markdown_fence("```markdown\n# T\n...\n```"),
            "# T\n..."
        );
        assert_eq!(strip_markdown_fence("```\n# T\n```\n"), "# T");
        assert_eq!(strip_markdown_fence("  ```md\n# T\n\nbody\n```  "), "# T\n\nbody");
    }

    #[test]
    fn test_strip_fence_passthrough() {
        assert_eq!(strip_markdown_fence("# T\n\nbody\n"), "# T\n\nbody\n");
        assert_eq!(strip_markdown_fence("text with ``` inside"), "text with ``` inside");
        assert_eq!(strip_markdown_fence(""), "");
    }

    #[test]
    fn test_strip_fence_nested_left_alone() {
        let nested = "```markdown\n```\n# T\n```\n```";
        let once = strip_markdown_fence(nested);
        assert_eq!(once, nested);
        assert_eq!(strip_markdown_fence(once), once);
    }

    #[test]
    fn test_strip_fence_without_closing() {
        assert_eq!(strip_markdown_fence("```markdown\n# T\nbody"), "# T\nbody");
        assert_eq!(strip_markdown_fence("```"), "");
    }

    proptest! {
        #[test]
        fn prop_strip_fence_idempotent(body in "[#a-zA-Z0-9 \n`]{0,200}", lang in "(markdown|md|)") {
            let fenced = format!("```{}\n{}\n```", lang, body);
            let once = strip_markdown_fence(&fenced);
            prop_assert_eq!(strip_markdown_fence(once), once);
        }

        #[test]
        fn prop_strip_any_text_idempotent(text in "[#a-z \n`]{0,120}") {
            let once = strip_markdown_fence(&text);
            prop_assert_eq!(strip_markdown_fence(once), once);
        }

        #[test]
        fn prop_unfenced_passthrough(text in "[#a-zA-Z0-9 \n`]{0,200}") {
            prop_assume!(!text.trim_start().starts_with("```"));
            prop_assert_eq!(strip_markdown_fence(&text), text.as_str());
        }
    }

    // =========================================================================
    // Resolver tiers
    // =========================================================================

    #[tokio::test]
    async fn test_final_report_returned_unmodified() {
        let (provider, pipeline) = idle_pipeline();
        let mut state = state_with_log(vec![Message::model("## Ignored")]);
        state.apply(StageUpdate {
            stage: Stage::Writer,
            messages: vec![],
            value: "# Titre\n\ncorps  \n".to_string(),
        });

        let resolved = FallbackResolver::new(&pipeline, RecoveryStrategy::Resume)
            .resolve(&mut state)
            .await
            .unwrap();
        assert_eq!(resolved.text, "# Titre\n\ncorps  \n");
        assert_eq!(resolved.source, ReportSource::Writer);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_message_log_fallback() {
        let (_, pipeline) = idle_pipeline();
        let mut state = RunState::new(RunId::new("cli-f"), "req");
        state.apply(StageUpdate {
            stage: Stage::Outline,
            messages: vec![Message::model("## Not a report")],
            value: String::new(),
        });

        let resolved = FallbackResolver::new(&pipeline, RecoveryStrategy::None)
            .resolve(&mut state)
            .await
            .unwrap();
        assert_eq!(resolved.text, "## Not a report");
        assert_eq!(resolved.source, ReportSource::MessageLog);
        assert!(!resolved.source.is_complete());
    }

    #[tokio::test]
    async fn test_message_log_prefers_latest_model_message() {
        let (_, pipeline) = idle_pipeline();
        let mut state = state_with_log(vec![
            Message::model("# First"),
            Message::model("  # Second\n"),
            Message::user("# From user"),
            Message::model("plain text"),
        ]);

        let resolved = FallbackResolver::new(&pipeline, RecoveryStrategy::None)
            .resolve(&mut state)
            .await
            .unwrap();
        assert_eq!(resolved.text, "  # Second\n");
    }

    #[tokio::test]
    async fn test_nothing_found_is_no_report() {
        let (_, pipeline) = idle_pipeline();
        let mut state = state_with_log(vec![Message::model("{\"title\": \"x\"}")]);
        let err = FallbackResolver::new(&pipeline, RecoveryStrategy::None)
            .resolve(&mut state)
            .await
            .unwrap_err();
        assert!(matches!(err, RapportError::NoReport));
    }

    #[tokio::test]
    async fn test_failed_recovery_falls_through_to_log() {
        // Provider has no replies left: the resume attempt fails
        let (provider, pipeline) = idle_pipeline();
        let mut state = state_with_log(vec![Message::model("# Brouillon")]);
        state.advance(Some(Stage::Research));

        let resolved = FallbackResolver::new(&pipeline, RecoveryStrategy::Resume)
            .resolve(&mut state)
            .await
            .unwrap();
        assert_eq!(resolved.text, "# Brouillon");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_resume_recovery_skips_completed_stages() {
        let provider = Arc::new(MockProvider::failing_at(
            &[OUTLINE, RESEARCH, MATH, CRITIQUE_OK, REPORT],
            4,
        ));
        let pipeline = pipeline_with(provider.clone(), &Config::default());
        let mut state = pipeline.start("req");
        assert!(pipeline.run(&mut state).await.is_err());

        let resolved = FallbackResolver::new(&pipeline, RecoveryStrategy::Resume)
            .resolve(&mut state)
            .await
            .unwrap();
        assert_eq!(resolved.source, ReportSource::Recovered);
        assert!(resolved.text.starts_with("# PIB de New York"));
        // Only the Writer ran again
        assert_eq!(provider.call_count(), 6);
    }

    #[tokio::test]
    async fn test_resume_reopens_finished_writer_with_empty_report() {
        let provider = Arc::new(MockProvider::scripted(&[
            OUTLINE,
            RESEARCH,
            MATH,
            CRITIQUE_OK,
            "   ",
            "# Second essai",
        ]));
        let mut config = Config::default();
        config.pipeline.max_steps = 6;
        let pipeline = pipeline_with(provider.clone(), &config);
        let mut state = pipeline.start("req");
        pipeline.run(&mut state).await.unwrap();
        assert!(state.is_done());

        let resolved = FallbackResolver::new(&pipeline, RecoveryStrategy::Resume)
            .resolve(&mut state)
            .await
            .unwrap();
        assert_eq!(resolved.text, "# Second essai");
        assert_eq!(resolved.source, ReportSource::Recovered);
    }

    #[tokio::test]
    async fn test_rerun_recovery_starts_over() {
        let provider = Arc::new(MockProvider::with_responder(|index, _| {
            (index != 1).then(|| "# Rapport\n\ntexte".to_string())
        }));
        let pipeline = pipeline_with(provider.clone(), &Config::default());
        let mut state = pipeline.start("req");
        assert!(pipeline.run(&mut state).await.is_err());

        let resolved = FallbackResolver::new(&pipeline, RecoveryStrategy::Rerun)
            .resolve(&mut state)
            .await
            .unwrap();
        assert_eq!(resolved.source, ReportSource::Recovered);
        // 1 ok + 1 failed, then all five again
        assert_eq!(provider.call_count(), 7);
        assert_eq!(state.steps(), 5);
        assert_eq!(state.request(), "req");
    }

    #[tokio::test]
    async fn test_failed_rerun_keeps_recorded_checkpoint() {
        // Research fails in both the first run (call 1) and the rerun (call 3)
        let provider = Arc::new(MockProvider::with_responder(|index, _| {
            (index != 1 && index != 3).then(|| "{}".to_string())
        }));
        let checkpointer = Arc::new(MemoryCheckpointer::new());
        let pipeline = pipeline_with(provider.clone(), &Config::default())
            .with_checkpointer(checkpointer.clone());
        let mut state = pipeline.start("req");
        assert!(pipeline.run(&mut state).await.is_err());

        let result = FallbackResolver::new(&pipeline, RecoveryStrategy::Rerun)
            .resolve(&mut state)
            .await;
        assert!(matches!(result, Err(RapportError::NoReport)));

        let recorded = pipeline.load(&state.run_id).unwrap();
        assert_eq!(recorded, state);
        assert_eq!(recorded.pending(), Some(Stage::Research));
        assert!(recorded.slots().is_filled(Slot::Outline));
        assert_eq!(
            checkpointer.status(&state.run_id),
            Some(RunStatus::Failed)
        );
    }

    #[tokio::test]
    async fn test_successful_rerun_is_recorded_completed() {
        let provider = Arc::new(MockProvider::with_responder(|index, _| {
            (index != 1).then(|| "# Rapport\n\ntexte".to_string())
        }));
        let checkpointer = Arc::new(MemoryCheckpointer::new());
        let pipeline = pipeline_with(provider.clone(), &Config::default())
            .with_checkpointer(checkpointer.clone());
        let mut state = pipeline.start("req");
        assert!(pipeline.run(&mut state).await.is_err());

        FallbackResolver::new(&pipeline, RecoveryStrategy::Rerun)
            .resolve(&mut state)
            .await
            .unwrap();

        let recorded = pipeline.load(&state.run_id).unwrap();
        assert!(recorded.is_done());
        assert_eq!(recorded.steps(), 5);
        assert_eq!(
            checkpointer.status(&state.run_id),
            Some(RunStatus::Completed)
        );
    }
}
