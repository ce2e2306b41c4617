//! Report Pipeline Orchestrator
//!
//! Drives the five stages over one [`RunState`]:
//!
//! ```text
//! Outline -> Research -> Math -> Critic -> Writer -> Done
//!               ^                  |
//!               +-- revision ------+   (only when revision_cycles > 0)
//! ```
//!
//! A stage error ends the run immediately; nothing is retried here. Each
//! completed stage is checkpointed and announced on the progress channel.

use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};

use super::agents::AgentSet;
use super::checkpoint::{Checkpointer, RunStatus, SharedCheckpointer};
use super::contract::{CritiqueView, Slot, Stage};
use super::state::RunState;
use crate::cli::{ProgressEvent, ProgressTracker};
use crate::config::PipelineConfig;
use crate::types::{RapportError, Result, RunId};

pub struct ReportPipeline {
    agents: AgentSet,
    config: PipelineConfig,
    checkpointer: Option<SharedCheckpointer>,
    progress: Option<ProgressTracker>,
}

impl ReportPipeline {
    pub fn new(agents: AgentSet, config: PipelineConfig) -> Self {
        Self {
            agents,
            config,
            checkpointer: None,
            progress: None,
        }
    }

    pub fn with_checkpointer(mut self, checkpointer: SharedCheckpointer) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fresh state for `request` under a new run identity
    pub fn start(&self, request: &str) -> RunState {
        RunState::new(RunId::generate(), request)
    }

    /// Run stages from `state.pending()` until Done.
    ///
    /// On error the state keeps every stage completed before the failure.
    #[instrument(skip(self, state), fields(run_id = %state.run_id))]
    pub async fn run(&self, state: &mut RunState) -> Result<()> {
        self.execute(state, true).await
    }

    /// Run like [`run`](Self::run) without touching the checkpoint store.
    ///
    /// Used for a throwaway state sharing the identity of a recorded run.
    pub(crate) async fn run_unrecorded(&self, state: &mut RunState) -> Result<()> {
        self.execute(state, false).await
    }

    async fn execute(&self, state: &mut RunState, record: bool) -> Result<()> {
        let started = Instant::now();
        let resume_from = (state.steps() > 0).then(|| state.pending()).flatten();
        self.emit(ProgressEvent::RunStarted {
            run_id: state.run_id.to_string(),
            resume_from,
        });
        if record {
            self.checkpoint(state, RunStatus::Running);
        }

        let result = self.drive(state, record).await;

        match &result {
            Ok(()) => {
                info!(
                    "Run {} done in {} steps ({} revisions)",
                    state.run_id,
                    state.steps(),
                    state.revisions()
                );
                if record {
                    self.checkpoint(state, RunStatus::Completed);
                }
            }
            Err(e) if record => self.record_failure(&state.run_id, e),
            Err(e) => warn!("Unrecorded run {} failed: {}", state.run_id, e),
        }

        self.emit(ProgressEvent::Finished {
            success: result.is_ok(),
            total_duration_secs: started.elapsed().as_secs(),
        });
        result
    }

    /// Checkpointed state of `run_id`
    pub fn load(&self, run_id: &RunId) -> Result<RunState> {
        let checkpointer = self.checkpointer.as_ref().ok_or_else(|| {
            RapportError::Session("Resuming requires a checkpoint store".to_string())
        })?;
        checkpointer
            .load(run_id)?
            .ok_or_else(|| RapportError::NotFound(format!("Run {}", run_id)))
    }

    /// Load a checkpointed run and continue it from its first incomplete stage
    #[instrument(skip(self))]
    pub async fn resume(&self, run_id: &RunId) -> Result<RunState> {
        let mut state = self.load(run_id)?;

        match state.pending() {
            Some(stage) => {
                info!("Resuming run {} at {}", run_id, stage.name());
                self.run(&mut state).await?;
            }
            None => info!("Run {} already completed", run_id),
        }
        Ok(state)
    }

    async fn drive(&self, state: &mut RunState, record: bool) -> Result<()> {
        let limit = self.config.step_limit();

        while let Some(stage) = state.pending() {
            if state.steps() >= limit {
                return Err(RapportError::StepLimit {
                    limit,
                    taken: state.steps(),
                });
            }

            self.emit(ProgressEvent::StageStarted { stage });
            let stage_start = Instant::now();

            let update = match self.agents.get(stage).run(state).await {
                Ok(update) => update,
                Err(e) => {
                    let error = match e.llm_category() {
                        Some(category) => format!("{} ({})", e, category.hint()),
                        None => e.to_string(),
                    };
                    self.emit(ProgressEvent::StageFailed { stage, error });
                    return Err(RapportError::stage(stage.name(), &e));
                }
            };

            let chars = update.value.chars().count();
            state.apply(update);
            self.transition(state, stage);
            if record {
                self.checkpoint(state, RunStatus::Running);
            }

            debug!("{} wrote {} chars", stage.name(), chars);
            self.emit(ProgressEvent::StageCompleted {
                stage,
                chars,
                duration_ms: stage_start.elapsed().as_millis() as u64,
            });
        }
        Ok(())
    }

    /// Choose the stage after `completed`
    fn transition(&self, state: &mut RunState, completed: Stage) {
        if completed == Stage::Critic && state.revisions() < self.config.revision_cycles {
            let critique = CritiqueView::parse(state.slot(Slot::Critique))
                .filter(CritiqueView::has_blocking);
            if let Some(critique) = critique {
                info!(
                    "Critic reported {} blocking issues, revision {}/{}",
                    critique.blocking_issues.len(),
                    state.revisions() + 1,
                    self.config.revision_cycles
                );
                state.begin_revision();
                return;
            }
        }
        state.advance(completed.next());
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(progress) = &self.progress {
            progress.emit(event);
        }
    }

    /// Checkpoint failures are logged; the run itself carries on
    pub(crate) fn checkpoint(&self, state: &RunState, status: RunStatus) {
        if let Some(checkpointer) = &self.checkpointer
            && let Err(e) = checkpointer.save(state, status)
        {
            warn!("Failed to checkpoint run {}: {}", state.run_id, e);
        }
    }

    fn record_failure(&self, run_id: &RunId, error: &RapportError) {
        warn!("Run {} failed: {}", run_id, error);
        if let Some(checkpointer) = &self.checkpointer
            && let Err(e) = checkpointer.mark_failed(run_id, &error.to_string())
        {
            error!(
                "Failed to mark run as failed: {}. Original error: {}",
                e,
                error
            );
        }
    }
}
