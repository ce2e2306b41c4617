//! Run Progress Streaming
//!
//! Stage-level progress for the console. The orchestrator emits events on a
//! broadcast channel; a renderer task turns them into one line per stage.
//! Nothing here can influence the order in which stages run.

use std::sync::{Arc, RwLock};
use console::style;
use tokio::sync::broadcast;

use crate::config::RecoveryStrategy;
use crate::constants::pipeline::PROGRESS_CHANNEL_CAPACITY;
use crate::report::Stage;

/// Progress event types
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Run entered the orchestrator; `resume_from` is set when continuing a checkpoint
    RunStarted {
        run_id: String,
        resume_from: Option<Stage>,
    },
    StageStarted { stage: Stage },
    StageCompleted {
        stage: Stage,
        /// Characters written to the stage's slot
        chars: usize,
        duration_ms: u64,
    },
    StageFailed { stage: Stage, error: String },
    /// Fallback resolver is re-entering the pipeline
    Recovery { strategy: RecoveryStrategy },
    Finished {
        success: bool,
        total_duration_secs: u64,
    },
}

/// Snapshot of the run as seen through events
#[derive(Debug, Clone, Default)]
pub struct ProgressState {
    pub current: Option<Stage>,
    /// Stage completions, revisions included
    pub completed: usize,
    pub is_running: bool,
    pub last_error: Option<String>,
}

/// Broadcast progress tracker
#[derive(Clone)]
pub struct ProgressTracker {
    state: Arc<RwLock<ProgressState>>,
    sender: broadcast::Sender<ProgressEvent>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(ProgressState::default())),
            sender,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    pub fn state(&self) -> ProgressState {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Record the event and broadcast it.
    /// A send with no subscriber is not an error.
    pub fn emit(&self, event: ProgressEvent) {
        self.record(&event);
        let _ = self.sender.send(event);
    }

    fn record(&self, event: &ProgressEvent) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match event {
            ProgressEvent::RunStarted { .. } => state.is_running = true,
            ProgressEvent::StageStarted { stage } => state.current = Some(*stage),
            ProgressEvent::StageCompleted { .. } => state.completed += 1,
            ProgressEvent::StageFailed { error, .. } => state.last_error = Some(error.clone()),
            ProgressEvent::Recovery { .. } => state.is_running = true,
            ProgressEvent::Finished { .. } => {
                state.is_running = false;
                state.current = None;
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.state().is_running
    }
}

// =============================================================================
// Console Renderer
// =============================================================================

/// Prints one line per stage event
pub struct ConsoleRenderer {
    tracker: ProgressTracker,
}

impl ConsoleRenderer {
    pub fn new(tracker: ProgressTracker) -> Self {
        Self { tracker }
    }

    /// Print events until the channel closes.
    ///
    /// Subscribes before spawning so no event emitted after this call is missed.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        let mut receiver = self.tracker.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if let Some(line) = render_event(&event) {
                            println!("{}", line);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("Progress renderer skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

/// Console line for an event, if it has one
pub fn render_event(event: &ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::RunStarted {
            resume_from: Some(stage),
            run_id,
        } => Some(format!(
            "  {} Reprise de {} à l'étape {}",
            style("↻").cyan(),
            run_id,
            stage.name()
        )),
        ProgressEvent::RunStarted { .. } => None,
        ProgressEvent::StageStarted { .. } => None,
        ProgressEvent::StageCompleted { stage, chars, .. } => {
            let status = if *stage == Stage::Writer && *chars > 0 {
                "✓ Rapport généré!"
            } else {
                "✓ Terminé"
            };
            Some(format!(
                "  {} {}: {}",
                stage.emoji(),
                stage.name(),
                style(status).green()
            ))
        }
        ProgressEvent::StageFailed { stage, error } => Some(format!(
            "  {} {}: {} {}",
            stage.emoji(),
            stage.name(),
            style("✗ Échec").red(),
            style(error).dim()
        )),
        ProgressEvent::Recovery { strategy } => Some(format!(
            "\n{} (récupération: {})",
            style("Finalisation...").bold(),
            strategy
        )),
        ProgressEvent::Finished {
            total_duration_secs,
            ..
        } => Some(format!(
            "  {}",
            style(format!("Durée: {}", format_duration(*total_duration_secs))).dim()
        )),
    }
}

/// Format duration as human-readable string
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
