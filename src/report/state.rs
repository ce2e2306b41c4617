//! Run State
//!
//! The unit of work threaded through one pipeline execution: an append-only
//! message log, the five named slots, and the orchestrator's bookkeeping.
//! Stages never mutate it directly. They return a [`StageUpdate`] which the
//! orchestrator applies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::contract::{Slot, Stage};
use crate::types::{Message, Origin, RunId};

// =============================================================================
// Slots
// =============================================================================

/// One optional string per stage output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slots {
    outline: Option<String>,
    research: Option<String>,
    math: Option<String>,
    critique: Option<String>,
    final_report: Option<String>,
}

impl Slots {
    fn field(&self, slot: Slot) -> &Option<String> {
        match slot {
            Slot::Outline => &self.outline,
            Slot::Research => &self.research,
            Slot::Math => &self.math,
            Slot::Critique => &self.critique,
            Slot::FinalReport => &self.final_report,
        }
    }

    fn field_mut(&mut self, slot: Slot) -> &mut Option<String> {
        match slot {
            Slot::Outline => &mut self.outline,
            Slot::Research => &mut self.research,
            Slot::Math => &mut self.math,
            Slot::Critique => &mut self.critique,
            Slot::FinalReport => &mut self.final_report,
        }
    }

    /// Slot text, empty when the owning stage has not completed
    pub fn get(&self, slot: Slot) -> &str {
        self.field(slot).as_deref().unwrap_or("")
    }

    /// Whether the slot holds non-blank text
    pub fn is_filled(&self, slot: Slot) -> bool {
        !self.get(slot).trim().is_empty()
    }

    /// Written slots keep a value; a revision may replace it but never clears it
    fn write(&mut self, slot: Slot, value: String) {
        *self.field_mut(slot) = Some(value);
    }
}

// =============================================================================
// Stage Update
// =============================================================================

/// Partial state produced by one stage execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageUpdate {
    pub stage: Stage,
    /// Messages to append, in causal order (prompt then reply)
    pub messages: Vec<Message>,
    /// Value for the stage's output slot
    pub value: String,
}

/// Completed stage execution, kept for the run summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    /// Characters written to the slot
    pub chars: usize,
    pub completed_at: DateTime<Utc>,
}

// =============================================================================
// Run State
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: RunId,
    messages: Vec<Message>,
    slots: Slots,
    /// Next stage to execute; `None` once Writer has completed
    pending: Option<Stage>,
    trail: Vec<StageRecord>,
    /// Critic-driven returns to Research taken so far
    revisions: usize,
    /// Stage executions taken so far
    steps: usize,
    pub started_at: DateTime<Utc>,
}

impl RunState {
    /// Fresh state holding only the user's request
    pub fn new(run_id: RunId, request: impl Into<String>) -> Self {
        Self {
            run_id,
            messages: vec![Message::user(request)],
            slots: Slots::default(),
            pending: Some(Stage::Outline),
            trail: Vec::new(),
            revisions: 0,
            steps: 0,
            started_at: Utc::now(),
        }
    }

    /// Text of the first user-authored message
    pub fn request(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.origin == Origin::User)
            .map(|m| m.text.as_str())
            .unwrap_or("")
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn slot(&self, slot: Slot) -> &str {
        self.slots.get(slot)
    }

    pub fn pending(&self) -> Option<Stage> {
        self.pending
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_none()
    }

    pub fn trail(&self) -> &[StageRecord] {
        &self.trail
    }

    pub fn revisions(&self) -> usize {
        self.revisions
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Append the stage's messages and write its slot
    pub fn apply(&mut self, update: StageUpdate) {
        let slot = update.stage.descriptor().writes;
        self.trail.push(StageRecord {
            stage: update.stage,
            chars: update.value.chars().count(),
            completed_at: Utc::now(),
        });
        self.messages.extend(update.messages);
        self.slots.write(slot, update.value);
        self.steps += 1;
    }

    /// Move to the given stage (or to Done with `None`)
    pub(crate) fn advance(&mut self, next: Option<Stage>) {
        self.pending = next;
    }

    /// Return to Research for another revision cycle
    pub(crate) fn begin_revision(&mut self) {
        self.revisions += 1;
        self.pending = Some(Stage::Research);
    }

    /// Reopen the Writer stage of a finished run that produced nothing usable
    pub(crate) fn reopen_writer(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(Stage::Writer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(stage: Stage, value: &str) -> StageUpdate {
        StageUpdate {
            stage,
            messages: vec![Message::user(format!("{} prompt", stage)), Message::model(value)],
            value: value.to_string(),
        }
    }

    #[test]
    fn test_new_state_holds_only_request() {
        let state = RunState::new(RunId::new("cli-1"), "Rédige un rapport sur X");
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.request(), "Rédige un rapport sur X");
        assert_eq!(state.pending(), Some(Stage::Outline));
        for slot in Slot::ALL {
            assert_eq!(state.slot(slot), "");
            assert!(!state.slots().is_filled(slot));
        }
    }

    #[test]
    fn test_apply_appends_and_writes() {
        let mut state = RunState::new(RunId::new("cli-1"), "req");
        state.apply(update(Stage::Outline, "{\"title\": \"T\"}"));

        assert_eq!(state.slot(Slot::Outline), "{\"title\": \"T\"}");
        assert_eq!(state.messages().len(), 3);
        assert_eq!(state.messages()[0].text, "req");
        assert_eq!(state.messages()[2].origin, Origin::Model);
        assert_eq!(state.steps(), 1);
        assert_eq!(state.trail()[0].chars, 14);
    }

    #[test]
    fn test_request_ignores_later_user_messages() {
        let mut state = RunState::new(RunId::new("cli-1"), "first");
        state.apply(update(Stage::Outline, "x"));
        assert_eq!(state.request(), "first");
    }

    #[test]
    fn test_revision_replaces_without_clearing() {
        let mut state = RunState::new(RunId::new("cli-1"), "req");
        state.apply(update(Stage::Research, "v1"));
        state.begin_revision();
        assert_eq!(state.slot(Slot::Research), "v1");
        state.apply(update(Stage::Research, "v2"));
        assert_eq!(state.slot(Slot::Research), "v2");
        assert_eq!(state.revisions(), 1);
        assert_eq!(state.pending(), Some(Stage::Research));
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let mut state = RunState::new(RunId::new("cli-1"), "req");
        state.apply(update(Stage::Outline, "o"));
        state.advance(Some(Stage::Research));

        let json = serde_json::to_string(&state).unwrap();
        let restored: RunState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }
}
