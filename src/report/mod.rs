//! Report Generation Pipeline
//!
//! Five stages run in a fixed order over one shared [`RunState`]:
//!
//! | Stage | Reads | Writes |
//! |-------|-------|--------|
//! | Outline | request | `outline` |
//! | Research | `outline` (+ critique on revision) | `research` |
//! | Math | `research` | `math` |
//! | Critic | previews of `outline`, `research`, `math` | `critique` |
//! | Writer | request + all four slots | `final_report` |
//!
//! [`ReportPipeline`] sequences them, [`FallbackResolver`] picks the final
//! text, and a [`Checkpointer`] makes failed runs resumable.

pub mod agents;
pub mod checkpoint;
pub mod contract;
pub mod fallback;
pub mod pipeline;
pub mod prompts;
pub mod state;

pub use agents::{AgentInvoker, AgentSet, StageAgent};
pub use checkpoint::{
    Checkpointer, MemoryCheckpointer, RunStatus, RunSummary, SharedCheckpointer,
    SqliteCheckpointer,
};
pub use contract::{CritiqueView, MathView, OutlineView, Slot, Stage, StageDescriptor};
pub use fallback::{FallbackResolver, ReportSource, ResolvedReport, strip_markdown_fence};
pub use pipeline::ReportPipeline;
pub use state::{RunState, StageRecord, StageUpdate};
