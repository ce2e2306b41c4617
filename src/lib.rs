//! Rapporteur - Multi-Agent French Report Generator
//!
//! Turns a free-form request into a structured French Markdown report by
//! running five chat-completion stages in a fixed order, each reading what
//! the previous ones left in a shared run state.
//!
//! ## Core Features
//!
//! - **Staged Pipeline**: Outline → Research → Math → Critic → Writer
//! - **Checkpoint/Resume**: every transition is persisted; failed runs resume
//!   from their first incomplete stage
//! - **Fallback Resolution**: a report is recovered even when the Writer
//!   stage never completed
//! - **Report Archive**: timestamped Markdown files with a JSON index
//!
//! ## Quick Start
//!
//! ```ignore
//! use rapporteur::ai::{ProviderConfig, create_provider};
//! use rapporteur::config::Config;
//! use rapporteur::report::{AgentSet, FallbackResolver, ReportPipeline};
//!
//! let config = Config::default();
//! let provider = create_provider(&ProviderConfig::from_llm(&config.llm))?;
//! let pipeline = ReportPipeline::new(
//!     AgentSet::new(provider, &config, None),
//!     config.pipeline.clone(),
//! );
//! let mut state = pipeline.start("Rédige un rapport sur le PIB de New York");
//! let _ = pipeline.run(&mut state).await;
//! let report = FallbackResolver::new(&pipeline, config.pipeline.recovery)
//!     .resolve(&mut state)
//!     .await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: generation providers and lenient output parsing
//! - [`report`]: run state, stage agents, orchestrator, fallback resolver
//! - [`storage`]: SQLite checkpoints, report files and their index
//! - [`tools`]: arithmetic helpers and the budgeted encyclopedia search
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod report;
pub mod storage;
pub mod tools;
pub mod types;

pub use types::{RapportError, Result, RunId};
