//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/rapporteur/) and project (.rapporteur/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{llm, pipeline, report, research, search, temperature};
use crate::types::{RapportError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Generation service settings
    pub llm: LlmConfig,

    /// Orchestrator settings
    pub pipeline: PipelineConfig,

    /// Research stage inputs
    pub research: ResearchConfig,

    /// Output locations
    pub storage: StorageConfig,

    /// Optional search tool
    pub search: SearchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            pipeline: PipelineConfig::default(),
            research: ResearchConfig::default(),
            storage: StorageConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<()> {
        if self.llm.timeout_secs == 0 {
            return Err(RapportError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.max_steps < crate::report::Stage::COUNT {
            return Err(RapportError::Config(format!(
                "pipeline.max_steps must be at least {}, got {}",
                crate::report::Stage::COUNT,
                self.pipeline.max_steps
            )));
        }

        for (stage, value) in self.pipeline.temperatures.entries() {
            if !(0.0..=2.0).contains(&value) {
                return Err(RapportError::Config(format!(
                    "Temperature for {} must be between 0.0 and 2.0, got {}",
                    stage, value
                )));
            }
        }

        if self.search.max_results == 0 {
            return Err(RapportError::Config(
                "search.max_results must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "azure" or "openai"
    pub provider: String,

    /// Model name (deployment name for Azure)
    pub model: Option<String>,

    /// Service base URL
    pub api_base: Option<String>,

    /// Azure API version
    pub api_version: Option<String>,

    /// API key; prefer the environment, never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum tokens to generate per call
    pub max_tokens: usize,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: llm::DEFAULT_PROVIDER.to_string(),
            model: None,
            api_base: None,
            api_version: None,
            api_key: None,
            timeout_secs: llm::DEFAULT_TIMEOUT_SECS,
            max_tokens: llm::DEFAULT_MAX_TOKENS,
        }
    }
}

// =============================================================================
// Pipeline Configuration
// =============================================================================

/// What the fallback resolver does when the Writer slot is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStrategy {
    /// Continue the same run from its first incomplete stage
    #[default]
    Resume,
    /// Run the whole pipeline again for the same request
    Rerun,
    /// Skip straight to the message-log scan
    None,
}

impl std::fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resume => write!(f, "resume"),
            Self::Rerun => write!(f, "rerun"),
            Self::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for RecoveryStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "resume" => Ok(Self::Resume),
            "rerun" => Ok(Self::Rerun),
            "none" => Ok(Self::None),
            _ => Err(format!(
                "Unknown recovery strategy: {}. Valid values: resume, rerun, none",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Safety bound on stage executions per run
    pub max_steps: usize,

    /// Critic-driven returns to Research allowed per run (0 = strictly linear)
    pub revision_cycles: usize,

    /// Characters of each slot given to the Critic
    pub preview_chars: usize,

    /// Recovery path used by the fallback resolver
    pub recovery: RecoveryStrategy,

    /// Per-stage sampling temperatures
    pub temperatures: StageTemperatures,
}

impl PipelineConfig {
    /// Effective step limit including revision allowance
    pub fn step_limit(&self) -> usize {
        self.max_steps + pipeline::STEPS_PER_REVISION * self.revision_cycles
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_steps: pipeline::DEFAULT_MAX_STEPS,
            revision_cycles: 0,
            preview_chars: pipeline::CRITIC_PREVIEW_CHARS,
            recovery: RecoveryStrategy::default(),
            temperatures: StageTemperatures::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTemperatures {
    pub outline: f32,
    pub research: f32,
    pub math: f32,
    pub critic: f32,
    pub writer: f32,
}

impl StageTemperatures {
    fn entries(&self) -> [(&'static str, f32); 5] {
        [
            ("outline", self.outline),
            ("research", self.research),
            ("math", self.math),
            ("critic", self.critic),
            ("writer", self.writer),
        ]
    }
}

impl Default for StageTemperatures {
    fn default() -> Self {
        Self {
            outline: temperature::OUTLINE,
            research: temperature::RESEARCH,
            math: temperature::MATH,
            critic: temperature::CRITIC,
            writer: temperature::WRITER,
        }
    }
}

// =============================================================================
// Research Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Data block given to the Research stage, preferred over model estimates
    pub data_block: String,

    /// Calculations the Math stage is asked to perform
    pub computations: Vec<String>,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            data_block: research::DEFAULT_DATA_BLOCK.to_string(),
            computations: research::DEFAULT_COMPUTATIONS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

// =============================================================================
// Storage Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Generated reports and their index
    pub reports_dir: PathBuf,

    /// Destination of `reports export`
    pub export_dir: PathBuf,

    /// Run checkpoints and project config
    pub state_dir: PathBuf,

    /// Reports kept by `reports clean`
    pub keep_last: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("reports"),
            export_dir: PathBuf::from("exports"),
            state_dir: PathBuf::from(".rapporteur"),
            keep_last: report::DEFAULT_KEEP,
        }
    }
}

// =============================================================================
// Search Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Let the Research stage consult the search tool
    pub enabled: bool,

    /// Calls allowed for the lifetime of the process
    pub call_limit: u32,

    pub max_results: usize,

    /// Summary language (accept-language header)
    pub lang: String,

    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            call_limit: search::DEFAULT_CALL_LIMIT,
            max_results: search::DEFAULT_MAX_RESULTS,
            lang: "en".to_string(),
            timeout_secs: search::DEFAULT_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.provider, "azure");
        assert_eq!(config.pipeline.max_steps, 8);
        assert_eq!(config.pipeline.revision_cycles, 0);
        assert_eq!(config.pipeline.recovery, RecoveryStrategy::Resume);
        assert_eq!(config.search.call_limit, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_temperatures() {
        let t = StageTemperatures::default();
        assert_eq!(t.outline, 0.1);
        assert_eq!(t.writer, 0.2);
        assert_eq!(t.research, 0.0);
        assert_eq!(t.math, 0.0);
        assert_eq!(t.critic, 0.0);
    }

    #[test]
    fn test_step_limit_grows_with_revisions() {
        let mut config = PipelineConfig::default();
        assert_eq!(config.step_limit(), 8);
        config.revision_cycles = 2;
        assert_eq!(config.step_limit(), 14);
    }

    #[test]
    fn test_validate_rejects_small_step_limit() {
        let mut config = Config::default();
        config.pipeline.max_steps = 4;
        assert!(matches!(config.validate(), Err(RapportError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = Config::default();
        config.pipeline.temperatures.writer = 3.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("writer"));
    }

    #[test]
    fn test_recovery_strategy_parse() {
        assert_eq!(
            "rerun".parse::<RecoveryStrategy>().unwrap(),
            RecoveryStrategy::Rerun
        );
        assert_eq!(RecoveryStrategy::Resume.to_string(), "resume");
        assert!("retry".parse::<RecoveryStrategy>().is_err());
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = Config::default();
        config.llm.api_key = Some("secret".to_string());
        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("secret"));
        assert!(format!("{:?}", config.llm).contains("[REDACTED]"));
    }

    #[test]
    fn test_default_research_block() {
        let config = ResearchConfig::default();
        assert!(config.data_block.contains("PIB New York: 2,200 milliards USD"));
        assert_eq!(config.computations.len(), 5);
    }
}
