//! Stage Contract
//!
//! Static description of the five stages: the slots each one reads, the slot
//! it writes and the instruction that heads its history. Also the lenient
//! structured views of slot payloads. Payloads themselves stay raw strings;
//! the views are best-effort and a parse failure is `None`, never an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::prompts;
use crate::ai::JsonRepairer;
use crate::types::{json_string, json_string_array};

// =============================================================================
// Stage
// =============================================================================

/// Pipeline stage, numbered in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Outline = 1,
    Research = 2,
    Math = 3,
    Critic = 4,
    Writer = 5,
}

impl Stage {
    /// Total number of stages
    pub const COUNT: usize = 5;

    pub const ALL: [Stage; Stage::COUNT] = [
        Stage::Outline,
        Stage::Research,
        Stage::Math,
        Stage::Critic,
        Stage::Writer,
    ];

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Outline),
            2 => Some(Self::Research),
            3 => Some(Self::Math),
            4 => Some(Self::Critic),
            5 => Some(Self::Writer),
            _ => None,
        }
    }

    /// Stable lowercase identifier used in logs and checkpoints
    pub fn id(&self) -> &'static str {
        match self {
            Self::Outline => "outline",
            Self::Research => "research",
            Self::Math => "math",
            Self::Critic => "critic",
            Self::Writer => "writer",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Outline => "Outline",
            Self::Research => "Research",
            Self::Math => "Math",
            Self::Critic => "Critic",
            Self::Writer => "Writer",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Outline => "📝",
            Self::Research => "🔍",
            Self::Math => "🧮",
            Self::Critic => "✅",
            Self::Writer => "✍️",
        }
    }

    /// Unconditional successor; `None` after Writer
    pub fn next(&self) -> Option<Self> {
        Self::from_u8(self.as_u8() + 1)
    }

    pub fn descriptor(&self) -> &'static StageDescriptor {
        &DESCRIPTORS[(self.as_u8() - 1) as usize]
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

// =============================================================================
// Slot
// =============================================================================

/// Named output slot of the run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Outline,
    Research,
    Math,
    Critique,
    FinalReport,
}

impl Slot {
    pub const ALL: [Slot; 5] = [
        Slot::Outline,
        Slot::Research,
        Slot::Math,
        Slot::Critique,
        Slot::FinalReport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outline => "outline",
            Self::Research => "research",
            Self::Math => "math",
            Self::Critique => "critique",
            Self::FinalReport => "final_report",
        }
    }

    /// Stage that owns this slot
    pub fn owner(&self) -> Stage {
        match self {
            Self::Outline => Stage::Outline,
            Self::Research => Stage::Research,
            Self::Math => Stage::Math,
            Self::Critique => Stage::Critic,
            Self::FinalReport => Stage::Writer,
        }
    }
}

// =============================================================================
// Stage Descriptors
// =============================================================================

/// Fixed metadata for one stage
#[derive(Debug)]
pub struct StageDescriptor {
    pub stage: Stage,
    /// Slots consulted when building the prompt
    pub reads: &'static [Slot],
    pub writes: Slot,
    /// Instruction placed at the head of every history sent for this stage
    pub system_instruction: &'static str,
}

static DESCRIPTORS: [StageDescriptor; Stage::COUNT] = [
    StageDescriptor {
        stage: Stage::Outline,
        reads: &[],
        writes: Slot::Outline,
        system_instruction: prompts::OUTLINE_SYSTEM,
    },
    StageDescriptor {
        stage: Stage::Research,
        reads: &[Slot::Outline],
        writes: Slot::Research,
        system_instruction: prompts::RESEARCH_SYSTEM,
    },
    StageDescriptor {
        stage: Stage::Math,
        reads: &[Slot::Research],
        writes: Slot::Math,
        system_instruction: prompts::MATH_SYSTEM,
    },
    StageDescriptor {
        stage: Stage::Critic,
        reads: &[Slot::Outline, Slot::Research, Slot::Math],
        writes: Slot::Critique,
        system_instruction: prompts::CRITIC_SYSTEM,
    },
    StageDescriptor {
        stage: Stage::Writer,
        reads: &[Slot::Outline, Slot::Research, Slot::Math, Slot::Critique],
        writes: Slot::FinalReport,
        system_instruction: prompts::WRITER_SYSTEM,
    },
];

// =============================================================================
// Lenient Views
// =============================================================================

fn parse_object(raw: &str) -> Option<Value> {
    JsonRepairer::new()
        .try_parse(raw)
        .map(|(value, _)| value)
        .filter(Value::is_object)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineSection {
    pub h2: String,
    pub h3: Vec<String>,
}

/// Title and section tree proposed by the Outline stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineView {
    pub title: String,
    pub sections: Vec<OutlineSection>,
}

impl OutlineView {
    pub fn parse(raw: &str) -> Option<Self> {
        let value = parse_object(raw)?;
        let title = json_string(&value, "title")?;
        let sections = value
            .get("sections")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|s| {
                        Some(OutlineSection {
                            h2: json_string(s, "h2")?,
                            h3: json_string_array(s, "h3"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(Self { title, sections })
    }
}

/// Critic output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CritiqueView {
    pub blocking_issues: Vec<String>,
    pub warnings: Vec<String>,
    pub suggested_fixes: Vec<String>,
}

impl CritiqueView {
    pub fn parse(raw: &str) -> Option<Self> {
        let value = parse_object(raw)?;
        Some(Self {
            blocking_issues: json_string_array(&value, "blocking_issues"),
            warnings: json_string_array(&value, "warnings"),
            suggested_fixes: json_string_array(&value, "suggested_fixes"),
        })
    }

    pub fn has_blocking(&self) -> bool {
        !self.blocking_issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Computation {
    pub label: String,
    pub formula: String,
    pub result: String,
}

/// Math output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MathView {
    pub computations: Vec<Computation>,
    pub notes: Vec<String>,
}

impl MathView {
    pub fn parse(raw: &str) -> Option<Self> {
        let value = parse_object(raw)?;
        let computations = value
            .get("computations")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .map(|c| Computation {
                        label: json_string(c, "label").unwrap_or_default(),
                        formula: json_string(c, "formula").unwrap_or_default(),
                        result: scalar_text(c.get("result")),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            computations,
            notes: json_string_array(&value, "notes"),
        })
    }
}

/// Results are asked for as strings but often come back as numbers
fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
