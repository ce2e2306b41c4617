//! Message Log Entries
//!
//! A [`Message`] is one entry of the run's shared log. Generation results can
//! arrive with their content either as a plain string or as a list of
//! structured fragments; [`normalize_content`] is the only place that knows
//! about those shapes. Everything downstream sees a flat `text`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Model,
    System,
}

impl Origin {
    /// Chat-completion wire role
    pub fn as_role(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "assistant",
            Self::System => "system",
        }
    }

    /// Parse a wire role, accepting the common aliases
    pub fn from_role(role: &str) -> Option<Self> {
        match role.to_lowercase().as_str() {
            "user" | "human" => Some(Self::User),
            "assistant" | "ai" | "model" => Some(Self::Model),
            "system" | "developer" => Some(Self::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Model => write!(f, "model"),
            Self::System => write!(f, "system"),
        }
    }
}

/// One immutable entry of the message log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub origin: Origin,
    pub text: String,
}

impl Message {
    pub fn new(origin: Origin, text: impl Into<String>) -> Self {
        Self {
            origin,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Origin::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Origin::Model, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Origin::System, text)
    }

    /// Build a message from a wire role and raw content value
    pub fn from_wire(role: &str, content: &Value) -> Self {
        Self {
            origin: Origin::from_role(role).unwrap_or(Origin::Model),
            text: normalize_content(content),
        }
    }

    /// Model-authored text whose trimmed form starts with a heading marker
    pub fn looks_like_report(&self) -> bool {
        self.origin == Origin::Model && self.text.trim_start().starts_with('#')
    }
}

/// Collapse a wire content value into a single string.
///
/// Strings pass through. Fragment arrays are joined with a single space, each
/// fragment contributing its `text` field, else its `content` field, else its
/// JSON rendering. `null` becomes the empty string.
pub fn normalize_content(content: &Value) -> String {
    match content {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(fragments) => fragments
            .iter()
            .map(fragment_text)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

fn fragment_text(fragment: &Value) -> String {
    match fragment {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["text", "content"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(String::from)
            .unwrap_or_else(|| fragment.to_string()),
        other => other.to_string(),
    }
}
