pub mod error;
pub mod message;
pub mod utils;

pub use error::{ErrorCategory, ErrorClassifier, LlmError, RapportError, Result, ResultExt};
pub use message::{Message, Origin, normalize_content};
pub use utils::{capitalize_first, json_string, json_string_array, truncate_chars};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type-safe wrapper for run identities
///
/// Opaque to every stage; only the orchestrator and the checkpoint store look at it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Fresh identity in the `cli-<uuid>` form
    pub fn generate() -> Self {
        Self(format!("cli-{}", uuid::Uuid::new_v4()))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod newtype_tests {
    use super::*;

    #[test]
    fn test_run_id_format() {
        let id = RunId::generate();
        assert!(id.as_str().starts_with("cli-"));
        assert_eq!(id.as_str().len(), "cli-".len() + 36);
        assert_ne!(id, RunId::generate());
    }

    #[test]
    fn test_run_id_display() {
        let id = RunId::new("cli-123");
        assert_eq!(format!("{}", id), "cli-123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"cli-123\"");
    }
}
