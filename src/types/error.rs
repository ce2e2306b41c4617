//! Unified Error Type System
//!
//! Centralized error types for the whole report pipeline.
//!
//! ## Error Categories
//!
//! Generation-call failures carry an [`ErrorCategory`] so the CLI can tell the
//! user whether the credentials, the network or the service is at fault.
//! Nothing in the pipeline retries on the category: a failed call stops the run.

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Categories of generation-call failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Too many requests for the deployment
    RateLimit,
    /// Credentials rejected
    Auth,
    /// Connectivity or deadline issues
    Network,
    /// Deployment or endpoint not found
    Unavailable,
    /// Request rejected as malformed (includes content filtering)
    BadRequest,
    /// Response body could not be decoded
    ParseError,
    /// Server-side failure
    Transient,
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Short French hint shown under a failed run
    pub fn hint(&self) -> &'static str {
        match self {
            Self::RateLimit => "Quota atteint, réessayez plus tard.",
            Self::Auth => "Vérifiez la clé API et les droits sur le déploiement.",
            Self::Network => "Vérifiez la connexion réseau et l'URL du service.",
            Self::Unavailable => "Vérifiez le nom du déploiement et la version d'API.",
            Self::BadRequest => "La requête a été refusée par le service.",
            Self::ParseError => "La réponse du service est illisible.",
            Self::Transient => "Le service a rencontré une erreur interne.",
            Self::Unknown => "Consultez les journaux pour plus de détails.",
        }
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Generation-call error with category and provider context
#[derive(Debug, Clone)]
pub struct LlmError {
    pub category: ErrorCategory,
    pub message: String,
    pub provider: Option<String>,
    pub status: Option<u16>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.provider, self.status) {
            (Some(provider), Some(status)) => write!(
                f,
                "[{}:{}] HTTP {}: {}",
                provider, self.category, status, self.message
            ),
            (Some(provider), None) => {
                write!(f, "[{}:{}] {}", provider, self.category, self.message)
            }
            (None, _) => write!(f, "[{}] {}", self.category, self.message),
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            status: None,
        }
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps transport failures and HTTP statuses to categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a transport-level failure from its message
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        let category = if lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("unreachable")
        {
            ErrorCategory::Network
        } else if lower.contains("decod") || lower.contains("json") || lower.contains("parse") {
            ErrorCategory::ParseError
        } else if lower.contains("unauthorized") || lower.contains("api key") {
            ErrorCategory::Auth
        } else {
            ErrorCategory::Unknown
        };

        LlmError::new(category, message).provider(provider)
    }

    /// Classify an HTTP status returned by the chat-completion endpoint
    pub fn classify_http_status(status: u16, body: &str, provider: &str) -> LlmError {
        let category = match status {
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            400 | 422 => ErrorCategory::BadRequest,
            404 => ErrorCategory::Unavailable,
            500..=599 => ErrorCategory::Transient,
            _ => ErrorCategory::Unknown,
        };

        LlmError::new(category, body).provider(provider).status(status)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum RapportError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Generation Errors
    // -------------------------------------------------------------------------
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("LLM API error: {0}")]
    LlmApi(String),

    // -------------------------------------------------------------------------
    // Pipeline Errors
    // -------------------------------------------------------------------------
    /// A stage function failed; the run stops here
    #[error("Stage {stage} failed: {message}")]
    Stage { stage: String, message: String },

    /// The orchestrator took more steps than allowed
    #[error("Step limit reached: {taken} steps taken, limit is {limit}")]
    StepLimit { limit: usize, taken: usize },

    #[error("No report could be produced")]
    NoReport,

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    Validation(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, RapportError>;

impl RapportError {
    /// Wrap a failure raised while a stage was executing
    pub fn stage(stage: impl Into<String>, source: &RapportError) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: source.to_string(),
        }
    }

    /// Category of the underlying generation failure, if any
    pub fn llm_category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Llm(e) => Some(e.category),
            _ => None,
        }
    }

    /// Configuration problems abort before any stage runs
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| RapportError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| RapportError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
        assert_eq!(ErrorCategory::Transient.to_string(), "TRANSIENT");
    }

    #[test]
    fn test_classify_http_status() {
        let err = ErrorClassifier::classify_http_status(429, "slow down", "azure");
        assert_eq!(err.category, ErrorCategory::RateLimit);

        let err = ErrorClassifier::classify_http_status(401, "bad key", "azure");
        assert_eq!(err.category, ErrorCategory::Auth);

        let err = ErrorClassifier::classify_http_status(404, "DeploymentNotFound", "azure");
        assert_eq!(err.category, ErrorCategory::Unavailable);

        let err = ErrorClassifier::classify_http_status(503, "busy", "openai");
        assert_eq!(err.category, ErrorCategory::Transient);
    }

    #[test]
    fn test_classify_transport_message() {
        let err = ErrorClassifier::classify("operation timed out", "azure");
        assert_eq!(err.category, ErrorCategory::Network);

        let err = ErrorClassifier::classify("error decoding response body", "azure");
        assert_eq!(err.category, ErrorCategory::ParseError);

        let err = ErrorClassifier::classify("something odd", "azure");
        assert_eq!(err.category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_llm_error_display() {
        let err = ErrorClassifier::classify_http_status(401, "Unauthorized", "azure");
        assert_eq!(err.to_string(), "[azure:AUTH] HTTP 401: Unauthorized");

        let err = LlmError::new(ErrorCategory::Network, "Connection failed");
        assert_eq!(err.to_string(), "[NETWORK] Connection failed");
    }

    #[test]
    fn test_stage_error_wraps_source() {
        let source = RapportError::Llm(LlmError::new(ErrorCategory::Network, "reset"));
        let err = RapportError::stage("research", &source);
        assert_eq!(
            err.to_string(),
            "Stage research failed: LLM error: [NETWORK] reset"
        );
        assert_eq!(source.llm_category(), Some(ErrorCategory::Network));
    }
}
