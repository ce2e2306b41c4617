//! AI Integration Layer
//!
//! Generation providers and lenient parsing of their output.

pub mod provider;
pub mod validation;

pub use provider::{
    AzureOpenAiProvider, ErrorCategory, ErrorClassifier, LlmError, LlmProvider, LlmResponse,
    OpenAiProvider, ProviderConfig, ResponseMetadata, ResponseTiming, SharedProvider, TokenUsage,
    create_provider,
};
pub use validation::{JsonRepairer, extract_json_from_response};
