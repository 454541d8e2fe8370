//! AI Integration Layer
//!
//! Generation service transports, the retry executor, prompt construction
//! and reply parsing.

pub mod prompt;
pub mod provider;
pub mod retry;
pub mod validation;

pub use prompt::{PromptBuilder, PromptSection};
pub use provider::{
    ChatMessage, ChatRequest, ErrorCategory, ErrorClassifier, LlmError, LlmProvider, LlmResponse,
    ProviderConfig, ResponseMetadata, ResponseTiming, Role, SharedProvider, TokenUsage,
    create_provider,
};
pub use retry::{RetryExecutor, RetryPolicy, RetryStats};
pub use validation::{JsonRepairer, ParsedObject, ResponseParser, extract_json_block};
