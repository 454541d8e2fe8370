//! Unified Error Type System
//!
//! Centralized error types for the course generator.
//!
//! ## Error Categories
//!
//! Transport failures from the generation service are classified into
//! categories (rate limit, auth, network, ...). The retry executor retries
//! every category alike; the category is carried for diagnostics.
//!
//! ## Propagation
//!
//! - `GenerationService` / `ContentParse`: fatal to one topic, the run continues
//! - `SchemaParse` and outline failures: fatal to the run
//! - `Persistence`: logged by the pipeline, the affected topic or module is skipped

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Categories for generation service failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited by the service
    RateLimit,
    /// Prompt or completion exceeded the model context
    TokenLimit,
    /// Authentication failed
    Auth,
    /// Network/connectivity issues
    Network,
    /// Service unavailable or server error
    Unavailable,
    /// Invalid request
    BadRequest,
    /// Service returned a malformed payload
    MalformedResponse,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TokenLimit => write!(f, "TOKEN_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::MalformedResponse => write!(f, "MALFORMED_RESPONSE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Generation service error with category and provider context
#[derive(Debug, Clone)]
pub struct LlmError {
    pub category: ErrorCategory,
    pub message: String,
    pub provider: Option<String>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
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
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
        }
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps raw transport failures onto an [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from any provider
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("quota exceeded")
        {
            return LlmError::with_provider(ErrorCategory::RateLimit, message, provider);
        }

        if lower.contains("token")
            && (lower.contains("limit") || lower.contains("exceed") || lower.contains("maximum"))
            || lower.contains("context length")
        {
            return LlmError::with_provider(ErrorCategory::TokenLimit, message, provider);
        }

        if lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("unauthorized")
        {
            return LlmError::with_provider(ErrorCategory::Auth, message, provider);
        }

        if lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("unreachable")
        {
            return LlmError::with_provider(ErrorCategory::Network, message, provider);
        }

        if lower.contains("503")
            || lower.contains("502")
            || lower.contains("500")
            || lower.contains("service unavailable")
            || lower.contains("overloaded")
        {
            return LlmError::with_provider(ErrorCategory::Unavailable, message, provider);
        }

        if lower.contains("400") || lower.contains("bad request") {
            return LlmError::with_provider(ErrorCategory::BadRequest, message, provider);
        }

        LlmError::with_provider(ErrorCategory::Unknown, message, provider)
    }

    /// Classify an HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        let category = match status {
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            400 | 422 => ErrorCategory::BadRequest,
            404 | 500 | 502 | 503 | 504 => ErrorCategory::Unavailable,
            _ => ErrorCategory::Unknown,
        };
        LlmError::with_provider(category, message, provider)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum CourseError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Generation Service Errors
    // -------------------------------------------------------------------------
    /// Classified transport error from a single call
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Unclassified transport error from a single call
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// Every retry attempt against the generation service failed
    #[error("{operation} failed after {attempts} attempts: {source}")]
    GenerationService {
        operation: String,
        attempts: u32,
        #[source]
        source: Box<CourseError>,
    },

    // -------------------------------------------------------------------------
    // Parse Errors (raw response kept for inspection)
    // -------------------------------------------------------------------------
    #[error("Generated schema is not a JSON object: {message}")]
    SchemaParse { message: String, raw: String },

    #[error("Generated content for '{topic}' is not a JSON object: {message}")]
    ContentParse {
        topic: String,
        message: String,
        raw: String,
    },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Outline error: {0}")]
    Outline(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Persistence error at {}: {message}", .path.display())]
    Persistence { path: PathBuf, message: String },
}

impl From<LlmError> for CourseError {
    fn from(err: LlmError) -> Self {
        CourseError::Llm(err)
    }
}

pub type Result<T> = std::result::Result<T, CourseError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl CourseError {
    /// Wrap the last failure of an exhausted retry loop
    pub fn generation_service(operation: impl Into<String>, attempts: u32, last: CourseError) -> Self {
        Self::GenerationService {
            operation: operation.into(),
            attempts,
            source: Box::new(last),
        }
    }

    /// Create a persistence error for a path
    pub fn persistence(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Category of the underlying transport failure, if any
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Llm(e) => Some(e.category),
            Self::LlmApi(msg) => Some(ErrorClassifier::classify(msg, "unknown").category),
            Self::GenerationService { source, .. } => source.category(),
            _ => None,
        }
    }

    /// Raw generation service output attached to parse failures
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::SchemaParse { raw, .. } | Self::ContentParse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Whether this error must abort the whole run rather than a single topic
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            Self::SchemaParse { .. } | Self::Outline(_) | Self::Config(_)
        )
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
        assert_eq!(ErrorCategory::TokenLimit.to_string(), "TOKEN_LIMIT");
        assert_eq!(
            ErrorCategory::MalformedResponse.to_string(),
            "MALFORMED_RESPONSE"
        );
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = ErrorClassifier::classify("Rate limit exceeded, please retry", "openai");
        assert_eq!(err.category, ErrorCategory::RateLimit);
    }

    #[test]
    fn test_classify_network() {
        let err = ErrorClassifier::classify("Connection timed out after 120s", "ollama");
        assert_eq!(err.category, ErrorCategory::Network);
    }

    #[test]
    fn test_classify_unknown() {
        let err = ErrorClassifier::classify("Something weird happened", "test");
        assert_eq!(err.category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_classify_http_status() {
        assert_eq!(
            ErrorClassifier::classify_http_status(429, "slow down", "t").category,
            ErrorCategory::RateLimit
        );
        assert_eq!(
            ErrorClassifier::classify_http_status(401, "no", "t").category,
            ErrorCategory::Auth
        );
        assert_eq!(
            ErrorClassifier::classify_http_status(503, "busy", "t").category,
            ErrorCategory::Unavailable
        );
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "Too many requests", "openai");
        assert_eq!(err.to_string(), "[openai:RATE_LIMIT] Too many requests");

        let err = LlmError::new(ErrorCategory::Network, "Connection failed");
        assert_eq!(err.to_string(), "[NETWORK] Connection failed");
    }

    #[test]
    fn test_generation_service_names_attempts() {
        let last = CourseError::LlmApi("boom".to_string());
        let err = CourseError::generation_service("Schema synthesis", 3, last);
        let message = err.to_string();
        assert!(message.contains("3 attempts"));
        assert!(message.contains("boom"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_raw_response_preserved() {
        let err = CourseError::SchemaParse {
            message: "expected value".to_string(),
            raw: "not json".to_string(),
        };
        assert_eq!(err.raw_response(), Some("not json"));
        assert!(err.is_run_fatal());

        let err = CourseError::ContentParse {
            topic: "Greetings".to_string(),
            message: "expected value".to_string(),
            raw: "oops".to_string(),
        };
        assert_eq!(err.raw_response(), Some("oops"));
        assert!(!err.is_run_fatal());
    }

    #[test]
    fn test_category_through_generation_service() {
        let inner = CourseError::Llm(LlmError::new(ErrorCategory::Auth, "bad key"));
        let err = CourseError::generation_service("Content generation", 3, inner);
        assert_eq!(err.category(), Some(ErrorCategory::Auth));
    }
}
