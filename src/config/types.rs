//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/coursegen/) and project (.coursegen/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{artifacts, generation, network, retry};
use crate::types::{CourseError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Generation service settings
    pub llm: LlmConfig,

    /// Per-request generation tuning
    pub generation: GenerationConfig,

    /// Retry executor settings
    pub retry: RetryConfig,

    /// Artifact and document locations
    pub output: OutputConfig,

    /// Document rendering settings
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            generation: GenerationConfig::default(),
            retry: RetryConfig::default(),
            output: OutputConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `CourseError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("schema_temperature", self.generation.schema_temperature),
            ("content_temperature", self.generation.content_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(CourseError::Config(format!(
                    "generation.{} must be between 0.0 and 2.0, got {}",
                    name, value
                )));
            }
        }

        if self.generation.schema_max_tokens == 0 || self.generation.content_max_tokens == 0 {
            return Err(CourseError::Config(
                "generation max_tokens values must be greater than 0".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(CourseError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(CourseError::Config(
                "retry.max_attempts must be greater than 0".to_string(),
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
    /// Provider name: "openai" or "ollama"
    pub provider: String,

    /// Model name
    pub model: String,

    /// API base URL (custom endpoints, proxies)
    pub api_base: Option<String>,

    /// API key. Never serialized to output.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-call transport timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: generation::DEFAULT_MODEL.to_string(),
            api_base: None,
            api_key: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Temperature for schema synthesis (kept low for structural fidelity)
    pub schema_temperature: f32,

    /// Output budget for schema synthesis
    pub schema_max_tokens: u32,

    /// Temperature for lesson content
    pub content_temperature: f32,

    /// Output budget for lesson content
    pub content_max_tokens: u32,

    /// Attempt to repair malformed JSON before reporting a parse error
    pub repair_json: bool,

    /// Reuse persisted topic artifacts instead of regenerating them
    pub skip_existing: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            schema_temperature: generation::SCHEMA_TEMPERATURE,
            schema_max_tokens: generation::SCHEMA_MAX_TOKENS,
            content_temperature: generation::CONTENT_TEMPERATURE,
            content_max_tokens: generation::CONTENT_MAX_TOKENS,
            repair_json: true,
            skip_existing: false,
        }
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per generation service call, first try included
    pub max_attempts: u32,

    /// Linear backoff base; retry n waits n * base
    pub base_delay_ms: u64,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::MAX_ATTEMPTS,
            base_delay_ms: retry::BASE_DELAY_MS,
        }
    }
}

// =============================================================================
// Output Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Per-topic JSON artifacts (`<level>/<module>/<topic>.json`)
    pub generated_dir: PathBuf,

    /// Rendered module documents
    pub documents_dir: PathBuf,

    /// Persisted schema
    pub schema_file: PathBuf,

    /// Aggregate of every generated topic
    pub aggregate_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            generated_dir: PathBuf::from(artifacts::GENERATED_DIR),
            documents_dir: PathBuf::from(artifacts::DOCUMENTS_DIR),
            schema_file: PathBuf::from(artifacts::SCHEMA_FILE),
            aggregate_file: PathBuf::from(artifacts::AGGREGATE_FILE),
        }
    }
}

// =============================================================================
// Render Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render arrays of objects as tables instead of bullet lists
    pub tables: bool,
}

// =============================================================================
// Tests
// =============================================================================
