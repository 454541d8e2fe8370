//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Retry executor constants
pub mod retry {
    /// Maximum attempts per generation service call (first try included)
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Base delay for linear backoff (milliseconds).
    ///
    /// The delay before retry `n + 1` is `n * BASE_DELAY_MS`.
    pub const BASE_DELAY_MS: u64 = 2000;
}

/// Generation request tuning
pub mod generation {
    /// Schema synthesis temperature (near-deterministic)
    pub const SCHEMA_TEMPERATURE: f32 = 0.1;

    /// Schema synthesis output budget (tokens)
    pub const SCHEMA_MAX_TOKENS: u32 = 3000;

    /// Content generation temperature (room for creative variation)
    pub const CONTENT_TEMPERATURE: f32 = 0.4;

    /// Content generation output budget (tokens)
    pub const CONTENT_MAX_TOKENS: u32 = 4000;

    /// Default model identifier
    pub const DEFAULT_MODEL: &str = "gpt-4o";
}

/// Outline constants
pub mod outline {
    /// Topic assigned to a module supplied without topics
    pub const DEFAULT_TOPIC: &str = "Default Topic";
}

/// Content document field names
pub mod fields {
    /// camelCase metadata fields every document carries
    pub const LESSON_TITLE: &str = "lessonTitle";
    pub const DIFFICULTY_LEVEL: &str = "difficultyLevel";
    pub const MODULE_TITLE: &str = "moduleTitle";

    /// snake_case aliases filled alongside the metadata fields
    pub const CEFR_LEVEL: &str = "CEFR_level";
    pub const LESSON_TITLE_SNAKE: &str = "lesson_title";

    /// List fields that must exist (possibly empty)
    pub const LEARNING_OBJECTIVES: &str = "learning_objectives";
    pub const FORMAT_OPTIONS: &str = "format_options";

    /// Minimum learning objectives before the quality gate complains
    pub const MIN_LEARNING_OBJECTIVES: usize = 3;
}

/// Persisted artifact names
pub mod artifacts {
    /// Directory holding per-topic JSON documents
    pub const GENERATED_DIR: &str = "generated";

    /// Directory receiving rendered module documents
    pub const DOCUMENTS_DIR: &str = "documents";

    /// Well-known schema artifact
    pub const SCHEMA_FILE: &str = "course_schema.json";

    /// Aggregate of every generated topic
    pub const AGGREGATE_FILE: &str = "complete_course_data.json";
}

/// HTTP/Network constants
pub mod network {
    /// Per-call transport timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
}
