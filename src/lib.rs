//! coursegen - AI-Driven Course Content Generator
//!
//! Turns a course outline (CEFR level → module → topic) and a free-text
//! prompt into schema-conformant lesson content and one formatted document
//! per module.
//!
//! ## Core Features
//!
//! - **Schema Synthesis**: a JSON schema derived once from the general prompt
//! - **Constrained Generation**: per-topic content that follows the schema
//! - **Retry/Backoff**: linear backoff around every generation call
//! - **JSON Repair**: fenced, truncated or prose-wrapped replies recovered
//! - **Structured Rendering**: arbitrary content trees rendered as documents
//!
//! ## Quick Start
//!
//! ```ignore
//! use coursegen::{ArtifactStore, Config, CoursePipeline, MarkdownSink, Outline, Level};
//! use coursegen::ai::{ProviderConfig, create_provider};
//!
//! let config = Config::default();
//! let provider = create_provider(&ProviderConfig::from(&config.llm))?;
//! let store = ArtifactStore::new(&config.output);
//! let mut sink = MarkdownSink::new(store.documents_dir());
//! let outline = Outline::builder()
//!     .module(Level::A1, "Greetings", ["Hello", "Goodbye"])
//!     .build();
//!
//! let pipeline = CoursePipeline::new(provider, &config, store);
//! let summary = pipeline.run(outline, "Lessons with vocabulary and exercises", &mut sink).await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: generation service transports, retry executor, reply parsing
//! - [`course`]: outline, schema, content, rendering and the pipeline
//! - [`config`]: layered configuration
//! - [`cli`]: command implementations

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod course;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{CourseError, ErrorCategory, Result};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use course::{
    ArtifactStore, Block, ContentDocument, CoursePipeline, DocumentExporter, DocumentSink, Level,
    MarkdownSink, MemorySink, Outline, RunSummary, Schema, StructuredRenderer,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{LlmProvider, LlmResponse, RetryExecutor, RetryPolicy, SharedProvider};
