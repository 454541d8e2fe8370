//! Schema Synthesis
//!
//! Derives a JSON-Schema-shaped lesson contract from the general prompt and
//! normalizes it so every schema carries the baseline structure.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};

use super::prompts;
use super::store::ArtifactStore;
use crate::ai::{ChatRequest, ResponseParser, RetryExecutor, SharedProvider};
use crate::config::GenerationConfig;
use crate::constants::fields::{DIFFICULTY_LEVEL, LESSON_TITLE, MODULE_TITLE};
use crate::types::{CourseError, Result};

pub const SCHEMA_DRAFT: &str = "http://json-schema.org/draft-07/schema#";
pub const DEFAULT_TITLE: &str = "Lesson Content Schema";

/// Properties every lesson schema defines and requires
pub const BASELINE_PROPERTIES: [(&str, &str); 3] = [
    (LESSON_TITLE, "The title of the lesson"),
    (DIFFICULTY_LEVEL, "The CEFR difficulty level of the lesson"),
    (MODULE_TITLE, "The title of the module"),
];

// =============================================================================
// Schema
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(Map<String, Value>);

impl Schema {
    /// Fallback when no schema can be loaded
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalize a raw schema object. Idempotent.
    pub fn normalize(mut object: Map<String, Value>) -> Self {
        object
            .entry("$schema")
            .or_insert_with(|| Value::String(SCHEMA_DRAFT.to_string()));
        object
            .entry("title")
            .or_insert_with(|| Value::String(DEFAULT_TITLE.to_string()));

        if object.get("type").and_then(Value::as_str) != Some("object") {
            object.insert("type".to_string(), Value::String("object".to_string()));
        }

        if !object.get("properties").is_some_and(Value::is_object) {
            object.insert("properties".to_string(), Value::Object(Map::new()));
        }
        if let Some(Value::Object(properties)) = object.get_mut("properties") {
            for (name, description) in BASELINE_PROPERTIES {
                properties
                    .entry(name)
                    .or_insert_with(|| json!({"type": "string", "description": description}));
            }
        }

        if !object.get("required").is_some_and(Value::is_array) {
            object.insert("required".to_string(), Value::Array(Vec::new()));
        }
        if let Some(Value::Array(required)) = object.get_mut("required") {
            for (name, _) in BASELINE_PROPERTIES {
                if !required.iter().any(|r| r.as_str() == Some(name)) {
                    required.push(Value::String(name.to_string()));
                }
            }
        }

        Self(object)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names under `properties`, in schema order
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.0
            .get("properties")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|props| props.keys().map(String::as_str))
    }

    /// String entries of `required`
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.0
            .get("required")
            .and_then(Value::as_array)
            .into_iter()
            .flat_map(|names| names.iter().filter_map(Value::as_str))
    }

    /// Compact JSON text, as embedded into content prompts
    pub fn to_compact_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

// =============================================================================
// Synthesizer
// =============================================================================

pub struct SchemaSynthesizer {
    provider: SharedProvider,
    executor: RetryExecutor,
    parser: ResponseParser,
    settings: GenerationConfig,
    store: ArtifactStore,
}

impl SchemaSynthesizer {
    pub fn new(
        provider: SharedProvider,
        executor: RetryExecutor,
        settings: GenerationConfig,
        store: ArtifactStore,
    ) -> Self {
        Self {
            provider,
            executor,
            parser: ResponseParser::with_repair(settings.repair_json),
            settings,
            store,
        }
    }

    /// Generate, normalize and persist the lesson schema.
    ///
    /// A persistence failure is logged; the schema is still returned.
    #[instrument(skip_all)]
    pub async fn synthesize(&self, general_prompt: &str) -> Result<Schema> {
        info!("Synthesizing lesson schema");

        let request = ChatRequest::new(
            prompts::schema_system(),
            prompts::schema_user(general_prompt),
        )
        .with_temperature(self.settings.schema_temperature)
        .with_max_tokens(self.settings.schema_max_tokens);

        let raw = self
            .executor
            .execute("Schema synthesis", || self.provider.complete(&request))
            .await?;

        let parsed = self
            .parser
            .parse_object(&raw)
            .map_err(|message| CourseError::SchemaParse {
                message,
                raw: raw.clone(),
            })?;
        if parsed.was_repaired {
            warn!("Schema reply needed JSON repair");
        }

        let schema = Schema::normalize(parsed.object);
        info!(
            properties = schema.property_names().count(),
            "Schema synthesized"
        );

        match self.store.save_schema(&schema) {
            Ok(path) => info!(path = %path.display(), "Schema saved"),
            Err(e) => warn!(error = %e, "Failed to persist schema"),
        }

        Ok(schema)
    }
}

// =============================================================================
// Tests
// =============================================================================
