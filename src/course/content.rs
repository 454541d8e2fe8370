//! Lesson Content Generation
//!
//! Produces one schema-conformant content document per topic, then enforces
//! the metadata invariants and runs the quality gate.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use super::outline::Level;
use super::prompts;
use super::quality::{QualityGate, QualityReport};
use super::schema::Schema;
use crate::ai::{ChatRequest, ResponseParser, RetryExecutor, SharedProvider};
use crate::config::GenerationConfig;
use crate::constants::fields::{
    CEFR_LEVEL, DIFFICULTY_LEVEL, FORMAT_OPTIONS, LEARNING_OBJECTIVES, LESSON_TITLE,
    LESSON_TITLE_SNAKE, MODULE_TITLE,
};
use crate::types::{CourseError, Result};

/// Metadata fields, each filled from the originating outline entry
pub const METADATA_FIELDS: [&str; 5] = [
    LESSON_TITLE,
    DIFFICULTY_LEVEL,
    MODULE_TITLE,
    CEFR_LEVEL,
    LESSON_TITLE_SNAKE,
];

/// Fields that must exist as lists
pub const LIST_FIELDS: [&str; 2] = [LEARNING_OBJECTIVES, FORMAT_OPTIONS];

// =============================================================================
// Content Document
// =============================================================================

/// Generated lesson content for one topic. Field order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDocument(Map<String, Value>);

impl ContentDocument {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// `None` unless `value` is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Fill metadata from (level, module, topic) and coerce list fields.
    ///
    /// A metadata value counts as missing when absent, null, a blank string,
    /// or a list/object. List fields: absent/null become `[]`, any other
    /// non-list value is wrapped in a one-element list.
    pub fn apply_required_fields(&mut self, level: Level, module: &str, topic: &str) {
        let fills = [
            (LESSON_TITLE, topic),
            (DIFFICULTY_LEVEL, level.as_str()),
            (MODULE_TITLE, module),
            (CEFR_LEVEL, level.as_str()),
            (LESSON_TITLE_SNAKE, topic),
        ];
        for (field, fill) in fills {
            if is_blank(self.0.get(field)) {
                self.0.insert(field.to_string(), Value::String(fill.to_string()));
            }
        }

        for field in LIST_FIELDS {
            match self.0.get_mut(field) {
                Some(Value::Array(_)) => {}
                Some(slot @ Value::Null) => *slot = Value::Array(Vec::new()),
                Some(slot) => {
                    let single = slot.take();
                    *slot = Value::Array(vec![single]);
                }
                None => {
                    self.0.insert(field.to_string(), Value::Array(Vec::new()));
                }
            }
        }
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        Some(Value::Bool(_)) | Some(Value::Number(_)) => false,
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Finalized content plus its advisory quality report
#[derive(Debug, Clone)]
pub struct GeneratedContent {
    pub document: ContentDocument,
    pub quality: QualityReport,
}

pub struct ContentGenerator {
    provider: SharedProvider,
    executor: RetryExecutor,
    parser: ResponseParser,
    settings: GenerationConfig,
}

impl ContentGenerator {
    pub fn new(provider: SharedProvider, executor: RetryExecutor, settings: GenerationConfig) -> Self {
        Self {
            provider,
            executor,
            parser: ResponseParser::with_repair(settings.repair_json),
            settings,
        }
    }

    /// Generate one topic. Quality issues are logged and returned, never raised.
    #[instrument(skip(self, general_prompt, schema), fields(level = %level))]
    pub async fn generate(
        &self,
        level: Level,
        module: &str,
        topic: &str,
        general_prompt: &str,
        schema: &Schema,
    ) -> Result<GeneratedContent> {
        let enhanced = prompts::topic_prompt(general_prompt, level);
        let request = ChatRequest::new(
            prompts::content_system(),
            prompts::content_user(&enhanced, &schema.to_compact_json(), level, module, topic),
        )
        .with_temperature(self.settings.content_temperature)
        .with_max_tokens(self.settings.content_max_tokens);

        let raw = self
            .executor
            .execute("Content generation", || self.provider.complete(&request))
            .await?;

        let parsed = self
            .parser
            .parse_object(&raw)
            .map_err(|message| CourseError::ContentParse {
                topic: topic.to_string(),
                message,
                raw: raw.clone(),
            })?;
        if parsed.was_repaired {
            warn!(topic, "Content reply needed JSON repair");
        }

        let mut document = ContentDocument::new(parsed.object);
        document.apply_required_fields(level, module, topic);

        let quality = QualityGate::check(&document, schema);
        for issue in &quality.issues {
            warn!(topic, "Quality issue: {}", issue);
        }
        info!(topic, fields = document.as_map().len(), "Content generated");

        Ok(GeneratedContent { document, quality })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::RetryPolicy;
    use crate::ai::provider::scripted::ScriptedProvider;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn doc(value: Value) -> ContentDocument {
        ContentDocument::from_value(value).unwrap()
    }

    fn generator(provider: Arc<ScriptedProvider>) -> ContentGenerator {
        ContentGenerator::new(
            provider,
            RetryExecutor::new(RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
            }),
            GenerationConfig::default(),
        )
    }

    #[test]
    fn test_required_fields_filled_when_missing() {
        let mut document = doc(json!({"content": "body"}));
        document.apply_required_fields(Level::A2, "Travel", "At the Airport");

        assert_eq!(document.get(LESSON_TITLE).unwrap(), "At the Airport");
        assert_eq!(document.get(DIFFICULTY_LEVEL).unwrap(), "A2");
        assert_eq!(document.get(MODULE_TITLE).unwrap(), "Travel");
        assert_eq!(document.get(CEFR_LEVEL).unwrap(), "A2");
        assert_eq!(document.get(LESSON_TITLE_SNAKE).unwrap(), "At the Airport");
        assert_eq!(document.get(LEARNING_OBJECTIVES).unwrap(), &json!([]));
        assert_eq!(document.get(FORMAT_OPTIONS).unwrap(), &json!([]));
        // Existing fields keep their position
        assert_eq!(document.as_map().keys().next().unwrap(), "content");
    }

    #[test]
    fn test_required_fields_replace_blank_and_structured() {
        let mut document = doc(json!({
            "lessonTitle": "   ",
            "difficultyLevel": null,
            "moduleTitle": ["not", "a", "title"],
            "CEFR_level": {"code": "B1"},
            "lesson_title": "Kept"
        }));
        document.apply_required_fields(Level::B1, "Work", "Emails");

        assert_eq!(document.get(LESSON_TITLE).unwrap(), "Emails");
        assert_eq!(document.get(DIFFICULTY_LEVEL).unwrap(), "B1");
        assert_eq!(document.get(MODULE_TITLE).unwrap(), "Work");
        assert_eq!(document.get(CEFR_LEVEL).unwrap(), "B1");
        assert_eq!(document.get(LESSON_TITLE_SNAKE).unwrap(), "Kept");
    }

    #[test]
    fn test_list_fields_coerced() {
        let mut document = doc(json!({
            "learning_objectives": "Greet a colleague",
            "format_options": null
        }));
        document.apply_required_fields(Level::A1, "m", "t");

        assert_eq!(
            document.get(LEARNING_OBJECTIVES).unwrap(),
            &json!(["Greet a colleague"])
        );
        assert_eq!(document.get(FORMAT_OPTIONS).unwrap(), &json!([]));
    }

    #[test]
    fn test_required_fields_idempotent() {
        let mut document = doc(json!({"learning_objectives": ["a"]}));
        document.apply_required_fields(Level::C1, "m", "t");
        let once = document.clone();
        document.apply_required_fields(Level::C1, "m", "t");
        assert_eq!(once, document);
    }

    #[tokio::test]
    async fn test_generate_fills_metadata_and_reports_quality() {
        let provider = Arc::new(
            ScriptedProvider::new().reply("```json\n{\"content\": \"Say hello.\"}\n```"),
        );

        let generated = generator(provider.clone())
            .generate(Level::A1, "Greetings", "Hello", "General prompt", &Schema::empty())
            .await
            .unwrap();

        assert_eq!(generated.document.get(LESSON_TITLE).unwrap(), "Hello");
        assert!(generated.quality.is_flagged());
        assert_eq!(generated.quality.warning_count(), 2);

        let request = &provider.requests()[0];
        assert_eq!(request.max_tokens, 4000);
        assert!(request.messages[1].content.contains("Topic: Hello"));
        assert!(request.messages[1].content.contains("for A1 level learners"));
    }

    #[tokio::test]
    async fn test_generate_parse_error_names_topic() {
        let provider = Arc::new(ScriptedProvider::new().reply("[\"not\", \"an\", \"object\"]"));

        let err = generator(provider)
            .generate(Level::A1, "Greetings", "Hello", "p", &Schema::empty())
            .await
            .unwrap_err();

        match &err {
            CourseError::ContentParse { topic, raw, .. } => {
                assert_eq!(topic, "Hello");
                assert_eq!(raw, "[\"not\", \"an\", \"object\"]");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!err.is_run_fatal());
    }

    #[tokio::test]
    async fn test_generate_exhausted_retries() {
        let provider = Arc::new(ScriptedProvider::new().fail("a").fail("b").fail("c"));

        let err = generator(provider)
            .generate(Level::A1, "m", "t", "p", &Schema::empty())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CourseError::GenerationService { attempts: 3, .. }
        ));
    }
}
