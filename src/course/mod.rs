//! Course Generation Pipeline
//!
//! ```text
//! Outline → Schema Synthesis → Content Generation (per topic) → Persistence
//!                                                                   ↓
//!                          Document Sink ← Rendering (per module) ← Aggregate
//! ```
//!
//! Levels, modules and topics are processed strictly in outline order. A
//! schema failure aborts the run; a topic failure is recorded and the run
//! moves on to the next topic.

pub mod content;
pub mod document;
pub mod outline;
pub mod prompts;
pub mod quality;
pub mod render;
pub mod schema;
pub mod store;

pub use content::{ContentDocument, ContentGenerator, GeneratedContent};
pub use document::{DocumentSink, MarkdownSink, MemorySink, ModuleDocument};
pub use outline::{
    FileOutlineSource, InteractiveOutlineSource, Level, Module, Outline, OutlineSource,
};
pub use quality::{QualityGate, QualityIssue, QualityReport};
pub use render::{Block, RenderOptions, StructuredRenderer, humanize};
pub use schema::{Schema, SchemaSynthesizer};
pub use store::{ArtifactStore, CourseData, sanitize};

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use crate::ai::{RetryExecutor, RetryPolicy, SharedProvider};
use crate::config::{Config, GenerationConfig};
use crate::types::{CourseError, Result, RunId};

// =============================================================================
// Run State
// =============================================================================

/// A topic that produced no content this run
#[derive(Debug, Clone)]
pub struct TopicFailure {
    pub level: Level,
    pub module: String,
    pub topic: String,
    pub reason: String,
}

/// End-of-run accounting
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: RunId,
    /// Properties in the schema synthesized for this run
    pub schema_properties: usize,
    pub generated: usize,
    /// Topics whose persisted artifact was reused
    pub reused: usize,
    pub failed: Vec<TopicFailure>,
    pub quality_flagged: usize,
    pub persistence_failures: usize,
    pub documents: Vec<PathBuf>,
    pub aggregate: Option<PathBuf>,
    pub duration: Duration,
}

impl RunSummary {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            schema_properties: 0,
            generated: 0,
            reused: 0,
            failed: Vec::new(),
            quality_flagged: 0,
            persistence_failures: 0,
            documents: Vec::new(),
            aggregate: None,
            duration: Duration::ZERO,
        }
    }

    /// Every topic produced and every artifact written
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.persistence_failures == 0
    }
}

/// State owned by one run; stages borrow it
pub struct RunContext {
    pub run_id: RunId,
    pub outline: Outline,
    pub general_prompt: String,
    pub schema: Option<Schema>,
    pub course_data: CourseData,
    pub summary: RunSummary,
}

impl RunContext {
    pub fn new(outline: Outline, general_prompt: impl Into<String>) -> Self {
        let run_id = RunId::generate();
        Self {
            summary: RunSummary::new(run_id.clone()),
            run_id,
            outline,
            general_prompt: general_prompt.into(),
            schema: None,
            course_data: CourseData::new(),
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

pub struct CoursePipeline {
    provider: SharedProvider,
    executor: RetryExecutor,
    settings: GenerationConfig,
    store: ArtifactStore,
    exporter: DocumentExporter,
}

impl CoursePipeline {
    pub fn new(provider: SharedProvider, config: &Config, store: ArtifactStore) -> Self {
        Self {
            provider,
            executor: RetryExecutor::new(RetryPolicy::from(&config.retry)),
            settings: config.generation.clone(),
            exporter: DocumentExporter::new(store.clone(), RenderOptions::from(&config.render)),
            store,
        }
    }

    pub fn with_executor(mut self, executor: RetryExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Full run: schema, every topic, aggregate, one document per module
    #[instrument(skip_all, fields(levels = outline.levels().count(), topics = outline.topic_count()))]
    pub async fn run(
        &self,
        outline: Outline,
        general_prompt: &str,
        sink: &mut dyn DocumentSink,
    ) -> Result<RunSummary> {
        let start = Instant::now();
        if outline.is_empty() {
            return Err(CourseError::Outline(
                "outline contains no modules".to_string(),
            ));
        }

        let mut ctx = RunContext::new(outline, general_prompt);
        info!(run_id = %ctx.run_id, "Course generation started");

        // ===== Stage 1: Schema =====
        let schema = ctx
            .schema
            .insert(self.synthesize_schema(&ctx.general_prompt).await?);
        ctx.summary.schema_properties = schema.property_names().count();
        info!(properties = ctx.summary.schema_properties, "Schema ready");

        // ===== Stage 2: Topics =====
        self.generate_topics(&mut ctx).await?;

        // ===== Stage 3: Aggregate =====
        match self.store.save_aggregate(&ctx.course_data) {
            Ok(path) => {
                info!(path = %path.display(), topics = ctx.course_data.topic_count(), "Aggregate saved");
                ctx.summary.aggregate = Some(path);
            }
            Err(e) => {
                warn!(error = %e, "Failed to save course aggregate");
                ctx.summary.persistence_failures += 1;
            }
        }

        // ===== Stage 4: Documents =====
        self.exporter.export(&ctx.outline, sink, &mut ctx.summary);

        ctx.summary.duration = start.elapsed();
        info!(
            run_id = %ctx.run_id,
            generated = ctx.summary.generated,
            reused = ctx.summary.reused,
            failed = ctx.summary.failed.len(),
            documents = ctx.summary.documents.len(),
            "Course generation complete"
        );
        Ok(ctx.summary)
    }

    /// Generate and persist the lesson schema
    pub async fn synthesize_schema(&self, general_prompt: &str) -> Result<Schema> {
        SchemaSynthesizer::new(
            self.provider.clone(),
            self.executor.clone(),
            self.settings.clone(),
            self.store.clone(),
        )
        .synthesize(general_prompt)
        .await
    }

    async fn generate_topics(&self, ctx: &mut RunContext) -> Result<()> {
        let generator = ContentGenerator::new(
            self.provider.clone(),
            self.executor.clone(),
            self.settings.clone(),
        );

        for (level, module) in ctx.outline.modules() {
            ctx.course_data.ensure_module(level, &module.name);
            info!(%level, module = %module.name, topics = module.topics.len(), "Processing module");

            for topic in &module.topics {
                if self.settings.skip_existing {
                    match self.store.load_topic(level, &module.name, topic) {
                        Ok(Some(document)) => {
                            info!(%level, topic = %topic, "Reusing persisted topic");
                            ctx.course_data.push(level, &module.name, document);
                            ctx.summary.reused += 1;
                            continue;
                        }
                        Ok(None) => {}
                        Err(e) => warn!(error = %e, "Persisted topic unreadable, regenerating"),
                    }
                }

                let schema = self.store.load_schema().unwrap_or_else(|e| {
                    warn!(error = %e, "Schema artifact unreadable, generating without schema");
                    Schema::empty()
                });

                let generated = match generator
                    .generate(level, &module.name, topic, &ctx.general_prompt, &schema)
                    .await
                {
                    Ok(generated) => generated,
                    Err(e) if e.is_run_fatal() => return Err(e),
                    Err(e) => {
                        warn!(%level, module = %module.name, topic = %topic, error = %e, "Topic failed");
                        ctx.summary.failed.push(TopicFailure {
                            level,
                            module: module.name.clone(),
                            topic: topic.clone(),
                            reason: e.to_string(),
                        });
                        continue;
                    }
                };

                if generated.quality.is_flagged() {
                    ctx.summary.quality_flagged += 1;
                }
                if let Err(e) =
                    self.store
                        .save_topic(level, &module.name, topic, &generated.document)
                {
                    warn!(topic = %topic, error = %e, "Failed to persist topic");
                    ctx.summary.persistence_failures += 1;
                }
                ctx.course_data.push(level, &module.name, generated.document);
                ctx.summary.generated += 1;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Document Export
// =============================================================================

/// Renders module documents from persisted topic artifacts
pub struct DocumentExporter {
    store: ArtifactStore,
    renderer: StructuredRenderer,
}

impl DocumentExporter {
    pub fn new(store: ArtifactStore, options: RenderOptions) -> Self {
        Self {
            store,
            renderer: StructuredRenderer::new(options),
        }
    }

    /// One document per module, in outline order.
    ///
    /// Topics without an artifact are left out of their module's document.
    pub fn export(&self, outline: &Outline, sink: &mut dyn DocumentSink, summary: &mut RunSummary) {
        for (level, module) in outline.modules() {
            let mut document = ModuleDocument::new(level, module.name.as_str());

            for topic in &module.topics {
                match self.store.load_topic(level, &module.name, topic) {
                    Ok(Some(content)) => {
                        document.push_topic(topic.as_str(), self.renderer.render(&content))
                    }
                    Ok(None) => warn!(%level, topic = %topic, "No content artifact for topic"),
                    Err(e) => {
                        warn!(topic = %topic, error = %e, "Failed to load topic artifact");
                        summary.persistence_failures += 1;
                    }
                }
            }

            match sink.write(&document) {
                Ok(path) => summary.documents.push(path),
                Err(e) => {
                    warn!(module = %module.name, error = %e, "Failed to write module document");
                    summary.persistence_failures += 1;
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::scripted::ScriptedProvider;
    use crate::config::OutputConfig;
    use serde_json::Value;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    const SCHEMA_REPLY: &str = r#"```json
{"type": "object", "properties": {"content": {"type": "string"}, "exercises": {"type": "array"}}}
```"#;

    fn pipeline(provider: Arc<ScriptedProvider>, dir: &TempDir, config: &Config) -> CoursePipeline {
        CoursePipeline::new(provider, config, ArtifactStore::rooted(dir.path(), &config.output))
            .with_executor(RetryExecutor::new(RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
            }))
    }

    fn topic_reply(title: &str) -> String {
        format!(
            r#"{{"lessonTitle": "{title}", "learning_objectives": ["a", "b", "c"], "content": "Body of {title}", "exercises": ["Practice {title}"]}}"#
        )
    }

    fn outline() -> Outline {
        Outline::builder()
            .module(Level::A1, "Greetings", ["Hello", "Goodbye"])
            .build()
    }

    #[tokio::test]
    async fn test_end_to_end_single_module() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply(SCHEMA_REPLY)
                .reply(topic_reply("Hello"))
                .reply(topic_reply("Goodbye")),
        );
        let config = Config::default();
        let mut sink = MemorySink::new();

        let summary = pipeline(provider.clone(), &dir, &config)
            .run(outline(), "Short lessons", &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.generated, 2);
        assert_eq!(summary.schema_properties, 2 + schema::BASELINE_PROPERTIES.len());
        assert!(summary.is_clean());
        assert_eq!(summary.quality_flagged, 0);
        assert_eq!(provider.calls(), 3);

        // Per-topic artifacts
        for topic in ["Hello", "Goodbye"] {
            let path = dir.path().join(format!("generated/A1/Greetings/{topic}.json"));
            let saved: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
            assert_eq!(saved["moduleTitle"], "Greetings");
            assert_eq!(saved["CEFR_level"], "A1");
        }

        // Aggregate nests both topics in order
        let aggregate: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("complete_course_data.json")).unwrap(),
        )
        .unwrap();
        let topics = aggregate["A1"]["Greetings"].as_array().unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0]["lessonTitle"], "Hello");
        assert_eq!(topics[1]["lessonTitle"], "Goodbye");

        // One module document with both topics in order
        assert_eq!(sink.documents.len(), 1);
        let document = &sink.documents[0];
        assert_eq!(document.file_stem(), "Greetings_A1");
        let titles: Vec<_> = document.topics.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Hello", "Goodbye"]);
        assert_eq!(document.topics[0].blocks[0], Block::heading("Lesson Title", 1));

        // The content prompt embeds the persisted schema
        let requests = provider.requests();
        assert!(requests[1].messages[1].content.contains(r#""exercises":{"type":"array"}"#));
    }

    #[tokio::test]
    async fn test_topic_failure_does_not_stop_run() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply(SCHEMA_REPLY)
                .reply("not json at all")
                .reply(topic_reply("Goodbye")),
        );
        let config = Config::default();
        let mut sink = MemorySink::new();

        let summary = pipeline(provider, &dir, &config)
            .run(outline(), "p", &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.generated, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].topic, "Hello");
        assert!(!summary.is_clean());

        let titles: Vec<_> = sink.documents[0].topics.iter().map(|t| t.title.clone()).collect();
        assert_eq!(titles, vec!["Goodbye".to_string()]);
    }

    #[tokio::test]
    async fn test_exhausted_retries_fail_only_that_topic() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply(SCHEMA_REPLY)
                .fail("rate limited")
                .fail("rate limited")
                .fail("rate limited")
                .reply(topic_reply("Goodbye")),
        );
        let config = Config::default();
        let mut sink = MemorySink::new();

        let summary = pipeline(provider.clone(), &dir, &config)
            .run(outline(), "p", &mut sink)
            .await
            .unwrap();

        assert_eq!(provider.calls(), 5);
        assert_eq!(summary.generated, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].topic, "Hello");
        assert!(summary.failed[0].reason.contains("after 3 attempts"));
        assert!(dir.path().join("generated/A1/Greetings/Goodbye.json").exists());
        assert_eq!(sink.documents[0].topics.len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_schema_artifact_falls_back_to_empty() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.output.schema_file = "schema_dir".into();
        // A directory at the schema path: saving and loading both fail
        fs::create_dir_all(dir.path().join("schema_dir")).unwrap();

        let provider = Arc::new(
            ScriptedProvider::new()
                .reply(SCHEMA_REPLY)
                .reply(topic_reply("Hello"))
                .reply(topic_reply("Goodbye")),
        );
        let mut sink = MemorySink::new();

        let summary = pipeline(provider.clone(), &dir, &config)
            .run(outline(), "p", &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.generated, 2);
        assert!(summary.failed.is_empty());
        for request in &provider.requests()[1..] {
            assert!(request.messages[1].content.contains("structure:\n\n{}\n"));
        }
    }

    #[tokio::test]
    async fn test_topic_save_failure_is_counted_and_siblings_continue() {
        let dir = TempDir::new().unwrap();
        // A directory where the first topic's artifact file belongs
        fs::create_dir_all(dir.path().join("generated/A1/Greetings/Hello.json")).unwrap();

        let provider = Arc::new(
            ScriptedProvider::new()
                .reply(SCHEMA_REPLY)
                .reply(topic_reply("Hello"))
                .reply(topic_reply("Goodbye")),
        );
        let config = Config::default();
        let mut sink = MemorySink::new();

        let summary = pipeline(provider, &dir, &config)
            .run(outline(), "p", &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.generated, 2);
        assert!(summary.failed.is_empty());
        // The failed write, then the unreadable artifact during export
        assert_eq!(summary.persistence_failures, 2);
        assert!(!summary.is_clean());

        let aggregate: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("complete_course_data.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(aggregate["A1"]["Greetings"].as_array().unwrap().len(), 2);

        let titles: Vec<_> = sink.documents[0].topics.iter().map(|t| t.title.clone()).collect();
        assert_eq!(titles, vec!["Goodbye".to_string()]);
    }

    #[tokio::test]
    async fn test_schema_failure_aborts_run() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new().reply("no schema today"));
        let config = Config::default();
        let mut sink = MemorySink::new();

        let err = pipeline(provider.clone(), &dir, &config)
            .run(outline(), "p", &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, CourseError::SchemaParse { .. }));
        assert_eq!(provider.calls(), 1);
        assert!(sink.documents.is_empty());
        assert!(!dir.path().join("generated").exists());
    }

    #[tokio::test]
    async fn test_empty_outline_rejected() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new());
        let config = Config::default();

        let err = pipeline(provider.clone(), &dir, &config)
            .run(Outline::default(), "p", &mut MemorySink::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CourseError::Outline(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_skip_existing_reuses_artifacts() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.generation.skip_existing = true;

        let store = ArtifactStore::rooted(dir.path(), &config.output);
        let existing = ContentDocument::from_value(serde_json::json!({"lessonTitle": "Hello"})).unwrap();
        store.save_topic(Level::A1, "Greetings", "Hello", &existing).unwrap();

        let provider = Arc::new(
            ScriptedProvider::new()
                .reply(SCHEMA_REPLY)
                .reply(topic_reply("Goodbye")),
        );
        let mut sink = MemorySink::new();

        let summary = pipeline(provider.clone(), &dir, &config)
            .run(outline(), "p", &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.reused, 1);
        assert_eq!(summary.generated, 1);
        assert_eq!(provider.calls(), 2);
        assert_eq!(sink.documents[0].topics.len(), 2);
    }

    #[test]
    fn test_export_skips_missing_topics() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::rooted(dir.path(), &OutputConfig::default());
        let document = ContentDocument::from_value(serde_json::json!({"content": "x"})).unwrap();
        store
            .save_topic(Level::A1, "Greetings", "Goodbye", &document)
            .unwrap();

        let mut sink = MemorySink::new();
        let mut summary = RunSummary::new(RunId::generate());
        DocumentExporter::new(store, RenderOptions::default()).export(&outline(), &mut sink, &mut summary);

        assert_eq!(summary.documents, vec![PathBuf::from("Greetings_A1.md")]);
        assert_eq!(sink.documents[0].topics.len(), 1);
        assert_eq!(sink.documents[0].topics[0].title, "Goodbye");
        assert_eq!(
            sink.documents[0].topics[0].blocks,
            vec![Block::heading("Content", 1), Block::paragraph("x", 0)]
        );
    }
}
