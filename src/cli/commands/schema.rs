//! Schema Command
//!
//! Synthesize and persist the lesson schema without generating content.

use std::path::PathBuf;

use tokio::runtime::Runtime;

use super::{CommonOptions, artifact_store, check_provider, load_config, resolve_prompt};
use crate::ai::{ProviderConfig, RetryExecutor, RetryPolicy, create_provider};
use crate::cli::ui::Output;
use crate::course::SchemaSynthesizer;
use crate::types::{CourseError, Result};

#[derive(Debug, Clone, Default)]
pub struct SchemaOptions {
    pub common: CommonOptions,
    pub prompt: Option<String>,
    pub prompt_file: Option<PathBuf>,
}

pub fn run(options: SchemaOptions) -> Result<()> {
    let config = load_config(&options.common)?;
    let prompt = resolve_prompt(options.prompt, options.prompt_file.as_deref())?.ok_or_else(|| {
        CourseError::Config("A general prompt is required (--prompt or --prompt-file)".to_string())
    })?;

    let provider = create_provider(&ProviderConfig::from(&config.llm))?;
    let output = Output::new();
    let rt = Runtime::new()?;
    if !rt.block_on(check_provider(provider.as_ref())) {
        output.warning(&format!(
            "Provider '{}' health check inconclusive, continuing",
            provider.name()
        ));
    }

    let store = artifact_store(&config, options.common.output.as_deref());
    let schema_path = store.schema_path().to_path_buf();
    let synthesizer = SchemaSynthesizer::new(
        provider,
        RetryExecutor::new(RetryPolicy::from(&config.retry)),
        config.generation.clone(),
        store,
    );

    let schema = rt.block_on(synthesizer.synthesize(&prompt))?;

    output.section("Lesson Schema");
    output.field("Properties", schema.property_names().count());
    output.field("Required", schema.required_names().count());
    for name in schema.property_names() {
        println!("    - {}", name);
    }
    output.success(&format!("Schema saved to {}", schema_path.display()));
    Ok(())
}
