//! Generate Command
//!
//! Full course run: outline, schema, per-topic content, aggregate and one
//! Markdown document per module.
//!
//! Usage:
//!   coursegen generate --outline course.yaml --prompt-file prompt.txt
//!   coursegen generate --interactive

use std::io;
use std::path::PathBuf;

use tokio::runtime::Runtime;
use tracing::info;

use super::{CommonOptions, artifact_store, check_provider, load_config, resolve_prompt};
use crate::ai::{ProviderConfig, create_provider};
use crate::cli::ui::Output;
use crate::course::{
    CoursePipeline, FileOutlineSource, InteractiveOutlineSource, MarkdownSink, Outline,
    OutlineSource,
};
use crate::types::{CourseError, Result};

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub common: CommonOptions,
    /// Outline file (YAML or JSON)
    pub outline: Option<PathBuf>,
    /// Collect the outline (and a missing prompt) from the terminal
    pub interactive: bool,
    pub prompt: Option<String>,
    pub prompt_file: Option<PathBuf>,
    /// Reuse persisted topic artifacts
    pub skip_existing: bool,
}

pub fn run(options: GenerateOptions) -> Result<()> {
    let mut config = load_config(&options.common)?;
    if options.skip_existing {
        config.generation.skip_existing = true;
    }

    let prompt = resolve_prompt(options.prompt, options.prompt_file.as_deref())?;
    let (outline, prompt) = if options.interactive {
        collect_interactive(prompt)?
    } else {
        let path = options.outline.ok_or_else(|| {
            CourseError::Outline("Either --outline or --interactive is required".to_string())
        })?;
        let outline = FileOutlineSource::new(path).load()?;
        let prompt = prompt.ok_or_else(|| {
            CourseError::Config("A general prompt is required (--prompt or --prompt-file)".to_string())
        })?;
        (outline, prompt)
    };

    if outline.is_empty() {
        return Err(CourseError::Outline(
            "No modules were provided for any level".to_string(),
        ));
    }

    let provider = create_provider(&ProviderConfig::from(&config.llm))?;
    info!("Using LLM provider: {} ({})", provider.name(), provider.model());

    let output = Output::new();
    output.header("Course Generation");
    output.field("Provider", format!("{} ({})", provider.name(), provider.model()));
    output.field("Levels", outline.levels().count());
    output.field("Modules", outline.module_count());
    output.field("Topics", outline.topic_count());

    let store = artifact_store(&config, options.common.output.as_deref());
    let mut sink = MarkdownSink::new(store.documents_dir());
    output.field("Documents", sink.dir().display());

    let rt = Runtime::new()?;
    if !rt.block_on(check_provider(provider.as_ref())) {
        output.warning(&format!(
            "Provider '{}' health check inconclusive, continuing",
            provider.name()
        ));
    }

    let pipeline = CoursePipeline::new(provider, &config, store);
    let summary = rt.block_on(pipeline.run(outline, &prompt, &mut sink))?;

    output.summary(&summary);
    Ok(())
}

fn collect_interactive(prompt: Option<String>) -> Result<(Outline, String)> {
    let stdin = io::stdin();
    let mut source = InteractiveOutlineSource::new(stdin.lock(), io::stdout());

    let prompt = match prompt {
        Some(prompt) => prompt,
        None => source.ask_line("Enter the general prompt for the course content:")?,
    };
    if prompt.trim().is_empty() {
        return Err(CourseError::Config("General prompt is empty".to_string()));
    }

    let outline = source.load()?;
    Ok((outline, prompt))
}
