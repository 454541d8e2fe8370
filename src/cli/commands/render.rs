//! Render Command
//!
//! Rebuild the module documents from persisted topic artifacts. Nothing is
//! regenerated; topics without an artifact are left out.

use std::path::PathBuf;

use super::{CommonOptions, artifact_store, load_config};
use crate::cli::ui::Output;
use crate::course::{
    DocumentExporter, FileOutlineSource, MarkdownSink, OutlineSource, RenderOptions, RunSummary,
};
use crate::types::{Result, RunId};

#[derive(Debug, Clone, Default)]
pub struct RenderCommandOptions {
    pub common: CommonOptions,
    pub outline: PathBuf,
}

pub fn run(options: RenderCommandOptions) -> Result<()> {
    let config = load_config(&options.common)?;
    let outline = FileOutlineSource::new(&options.outline).load()?;

    let store = artifact_store(&config, options.common.output.as_deref());
    let mut sink = MarkdownSink::new(store.documents_dir());
    let exporter = DocumentExporter::new(store, RenderOptions::from(&config.render));

    let mut summary = RunSummary::new(RunId::generate());
    exporter.export(&outline, &mut sink, &mut summary);

    let output = Output::new();
    output.section("Rendered Documents");
    for path in &summary.documents {
        output.info(&format!("{}", path.display()));
    }
    if summary.persistence_failures > 0 {
        output.warning(&format!(
            "{} artifact(s) could not be read or written",
            summary.persistence_failures
        ));
    } else {
        output.success(&format!("{} document(s) written", summary.documents.len()));
    }
    Ok(())
}
