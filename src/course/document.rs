//! Module Documents and Sinks
//!
//! One document per (level, module): a title block, a timestamp block, then
//! each topic's heading followed by its rendered blocks.

use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::outline::Level;
use super::render::Block;
use super::store::sanitize;
use crate::types::{CourseError, Result};

/// Markdown supports six heading levels; the title and topic take two
const MARKDOWN_MAX_HEADING: usize = 6;
const FIELD_HEADING_OFFSET: usize = 2;

#[derive(Debug, Clone)]
pub struct TopicSection {
    pub title: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone)]
pub struct ModuleDocument {
    pub level: Level,
    pub module: String,
    pub generated_at: DateTime<Local>,
    pub topics: Vec<TopicSection>,
}

impl ModuleDocument {
    pub fn new(level: Level, module: impl Into<String>) -> Self {
        Self {
            level,
            module: module.into(),
            generated_at: Local::now(),
            topics: Vec::new(),
        }
    }

    pub fn push_topic(&mut self, title: impl Into<String>, blocks: Vec<Block>) {
        self.topics.push(TopicSection {
            title: title.into(),
            blocks,
        });
    }

    pub fn title(&self) -> String {
        format!("{} - Level: {}", self.module, self.level)
    }

    /// `<sanitized module>_<level>`
    pub fn file_stem(&self) -> String {
        format!("{}_{}", sanitize(&self.module), self.level)
    }

    pub fn timestamp(&self) -> String {
        format!("Generated on: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Accepts finished module documents
pub trait DocumentSink {
    /// Persist or collect one document, returning where it went
    fn write(&mut self, document: &ModuleDocument) -> Result<PathBuf>;
}

// =============================================================================
// Markdown
// =============================================================================

pub struct MarkdownSink {
    dir: PathBuf,
}

impl MarkdownSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentSink for MarkdownSink {
    fn write(&mut self, document: &ModuleDocument) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| CourseError::persistence(&self.dir, e))?;
        let path = self.dir.join(format!("{}.md", document.file_stem()));
        fs::write(&path, to_markdown(document)).map_err(|e| CourseError::persistence(&path, e))?;
        info!(path = %path.display(), topics = document.topics.len(), "Document written");
        Ok(path)
    }
}

pub fn to_markdown(document: &ModuleDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", document.title());
    let _ = writeln!(out, "_{}_\n", document.timestamp());

    for topic in &document.topics {
        let _ = writeln!(out, "## {}\n", topic.title);
        write_blocks(&mut out, &topic.blocks);
    }
    out
}

fn write_blocks(out: &mut String, blocks: &[Block]) {
    let mut in_list = false;
    for block in blocks {
        let is_bullet = matches!(block, Block::Bullet { .. });
        if in_list && !is_bullet {
            out.push('\n');
        }
        in_list = is_bullet;
        write_block(out, block);
    }
    if in_list {
        out.push('\n');
    }
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Heading { text, level } => {
            let depth = level + FIELD_HEADING_OFFSET;
            if depth <= MARKDOWN_MAX_HEADING {
                let _ = writeln!(out, "{} {}\n", "#".repeat(depth), text);
            } else {
                let _ = writeln!(out, "**{}**\n", text);
            }
        }
        Block::Paragraph { text, .. } => {
            let _ = writeln!(out, "{}\n", text.trim_end());
        }
        Block::Bullet { text, .. } => {
            let _ = writeln!(out, "- {}", text.replace('\n', " "));
        }
        Block::Table { headers, rows, .. } => {
            let _ = writeln!(out, "| {} |", escape_cells(headers).join(" | "));
            let _ = writeln!(out, "|{}", " --- |".repeat(headers.len()));
            for row in rows {
                let _ = writeln!(out, "| {} |", escape_cells(row).join(" | "));
            }
            out.push('\n');
        }
    }
}

fn escape_cells(cells: &[String]) -> Vec<String> {
    cells
        .iter()
        .map(|c| c.replace('|', "\\|").replace('\n', " "))
        .collect()
}

// =============================================================================
// Memory
// =============================================================================

/// Collects documents instead of writing them
#[derive(Debug, Default)]
pub struct MemorySink {
    pub documents: Vec<ModuleDocument>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentSink for MemorySink {
    fn write(&mut self, document: &ModuleDocument) -> Result<PathBuf> {
        self.documents.push(document.clone());
        Ok(PathBuf::from(format!("{}.md", document.file_stem())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> ModuleDocument {
        let mut document = ModuleDocument::new(Level::A1, "Daily Life");
        document.push_topic(
            "Greetings",
            vec![
                Block::heading("Objectives", 1),
                Block::bullet("say hello", 0),
                Block::bullet("say goodbye", 0),
                Block::heading("Content", 1),
                Block::paragraph("Hello!", 0),
            ],
        );
        document.push_topic("Farewells", vec![]);
        document
    }

    #[test]
    fn test_title_and_stem() {
        let document = sample();
        assert_eq!(document.title(), "Daily Life - Level: A1");
        assert_eq!(document.file_stem(), "Daily_Life_A1");
        assert!(document.timestamp().starts_with("Generated on: "));
    }

    #[test]
    fn test_markdown_layout() {
        let markdown = to_markdown(&sample());

        assert!(markdown.starts_with("# Daily Life - Level: A1\n\n_Generated on: "));
        assert!(markdown.contains(
            "## Greetings\n\n### Objectives\n\n- say hello\n- say goodbye\n\n### Content\n\nHello!\n\n## Farewells\n"
        ));
        let greetings = markdown.find("## Greetings").unwrap();
        let farewells = markdown.find("## Farewells").unwrap();
        assert!(greetings < farewells);
    }

    #[test]
    fn test_deep_headings_become_bold() {
        let mut out = String::new();
        write_block(&mut out, &Block::heading("Deep", 5));
        assert_eq!(out, "**Deep**\n\n");
    }

    #[test]
    fn test_table_markdown() {
        let mut out = String::new();
        write_block(
            &mut out,
            &Block::Table {
                headers: vec!["Term".into(), "Tip".into()],
                rows: vec![vec!["a|b".into(), String::new()]],
                depth: 0,
            },
        );
        assert_eq!(out, "| Term | Tip |\n| --- | --- |\n| a\\|b |  |\n\n");
    }

    #[test]
    fn test_markdown_sink_writes_file() {
        let dir = TempDir::new().unwrap();
        let mut sink = MarkdownSink::new(dir.path().join("documents"));

        let path = sink.write(&sample()).unwrap();

        assert_eq!(path, dir.path().join("documents/Daily_Life_A1.md"));
        assert!(fs::read_to_string(path).unwrap().contains("## Farewells"));
    }

    #[test]
    fn test_memory_sink_collects() {
        let mut sink = MemorySink::new();
        sink.write(&sample()).unwrap();
        assert_eq!(sink.documents.len(), 1);
        assert_eq!(sink.documents[0].topics.len(), 2);
    }
}
