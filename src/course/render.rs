//! Structured Content Renderer
//!
//! Walks a content document depth-first, in field order, and emits a flat
//! stream of formatting blocks. Nesting is carried by heading level and
//! block depth.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use super::content::ContentDocument;
use crate::config::RenderConfig;

/// Top-level fields that are schema artifacts, never content
pub const EXCLUDED_FIELDS: [&str; 4] = ["$schema", "type", "properties", "required"];

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("([a-z])([A-Z])").expect("camel-case boundary pattern is valid"));

/// One formatting instruction for a document sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Block {
    /// `level` is 1 for top-level fields
    Heading { text: String, level: usize },
    Paragraph { text: String, depth: usize },
    Bullet { text: String, depth: usize },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        depth: usize,
    },
}

impl Block {
    pub fn heading(text: impl Into<String>, level: usize) -> Self {
        Block::Heading {
            text: text.into(),
            level,
        }
    }

    pub fn paragraph(text: impl Into<String>, depth: usize) -> Self {
        Block::Paragraph {
            text: text.into(),
            depth,
        }
    }

    pub fn bullet(text: impl Into<String>, depth: usize) -> Self {
        Block::Bullet {
            text: text.into(),
            depth,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Render non-empty lists of objects as tables
    pub tables: bool,
}

impl From<&RenderConfig> for RenderOptions {
    fn from(config: &RenderConfig) -> Self {
        Self {
            tables: config.tables,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StructuredRenderer {
    options: RenderOptions,
}

impl StructuredRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn render(&self, document: &ContentDocument) -> Vec<Block> {
        let mut blocks = Vec::new();
        for (name, value) in document.as_map() {
            if EXCLUDED_FIELDS.contains(&name.as_str()) {
                continue;
            }
            self.render_field(name, value, 1, &mut blocks);
        }
        blocks
    }

    fn render_field(&self, name: &str, value: &Value, level: usize, out: &mut Vec<Block>) {
        let depth = level - 1;
        match value {
            Value::Null => out.push(Block::heading(humanize(name), level)),
            Value::String(text) => {
                out.push(Block::heading(humanize(name), level));
                out.push(Block::paragraph(text.clone(), depth));
            }
            Value::Bool(_) | Value::Number(_) => {
                out.push(Block::heading(humanize(name), level));
                out.push(Block::paragraph(value.to_string(), depth));
            }
            Value::Array(items) => {
                out.push(Block::heading(humanize(name), level));
                match self.table(items, depth) {
                    Some(table) => out.push(table),
                    None => out.extend(items.iter().map(|item| Block::bullet(inline_text(item), depth))),
                }
            }
            Value::Object(fields) => {
                out.push(Block::heading(humanize(name), level));
                for (child, child_value) in fields {
                    self.render_field(child, child_value, level + 1, out);
                }
            }
        }
    }

    /// Table for a non-empty list of objects; columns follow the first element
    fn table(&self, items: &[Value], depth: usize) -> Option<Block> {
        if !self.options.tables || items.is_empty() {
            return None;
        }
        let rows: Vec<&Map<String, Value>> = items.iter().map(Value::as_object).collect::<Option<_>>()?;
        let columns: Vec<&String> = rows[0].keys().collect();

        Some(Block::Table {
            headers: columns.iter().map(|c| humanize(c)).collect(),
            rows: rows
                .iter()
                .map(|row| {
                    columns
                        .iter()
                        .map(|c| match row.get(c.as_str()) {
                            None | Some(Value::Null) => String::new(),
                            Some(value) => inline_text(value),
                        })
                        .collect()
                })
                .collect(),
            depth,
        })
    }
}

/// Strings verbatim, everything else as compact JSON
fn inline_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `lessonTitle` → "Lesson Title", `CEFR_level` → "Cefr Level"
pub fn humanize(name: &str) -> String {
    CAMEL_BOUNDARY
        .replace_all(name, "$1 $2")
        .replace('_', " ")
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: Value) -> Vec<Block> {
        StructuredRenderer::default().render(&ContentDocument::from_value(value).unwrap())
    }

    fn render_tables(value: Value) -> Vec<Block> {
        StructuredRenderer::new(RenderOptions { tables: true })
            .render(&ContentDocument::from_value(value).unwrap())
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("moduleTitle"), "Module Title");
        assert_eq!(humanize("CEFR_level"), "Cefr Level");
        assert_eq!(humanize("learning_objectives"), "Learning Objectives");
        assert_eq!(humanize("lessonTitle"), "Lesson Title");
        assert_eq!(humanize("__pre__readMaterial"), "Pre Read Material");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn test_string_and_list_fields() {
        let blocks = render(json!({
            "topicName": "Greetings",
            "objectives": ["say hello", "say goodbye"]
        }));

        assert_eq!(
            blocks,
            vec![
                Block::heading("Topic Name", 1),
                Block::paragraph("Greetings", 0),
                Block::heading("Objectives", 1),
                Block::bullet("say hello", 0),
                Block::bullet("say goodbye", 0),
            ]
        );
    }

    #[test]
    fn test_nested_mapping_deepens() {
        let blocks = render(json!({
            "preReadMaterial": {
                "whyFormat": "Because.",
                "tips": {"first": "Read twice"}
            }
        }));

        assert_eq!(
            blocks,
            vec![
                Block::heading("Pre Read Material", 1),
                Block::heading("Why Format", 2),
                Block::paragraph("Because.", 1),
                Block::heading("Tips", 2),
                Block::heading("First", 3),
                Block::paragraph("Read twice", 2),
            ]
        );
    }

    #[test]
    fn test_excluded_fields_only_at_top_level() {
        let blocks = render(json!({
            "$schema": "x",
            "type": "object",
            "properties": {},
            "required": [],
            "grammar": {"type": "Present simple"}
        }));

        assert_eq!(
            blocks,
            vec![
                Block::heading("Grammar", 1),
                Block::heading("Type", 2),
                Block::paragraph("Present simple", 1),
            ]
        );
    }

    #[test]
    fn test_scalars_and_null() {
        let blocks = render(json!({"duration": 45, "optional": true, "notes": null}));
        assert_eq!(
            blocks,
            vec![
                Block::heading("Duration", 1),
                Block::paragraph("45", 0),
                Block::heading("Optional", 1),
                Block::paragraph("true", 0),
                Block::heading("Notes", 1),
            ]
        );
    }

    #[test]
    fn test_nested_null_keeps_heading() {
        let blocks = render(json!({"vocabulary": {"extra": null, "word": "hola"}}));
        assert_eq!(
            blocks,
            vec![
                Block::heading("Vocabulary", 1),
                Block::heading("Extra", 2),
                Block::heading("Word", 2),
                Block::paragraph("hola", 1),
            ]
        );
    }

    #[test]
    fn test_non_string_bullets_are_compact_json() {
        let blocks = render(json!({"vocabulary": [{"term": "hi"}, 3]}));
        assert_eq!(blocks[1], Block::bullet(r#"{"term":"hi"}"#, 0));
        assert_eq!(blocks[2], Block::bullet("3", 0));
    }

    #[test]
    fn test_table_uses_first_element_columns() {
        let blocks = render_tables(json!({
            "anchorVocabulary": [
                {"term": "greet", "usage_tip": "formal"},
                {"usage_tip": "casual", "extra": 1},
                {"term": "wave", "usage_tip": ["a", "b"]}
            ]
        }));

        assert_eq!(
            blocks[1],
            Block::Table {
                headers: vec!["Term".to_string(), "Usage Tip".to_string()],
                rows: vec![
                    vec!["greet".to_string(), "formal".to_string()],
                    vec![String::new(), "casual".to_string()],
                    vec!["wave".to_string(), r#"["a","b"]"#.to_string()],
                ],
                depth: 0,
            }
        );
    }

    #[test]
    fn test_mixed_list_falls_back_to_bullets() {
        let blocks = render_tables(json!({"items": [{"a": 1}, "plain"]}));
        assert!(matches!(blocks[1], Block::Bullet { .. }));
        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn test_empty_list_heading_only() {
        assert_eq!(
            render_tables(json!({"format_options": []})),
            vec![Block::heading("Format Options", 1)]
        );
    }
}
