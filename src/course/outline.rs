//! Course Outline
//!
//! Difficulty level → module → topics. Built once through [`OutlineBuilder`]
//! (directly, from a file, or interactively) and immutable afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};

use crate::constants::outline::DEFAULT_TOPIC;
use crate::types::{CourseError, Result};

// =============================================================================
// Level
// =============================================================================

/// CEFR difficulty level. `Ord` follows the fixed course order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::A1,
        Level::A2,
        Level::B1,
        Level::B2,
        Level::C1,
        Level::C2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C1 => "C1",
            Level::C2 => "C2",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = CourseError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                CourseError::Outline(format!(
                    "Unknown difficulty level '{}'. Expected one of: A1, A2, B1, B2, C1, C2",
                    wanted
                ))
            })
    }
}

// =============================================================================
// Outline
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    /// Never empty
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    levels: BTreeMap<Level, Vec<Module>>,
}

impl Outline {
    pub fn builder() -> OutlineBuilder {
        OutlineBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Levels in course order, each with its modules in input order
    pub fn levels(&self) -> impl Iterator<Item = (Level, &[Module])> {
        self.levels.iter().map(|(level, modules)| (*level, modules.as_slice()))
    }

    /// Every (level, module) pair in processing order
    pub fn modules(&self) -> impl Iterator<Item = (Level, &Module)> {
        self.levels
            .iter()
            .flat_map(|(level, modules)| modules.iter().map(move |m| (*level, m)))
    }

    pub fn module_count(&self) -> usize {
        self.levels.values().map(Vec::len).sum()
    }

    pub fn topic_count(&self) -> usize {
        self.modules().map(|(_, m)| m.topics.len()).sum()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Accumulates raw outline input and enforces the outline invariants on `build`
#[derive(Debug, Default)]
pub struct OutlineBuilder {
    levels: BTreeMap<Level, Vec<Module>>,
}

impl OutlineBuilder {
    /// Add a module to a level.
    ///
    /// Names are trimmed and blanks dropped. A module with no usable topics
    /// gets the default topic; a repeated module name merges its topics.
    pub fn module<I, S>(mut self, level: Level, name: &str, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_module(level, name, topics);
        self
    }

    pub fn add_module<I, S>(&mut self, level: Level, name: &str, topics: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.trim();
        if name.is_empty() {
            debug!(%level, "Dropping module with blank name");
            return;
        }

        let mut cleaned: Vec<String> = Vec::new();
        for topic in topics {
            let topic = topic.as_ref().trim();
            if !topic.is_empty() && !cleaned.iter().any(|t| t == topic) {
                cleaned.push(topic.to_string());
            }
        }

        let modules = self.levels.entry(level).or_default();
        match modules.iter_mut().find(|m| m.name == name) {
            Some(existing) => {
                for topic in cleaned {
                    if !existing.topics.contains(&topic) {
                        existing.topics.push(topic);
                    }
                }
            }
            None => modules.push(Module {
                name: name.to_string(),
                topics: cleaned,
            }),
        }
    }

    pub fn build(self) -> Outline {
        let levels = self
            .levels
            .into_iter()
            .filter(|(_, modules)| !modules.is_empty())
            .map(|(level, mut modules)| {
                for module in &mut modules {
                    if module.topics.is_empty() {
                        module.topics.push(DEFAULT_TOPIC.to_string());
                    }
                }
                (level, modules)
            })
            .collect();

        Outline { levels }
    }
}

/// Split `"a, b,,c "` into `["a", "b", "c"]`
pub fn parse_comma_separated(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// =============================================================================
// Outline Sources
// =============================================================================

/// Anything that can produce a course outline
pub trait OutlineSource {
    fn load(&mut self) -> Result<Outline>;
}

/// On-disk outline description (YAML or JSON)
#[derive(Debug, Deserialize)]
struct OutlineFile {
    #[serde(default)]
    levels: Vec<LevelEntry>,
}

#[derive(Debug, Deserialize)]
struct LevelEntry {
    level: String,
    #[serde(default)]
    modules: Vec<ModuleEntry>,
}

#[derive(Debug, Deserialize)]
struct ModuleEntry {
    name: String,
    #[serde(default)]
    topics: Vec<String>,
}

/// Reads an outline file; `.json` is parsed as JSON, anything else as YAML
pub struct FileOutlineSource {
    path: PathBuf,
}

impl FileOutlineSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn parse(content: &str, path: &Path) -> Result<Outline> {
        let file: OutlineFile = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => serde_json::from_str(content)
                .map_err(|e| CourseError::Outline(format!("{}: {}", path.display(), e)))?,
            _ => serde_yaml::from_str(content)
                .map_err(|e| CourseError::Outline(format!("{}: {}", path.display(), e)))?,
        };

        let mut builder = Outline::builder();
        for entry in file.levels {
            let level: Level = entry.level.parse()?;
            for module in entry.modules {
                builder.add_module(level, &module.name, &module.topics);
            }
        }
        Ok(builder.build())
    }
}

impl OutlineSource for FileOutlineSource {
    fn load(&mut self) -> Result<Outline> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            CourseError::Outline(format!("Cannot read {}: {}", self.path.display(), e))
        })?;
        let outline = Self::parse(&content, &self.path)?;
        info!(
            path = %self.path.display(),
            modules = outline.module_count(),
            topics = outline.topic_count(),
            "Loaded outline"
        );
        Ok(outline)
    }
}

/// Line-based prompts: per level a comma-separated module list, then per
/// module a comma-separated topic list.
///
/// A blank module line skips the level; a blank topic line yields the
/// default topic. End of input counts as a blank line.
pub struct InteractiveOutlineSource<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InteractiveOutlineSource<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        writeln!(self.output, "{}", question)?;
        write!(self.output, "> ")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// Ask a single free-form question (used for the general prompt)
    pub fn ask_line(&mut self, question: &str) -> Result<String> {
        self.ask(question)
    }
}

impl<R: BufRead, W: Write> OutlineSource for InteractiveOutlineSource<R, W> {
    fn load(&mut self) -> Result<Outline> {
        writeln!(
            self.output,
            "Enter module and topic names for each difficulty level (comma-separated)."
        )?;

        let mut builder = Outline::builder();
        for level in Level::ALL {
            let modules = parse_comma_separated(
                &self.ask(&format!("Modules for level {} (blank to skip):", level))?,
            );
            if modules.is_empty() {
                writeln!(self.output, "No modules for level {}. Skipping.", level)?;
                continue;
            }

            for module in modules {
                let topics = parse_comma_separated(
                    &self.ask(&format!("Topics for module '{}':", module))?,
                );
                if topics.is_empty() {
                    writeln!(
                        self.output,
                        "No topics given. Using '{}' for module '{}'.",
                        DEFAULT_TOPIC, module
                    )?;
                }
                builder.add_module(level, &module, topics);
            }
        }

        Ok(builder.build())
    }
}

// =============================================================================
// Tests
// =============================================================================
