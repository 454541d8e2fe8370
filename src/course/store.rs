//! Artifact Persistence
//!
//! Per-topic documents live at `<generated>/<level>/<module>/<topic>.json`
//! with every component sanitized. The schema and the course aggregate sit
//! next to the generated tree.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::content::ContentDocument;
use super::outline::Level;
use super::schema::Schema;
use crate::config::OutputConfig;
use crate::types::{CourseError, Result};

/// Replace every character outside `[A-Za-z0-9]` with `_`
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    generated_dir: PathBuf,
    documents_dir: PathBuf,
    schema_file: PathBuf,
    aggregate_file: PathBuf,
}

impl ArtifactStore {
    /// Paths taken as configured (relative to the working directory)
    pub fn new(output: &OutputConfig) -> Self {
        Self::rooted(Path::new(""), output)
    }

    /// Relative configured paths resolved against `root`
    pub fn rooted(root: &Path, output: &OutputConfig) -> Self {
        Self {
            generated_dir: root.join(&output.generated_dir),
            documents_dir: root.join(&output.documents_dir),
            schema_file: root.join(&output.schema_file),
            aggregate_file: root.join(&output.aggregate_file),
        }
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    pub fn schema_path(&self) -> &Path {
        &self.schema_file
    }

    pub fn topic_path(&self, level: Level, module: &str, topic: &str) -> PathBuf {
        self.generated_dir
            .join(level.as_str())
            .join(sanitize(module))
            .join(format!("{}.json", sanitize(topic)))
    }

    pub fn save_topic(
        &self,
        level: Level,
        module: &str,
        topic: &str,
        document: &ContentDocument,
    ) -> Result<PathBuf> {
        let path = self.topic_path(level, module, topic);
        write_pretty(&path, document)?;
        Ok(path)
    }

    /// `Ok(None)` when the topic was never persisted
    pub fn load_topic(&self, level: Level, module: &str, topic: &str) -> Result<Option<ContentDocument>> {
        let path = self.topic_path(level, module, topic);
        if !path.exists() {
            return Ok(None);
        }
        let value = read_json(&path)?;
        ContentDocument::from_value(value)
            .map(Some)
            .ok_or_else(|| CourseError::persistence(&path, "topic artifact is not a JSON object"))
    }

    pub fn save_schema(&self, schema: &Schema) -> Result<PathBuf> {
        write_pretty(&self.schema_file, schema)?;
        Ok(self.schema_file.clone())
    }

    pub fn load_schema(&self) -> Result<Schema> {
        match read_json(&self.schema_file)? {
            Value::Object(object) => Ok(Schema::normalize(object)),
            _ => Err(CourseError::persistence(
                &self.schema_file,
                "schema artifact is not a JSON object",
            )),
        }
    }

    pub fn save_aggregate(&self, data: &CourseData) -> Result<PathBuf> {
        write_pretty(&self.aggregate_file, data)?;
        Ok(self.aggregate_file.clone())
    }
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CourseError::persistence(parent, e))?;
    }
    let content = serde_json::to_string_pretty(value).map_err(|e| CourseError::persistence(path, e))?;
    fs::write(path, content).map_err(|e| CourseError::persistence(path, e))?;
    debug!(path = %path.display(), "Artifact written");
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| CourseError::persistence(path, e))?;
    serde_json::from_str(&content).map_err(|e| CourseError::persistence(path, e))
}

// =============================================================================
// Course Aggregate
// =============================================================================

/// `{level: {module: [document, ...]}}`, in outline order
#[derive(Debug, Clone, Default)]
pub struct CourseData {
    levels: Vec<LevelData>,
}

#[derive(Debug, Clone)]
struct LevelData {
    level: Level,
    modules: Vec<ModuleData>,
}

#[derive(Debug, Clone)]
struct ModuleData {
    name: String,
    topics: Vec<ContentDocument>,
}

impl CourseData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module so it appears even if none of its topics succeed
    pub fn ensure_module(&mut self, level: Level, module: &str) -> &mut Vec<ContentDocument> {
        let level_index = match self.levels.iter().position(|l| l.level == level) {
            Some(index) => index,
            None => {
                self.levels.push(LevelData {
                    level,
                    modules: Vec::new(),
                });
                self.levels.len() - 1
            }
        };
        let modules = &mut self.levels[level_index].modules;

        let module_index = match modules.iter().position(|m| m.name == module) {
            Some(index) => index,
            None => {
                modules.push(ModuleData {
                    name: module.to_string(),
                    topics: Vec::new(),
                });
                modules.len() - 1
            }
        };
        &mut modules[module_index].topics
    }

    pub fn push(&mut self, level: Level, module: &str, document: ContentDocument) {
        self.ensure_module(level, module).push(document);
    }

    pub fn topic_count(&self) -> usize {
        self.levels
            .iter()
            .flat_map(|l| &l.modules)
            .map(|m| m.topics.len())
            .sum()
    }
}

impl Serialize for CourseData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.levels
                .iter()
                .map(|l| (l.level.as_str(), ModulesView(&l.modules))),
        )
    }
}

struct ModulesView<'a>(&'a [ModuleData]);

impl Serialize for ModulesView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|m| (&m.name, &m.topics)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ArtifactStore {
        ArtifactStore::rooted(dir.path(), &OutputConfig::default())
    }

    fn doc(value: Value) -> ContentDocument {
        ContentDocument::from_value(value).unwrap()
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("At the Airport!"), "At_the_Airport_");
        assert_eq!(sanitize("Café/Bar"), "Caf__Bar");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_topic_path_layout() {
        let dir = TempDir::new().unwrap();
        let path = store(&dir).topic_path(Level::B1, "Work Life", "E-mails");
        assert_eq!(
            path,
            dir.path().join("generated/B1/Work_Life/E_mails.json")
        );
    }

    #[test]
    fn test_topic_roundtrip_keeps_field_order() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let document = doc(json!({"zeta": 1, "alpha": {"b": 2, "a": 1}}));

        let path = store.save_topic(Level::A1, "m", "t", &document).unwrap();
        assert!(fs::read_to_string(path).unwrap().contains("\n  \"zeta\": 1"));

        let loaded = store.load_topic(Level::A1, "m", "t").unwrap().unwrap();
        assert_eq!(loaded, document);
        assert_eq!(loaded.as_map().keys().next().unwrap(), "zeta");
    }

    #[test]
    fn test_load_missing_topic_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).load_topic(Level::C2, "m", "t").unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_topic_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let path = store.topic_path(Level::A1, "m", "t");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ nope").unwrap();

        let err = store.load_topic(Level::A1, "m", "t").unwrap_err();
        assert!(matches!(err, CourseError::Persistence { .. }));
    }

    #[test]
    fn test_load_missing_schema_fails() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).load_schema().is_err());
    }

    #[test]
    fn test_write_into_file_path_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("generated");
        fs::write(&blocker, "file, not a directory").unwrap();

        let err = store(&dir)
            .save_topic(Level::A1, "m", "t", &doc(json!({})))
            .unwrap_err();
        assert!(matches!(err, CourseError::Persistence { .. }));
    }

    #[test]
    fn test_course_data_nesting() {
        let mut data = CourseData::new();
        data.ensure_module(Level::A2, "Empty");
        data.push(Level::A1, "Greetings", doc(json!({"lessonTitle": "Hello"})));
        data.push(Level::A1, "Greetings", doc(json!({"lessonTitle": "Bye"})));

        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({
                "A2": {"Empty": []},
                "A1": {"Greetings": [{"lessonTitle": "Hello"}, {"lessonTitle": "Bye"}]}
            })
        );
        assert_eq!(data.topic_count(), 2);

        let dir = TempDir::new().unwrap();
        let path = store(&dir).save_aggregate(&data).unwrap();
        let saved: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(saved["A1"]["Greetings"][1]["lessonTitle"], "Bye");
    }

    proptest! {
        #[test]
        fn prop_sanitize_charset_and_idempotent(name in ".*") {
            let once = sanitize(&name);
            prop_assert!(once.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
            prop_assert_eq!(sanitize(&once), once.clone());
            prop_assert_eq!(once.chars().count(), name.chars().count());
        }
    }
}
