//! CLI Commands
//!
//! Each command loads the layered configuration, applies its flag overrides
//! and drives the course pipeline on a tokio runtime.

pub mod config;
pub mod generate;
pub mod render;
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::ai::LlmProvider;
use crate::config::{Config, ConfigLoader};
use crate::course::ArtifactStore;
use crate::types::{CourseError, Result};

/// Flags shared by the pipeline commands
#[derive(Debug, Clone, Default)]
pub struct CommonOptions {
    /// Explicit config file (replaces the project config)
    pub config: Option<PathBuf>,
    /// LLM provider override
    pub provider: Option<String>,
    /// Model override
    pub model: Option<String>,
    /// Root for every generated artifact
    pub output: Option<PathBuf>,
    /// Render lists of objects as tables
    pub tables: bool,
}

/// Load, override and validate the effective configuration
pub(crate) fn load_config(options: &CommonOptions) -> Result<Config> {
    let mut config = ConfigLoader::load_with(options.config.as_deref())?;

    if let Some(provider) = &options.provider {
        // A configured model belongs to the configured provider
        if *provider != config.llm.provider && options.model.is_none() {
            config.llm.model.clear();
        }
        config.llm.provider = provider.clone();
    }
    if let Some(model) = &options.model {
        config.llm.model = model.clone();
    }
    if options.tables {
        config.render.tables = true;
    }

    config.validate()?;
    Ok(config)
}

pub(crate) fn artifact_store(config: &Config, output: Option<&Path>) -> ArtifactStore {
    match output {
        Some(root) => ArtifactStore::rooted(root, &config.output),
        None => ArtifactStore::new(&config.output),
    }
}

/// `--prompt` wins over `--prompt-file`; `None` when neither is given
pub(crate) fn resolve_prompt(prompt: Option<String>, prompt_file: Option<&Path>) -> Result<Option<String>> {
    let prompt = match (prompt, prompt_file) {
        (Some(text), _) => text,
        (None, Some(path)) => fs::read_to_string(path).map_err(|e| {
            CourseError::Config(format!("Cannot read prompt file {}: {}", path.display(), e))
        })?,
        (None, None) => return Ok(None),
    };

    if prompt.trim().is_empty() {
        return Err(CourseError::Config("General prompt is empty".to_string()));
    }
    Ok(Some(prompt))
}

/// Availability check before the first generation call. Inconclusive
/// results only warn; the run itself surfaces real failures.
pub(crate) async fn check_provider(provider: &dyn LlmProvider) -> bool {
    match provider.health_check().await {
        Ok(true) => {
            info!("Provider '{}' is healthy", provider.name());
            true
        }
        Ok(false) => {
            warn!(
                "Provider '{}' health check inconclusive (model: {})",
                provider.name(),
                provider.model()
            );
            false
        }
        Err(e) => {
            warn!("Provider '{}' health check failed: {}", provider.name(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::scripted::ScriptedProvider;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_check_provider_reports_health_without_generating() {
        let healthy = ScriptedProvider::new().reply("unused");
        assert!(check_provider(&healthy).await);
        assert_eq!(healthy.calls(), 0);

        let unhealthy = ScriptedProvider::new().unhealthy();
        assert!(!check_provider(&unhealthy).await);
    }

    #[test]
    fn test_resolve_prompt_sources() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("prompt.txt");
        fs::write(&file, "From file").unwrap();

        assert_eq!(
            resolve_prompt(Some("Inline".into()), Some(&file)).unwrap(),
            Some("Inline".to_string())
        );
        assert_eq!(
            resolve_prompt(None, Some(&file)).unwrap(),
            Some("From file".to_string())
        );
        assert_eq!(resolve_prompt(None, None).unwrap(), None);
        assert!(resolve_prompt(Some("  ".into()), None).is_err());
        assert!(resolve_prompt(None, Some(&dir.path().join("missing.txt"))).is_err());
    }

    #[test]
    fn test_provider_switch_drops_configured_model() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        fs::write(&file, "[llm]\nprovider = \"openai\"\nmodel = \"gpt-4o\"\n").unwrap();

        let config = load_config(&CommonOptions {
            config: Some(file.clone()),
            provider: Some("ollama".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.llm.provider, "ollama");
        assert!(config.llm.model.is_empty());

        let config = load_config(&CommonOptions {
            config: Some(file),
            provider: Some("ollama".to_string()),
            model: Some("mistral".to_string()),
            tables: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.llm.model, "mistral");
        assert!(config.render.tables);
    }

    #[test]
    fn test_artifact_store_rooted_at_output() {
        let config = Config::default();
        let store = artifact_store(&config, Some(Path::new("out")));
        assert_eq!(store.documents_dir(), Path::new("out/documents"));
        assert_eq!(
            artifact_store(&config, None).schema_path(),
            Path::new("course_schema.json")
        );
    }
}
