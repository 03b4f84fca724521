//! CLI subcommands and the setup they share.

pub mod config;
pub mod extract;
pub mod process;
pub mod prompt;

use std::path::{Path, PathBuf};

use tracing::debug;

use docex_core::{ChatCompletionsBackend, DocexConfig, DocumentProcessor, DocumentRegistry, DocumentType};

/// `<config dir>/docex/config.json`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docex")
        .join("config.json")
}

/// The `--config` path when given, otherwise the default location.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration, falling back to defaults when no file exists.
///
/// An explicit `--config` path must exist.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<DocexConfig> {
    let path = config_path(explicit);

    if explicit.is_some() || path.exists() {
        debug!("Loading configuration from {}", path.display());
        Ok(DocexConfig::from_file(&path)?)
    } else {
        Ok(DocexConfig::default())
    }
}

/// Registry for one document type, with its custom prompt applied if given.
///
/// Returns the custom prompt name alongside.
pub fn build_registry(
    document_type: DocumentType,
    custom_prompt: Option<&Path>,
) -> anyhow::Result<(DocumentRegistry, Option<String>)> {
    let mut registry = DocumentRegistry::builtin();

    let custom_name = match custom_prompt {
        Some(path) => Some(registry.load_custom_prompt(document_type, path)?),
        None => None,
    };

    Ok((registry, custom_name))
}

/// Processor backed by the configured chat completions endpoint.
pub fn build_processor(
    config: &DocexConfig,
    registry: DocumentRegistry,
) -> anyhow::Result<DocumentProcessor<ChatCompletionsBackend>> {
    let backend = config.llm.backend()?;
    debug!("Using model {} at {}", config.llm.model, config.llm.base_url);

    Ok(DocumentProcessor::from_config(backend, registry, config))
}
