//! Built-in tool implementations for Samovar.
//!
//! Tools are what the model may call instead of answering directly:
//! - `search` — Bing Web Search, for questions needing recent knowledge
//! - `save_note` / `find_notes` — a personal note store with embedding
//!   recall
//!
//! Registration is a pure function of configuration: a tool whose
//! credential is absent is silently omitted, never an error.

pub mod notes;
pub mod search;

pub use notes::{FindNotesTool, NoteStore, SaveNoteTool};
pub use search::BingSearchTool;

use samovar_config::AppConfig;
use samovar_core::provider::CompletionProvider;
use samovar_core::tool::ToolRegistry;
use std::sync::Arc;
use tracing::debug;

/// Build the process-lifetime tool registry from configuration.
///
/// `provider` backs the notes tools' embedding calls; it is only retained
/// when an embeddings model is configured.
pub fn registry_from_config(
    config: &AppConfig,
    provider: Arc<dyn CompletionProvider>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    if let Some(key) = config.search_api_key.as_deref().filter(|k| !k.is_empty()) {
        debug!("Search credential found, enabling search tool");
        registry.register(Box::new(BingSearchTool::new(key)));
    }

    if let Some(model) = config
        .embeddings_model
        .as_deref()
        .filter(|m| !m.is_empty())
    {
        debug!(model, "Embeddings model configured, enabling notes tools");
        let store = Arc::new(NoteStore::new(config.notes_path(), model, provider));
        registry.register(Box::new(SaveNoteTool::new(store.clone())));
        registry.register(Box::new(FindNotesTool::new(store)));
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use samovar_core::error::ProviderError;
    use samovar_core::provider::{ChatRequest, ChatResponse};

    struct NullProvider;

    #[async_trait]
    impl CompletionProvider for NullProvider {
        fn name(&self) -> &str {
            "null"
        }
        async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, ProviderError> {
            Err(ProviderError::Network("unused".into()))
        }
    }

    #[test]
    fn bare_config_yields_empty_registry() {
        let config = AppConfig::default();
        let registry = registry_from_config(&config, Arc::new(NullProvider));
        assert!(registry.is_empty());
    }

    #[test]
    fn search_credential_enables_search() {
        let config = AppConfig {
            search_api_key: Some("bing-key".into()),
            ..AppConfig::default()
        };
        let registry = registry_from_config(&config, Arc::new(NullProvider));
        assert_eq!(registry.names(), vec!["search"]);
    }

    #[test]
    fn embeddings_model_enables_notes_pair() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            embeddings_model: Some("text-embedding-3-small".into()),
            notes_path: Some(dir.path().join("notes.jsonl")),
            ..AppConfig::default()
        };
        let registry = registry_from_config(&config, Arc::new(NullProvider));
        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["find_notes", "save_note"]);
    }

    #[test]
    fn empty_credential_is_treated_as_absent() {
        let config = AppConfig {
            search_api_key: Some(String::new()),
            ..AppConfig::default()
        };
        let registry = registry_from_config(&config, Arc::new(NullProvider));
        assert!(registry.is_empty());
    }
}
