//! Notes tools — a personal note store with embedding recall.
//!
//! Notes live in a JSONL file (one JSON object per line), loaded into
//! memory on creation and flushed on every save. Each note carries an
//! embedding vector from the completion provider's embeddings endpoint;
//! `find_notes` ranks by cosine similarity against the query embedding.
//!
//! The note store is per-process shared state owned by the tool pair; it is
//! deliberately separate from the conversation store — conversations are
//! bounded and evicted, notes are kept until deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use samovar_core::error::ToolError;
use samovar_core::provider::CompletionProvider;
use samovar_core::tool::{Tool, ToolContext};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// A single stored note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub content: String,
    /// Who saved it, when an identity was injected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub embedding: Vec<f32>,
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched or zero-length input.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }
    (dot / denom) as f32
}

/// JSONL-backed note storage with embedding search.
pub struct NoteStore {
    path: PathBuf,
    embeddings_model: String,
    provider: Arc<dyn CompletionProvider>,
    notes: RwLock<Vec<Note>>,
}

impl NoteStore {
    /// Open (or start) a note store at the given path.
    ///
    /// Corrupt lines are skipped with a warning rather than failing the
    /// whole store.
    pub fn new(
        path: PathBuf,
        embeddings_model: impl Into<String>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        let notes = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = notes.len(), "Note store loaded");
        Self {
            path,
            embeddings_model: embeddings_model.into(),
            provider,
            notes: RwLock::new(notes),
        }
    }

    fn load_from_disk(path: &PathBuf) -> Vec<Note> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(), // file doesn't exist yet
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Note>(line) {
                Ok(note) => Some(note),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted note entry");
                    None
                }
            })
            .collect()
    }

    async fn flush(&self) -> Result<(), ToolError> {
        let notes = self.notes.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ToolError::Execution {
                tool_name: "save_note".into(),
                reason: format!("failed to create notes directory: {e}"),
            })?;
        }

        let mut content = String::new();
        for note in notes.iter() {
            let line = serde_json::to_string(note).map_err(|e| ToolError::Execution {
                tool_name: "save_note".into(),
                reason: format!("failed to serialize note: {e}"),
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&self.path, &content).map_err(|e| ToolError::Execution {
            tool_name: "save_note".into(),
            reason: format!("failed to write notes file: {e}"),
        })
    }

    async fn embed(&self, tool_name: &str, text: &str) -> Result<Vec<f32>, ToolError> {
        let mut vectors = self
            .provider
            .embed(&self.embeddings_model, &[text.to_string()])
            .await
            .map_err(|e| ToolError::Execution {
                tool_name: tool_name.into(),
                reason: format!("embedding failed: {e}"),
            })?;

        if vectors.is_empty() {
            return Err(ToolError::Execution {
                tool_name: tool_name.into(),
                reason: "embedding response was empty".into(),
            });
        }
        Ok(vectors.remove(0))
    }

    /// Save a note, embedding its content.
    pub async fn save(&self, content: &str, author: Option<&str>) -> Result<String, ToolError> {
        let embedding = self.embed("save_note", content).await?;
        let note = Note {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            author: author.map(String::from),
            created_at: Utc::now(),
            embedding,
        };
        let id = note.id.clone();
        self.notes.write().await.push(note);
        self.flush().await?;
        Ok(id)
    }

    /// Find the `limit` notes most similar to `query`.
    pub async fn find(&self, query: &str, limit: usize) -> Result<Vec<Note>, ToolError> {
        let query_embedding = self.embed("find_notes", query).await?;
        let notes = self.notes.read().await;

        let mut scored: Vec<(f32, Note)> = notes
            .iter()
            .map(|n| (cosine_similarity(&n.embedding, &query_embedding), n.clone()))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored.into_iter().map(|(_, n)| n).collect())
    }
}

/// Tool: save a note for later recall.
pub struct SaveNoteTool {
    store: Arc<NoteStore>,
}

impl SaveNoteTool {
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SaveNoteTool {
    fn name(&self) -> &str {
        "save_note"
    }

    fn description(&self) -> &str {
        "Save a short note for later recall, useful when the user asks to remember something"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The note text to save"
                }
            },
            "required": ["content"]
        })
    }

    async fn invoke(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
        ctx: &ToolContext,
    ) -> Result<String, ToolError> {
        let content = arguments
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::Execution {
                tool_name: "save_note".into(),
                reason: "missing 'content' argument".into(),
            })?;

        self.store.save(content, ctx.user_id.as_deref()).await?;
        Ok("Note saved".to_string())
    }
}

/// Tool: recall notes relevant to a query.
pub struct FindNotesTool {
    store: Arc<NoteStore>,
}

impl FindNotesTool {
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for FindNotesTool {
    fn name(&self) -> &str {
        "find_notes"
    }

    fn description(&self) -> &str {
        "Find previously saved notes relevant to a query"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look for"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
        _ctx: &ToolContext,
    ) -> Result<String, ToolError> {
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::Execution {
                tool_name: "find_notes".into(),
                reason: "missing 'query' argument".into(),
            })?;

        let notes = self.store.find(query, 5).await?;
        if notes.is_empty() {
            return Ok("No notes found".to_string());
        }

        Ok(notes
            .iter()
            .map(|n| n.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use samovar_core::error::ProviderError;
    use samovar_core::provider::{ChatRequest, ChatResponse};

    /// Embeds text as a fixed per-word direction so similarity is
    /// deterministic in tests.
    struct StubEmbedder;

    #[async_trait]
    impl CompletionProvider for StubEmbedder {
        fn name(&self) -> &str {
            "stub"
        }
        async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, ProviderError> {
            Err(ProviderError::Network("not a completion provider".into()))
        }
        async fn embed(
            &self,
            _model: &str,
            inputs: &[String],
        ) -> Result<Vec<Vec<f32>>, ProviderError> {
            Ok(inputs
                .iter()
                .map(|text| {
                    let lower = text.to_lowercase();
                    vec![
                        lower.contains("rust") as u8 as f32,
                        lower.contains("tea") as u8 as f32,
                        lower.contains("meeting") as u8 as f32,
                    ]
                })
                .collect())
        }
    }

    fn store() -> (Arc<NoteStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(NoteStore::new(
            dir.path().join("notes.jsonl"),
            "stub-embeddings",
            Arc::new(StubEmbedder),
        ));
        (store, dir)
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = [0.5, 0.2, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_of_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn save_then_find_ranks_by_similarity() {
        let (store, _dir) = store();
        store.save("rust borrow checker tips", None).await.unwrap();
        store.save("tea brewing temperatures", None).await.unwrap();

        let found = store.find("more rust", 1).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].content.contains("rust"));
    }

    #[tokio::test]
    async fn notes_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jsonl");

        let store = NoteStore::new(path.clone(), "stub-embeddings", Arc::new(StubEmbedder));
        store.save("standup meeting at nine", None).await.unwrap();
        drop(store);

        let reopened = NoteStore::new(path, "stub-embeddings", Arc::new(StubEmbedder));
        let found = reopened.find("meeting", 5).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].content.contains("standup"));
    }

    #[tokio::test]
    async fn save_note_tool_records_author_from_context() {
        let (store, _dir) = store();
        let tool = SaveNoteTool::new(store.clone());

        let mut args = serde_json::Map::new();
        args.insert("content".into(), "tea at four".into());
        tool.invoke(args, &ToolContext::for_user("U123"))
            .await
            .unwrap();

        let found = store.find("tea", 1).await.unwrap();
        assert_eq!(found[0].author.as_deref(), Some("U123"));
    }

    #[tokio::test]
    async fn find_notes_tool_reports_empty_store() {
        let (store, _dir) = store();
        let tool = FindNotesTool::new(store);

        let mut args = serde_json::Map::new();
        args.insert("query".into(), "anything".into());
        let result = tool.invoke(args, &ToolContext::default()).await.unwrap();
        assert_eq!(result, "No notes found");
    }
}
