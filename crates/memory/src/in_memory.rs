//! In-memory backend — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use samovar_core::error::StoreError;
use samovar_core::message::{ConversationId, Message};
use samovar_core::profile::UserProfile;
use samovar_core::store::StorageBackend;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A backend that keeps everything in process memory.
pub struct InMemoryBackend {
    conversations: Arc<RwLock<HashMap<String, Vec<Message>>>>,
    profiles: Arc<RwLock<HashMap<String, UserProfile>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            conversations: Arc::new(RwLock::new(HashMap::new())),
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self, id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        Ok(self
            .conversations
            .read()
            .await
            .get(&id.0)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, id: &ConversationId, messages: &[Message]) -> Result<(), StoreError> {
        self.conversations
            .write()
            .await
            .insert(id.0.clone(), messages.to_vec());
        Ok(())
    }

    async fn remove(&self, id: &ConversationId) -> Result<(), StoreError> {
        self.conversations.write().await.remove(&id.0);
        Ok(())
    }

    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn save_profile(&self, user_id: &str, profile: &UserProfile) -> Result<(), StoreError> {
        self.profiles
            .write()
            .await
            .insert(user_id.to_string(), profile.clone());
        Ok(())
    }
}
