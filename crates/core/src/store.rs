//! Storage backend trait — raw persistence under the conversation store.
//!
//! A backend persists two record families: one serialized message list per
//! conversation key, and one serialized profile per user key. Each `save`
//! must replace the whole record atomically — a concurrent reader sees
//! either the old list or the new one, never a partial write.
//!
//! Token accounting and eviction live *above* this trait, in
//! `samovar-memory::ConversationStore`; backends only move bytes.

use crate::error::StoreError;
use crate::message::{ConversationId, Message};
use crate::profile::UserProfile;
use async_trait::async_trait;

/// Raw persistence for conversations and profiles.
///
/// Implementations: SQLite (production), in-memory (tests).
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// The backend name (e.g. "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Load the message list for a conversation. Empty if none exists.
    async fn load(&self, id: &ConversationId) -> std::result::Result<Vec<Message>, StoreError>;

    /// Replace the message list for a conversation.
    async fn save(
        &self,
        id: &ConversationId,
        messages: &[Message],
    ) -> std::result::Result<(), StoreError>;

    /// Remove all messages for a conversation.
    async fn remove(&self, id: &ConversationId) -> std::result::Result<(), StoreError>;

    /// Load a cached user profile.
    async fn load_profile(
        &self,
        user_id: &str,
    ) -> std::result::Result<Option<UserProfile>, StoreError>;

    /// Cache a user profile.
    async fn save_profile(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> std::result::Result<(), StoreError>;
}
